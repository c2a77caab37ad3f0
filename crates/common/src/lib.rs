//! Shared data model for synthetic NVMe enclosures.
//!
//! These types are produced by the mapping engine in the `enclosure` crate and
//! consumed by the general enclosure-merging logic, which indexes into the
//! serialized fields unconditionally. Field names and sentinel values are part
//! of that contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod descriptor;
pub mod model;

pub use descriptor::{ElementOrigin, Elements, EnclosureDescriptor, SlotElement, SlotStatus};
pub use model::{PlatformModel, UnknownModel};

/// Category key under which drive bays are reported.
pub const ARRAY_DEVICE_SLOT: &str = "Array Device Slot";

/// Raw element code for a populated bay.
pub const VALUE_RAW_INSTALLED: &str = "0x1000000";

/// Raw element code for an empty bay.
pub const VALUE_RAW_NOT_INSTALLED: &str = "0x0500000";

/// Logical slot number (1-based) as shown to the management interface.
pub type Slot = u32;

/// Mapping from logical slot to the block device occupying it.
///
/// A key with a `None` value means the bay was inspected and found empty; a
/// missing key means the bay was never resolved. Both render as
/// "Not Installed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotMap(BTreeMap<Slot, Option<String>>);

impl SlotMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the device found in `slot`, replacing any previous entry.
    pub fn record(&mut self, slot: Slot, device: Option<String>) {
        self.0.insert(slot, device);
    }

    /// Device name occupying `slot`, if any.
    pub fn device(&self, slot: Slot) -> Option<&str> {
        self.0.get(&slot).and_then(|dev| dev.as_deref())
    }

    pub fn contains(&self, slot: Slot) -> bool {
        self.0.contains_key(&slot)
    }

    /// Number of resolved slots, including bays recorded as empty.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, Option<&str>)> {
        self.0.iter().map(|(slot, dev)| (*slot, dev.as_deref()))
    }
}

impl FromIterator<(Slot, Option<String>)> for SlotMap {
    fn from_iter<I: IntoIterator<Item = (Slot, Option<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
