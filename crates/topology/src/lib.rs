//! Read access to the live device topology.
//!
//! The mapping engine only needs a narrow slice of what udev offers: list the
//! devices of a subsystem, resolve a device from a path, walk parents and
//! descendants, read a few attributes, and enumerate PCI hot-plug slots.
//! [`Topology`] captures exactly that; [`SysfsTopology`] answers it from a
//! mounted sysfs and [`MemoryTopology`] from a prepared in-memory tree.

mod config;
mod error;
mod memory;
mod sysfs;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use config::TopologyConfig;
pub use error::{TopologyError, TopologyResult};
pub use memory::{MemorySession, MemoryTopology, MemoryTopologyBuilder};
pub use sysfs::{SysfsSession, SysfsTopology};

/// Property key carrying the device's subsystem.
pub const PROPERTY_SUBSYSTEM: &str = "SUBSYSTEM";

/// Snapshot of a single device node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    sys_path: PathBuf,
    sys_name: String,
    subsystem: Option<String>,
    properties: BTreeMap<String, String>,
}

impl Device {
    /// Build a device record; `SUBSYSTEM` is mirrored into the properties.
    pub fn new(
        sys_path: impl Into<PathBuf>,
        subsystem: Option<String>,
        mut properties: BTreeMap<String, String>,
    ) -> Self {
        let sys_path = sys_path.into();
        let sys_name = sys_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(subsystem) = &subsystem {
            properties
                .entry(PROPERTY_SUBSYSTEM.to_string())
                .or_insert_with(|| subsystem.clone());
        }
        Self {
            sys_path,
            sys_name,
            subsystem,
            properties,
        }
    }

    pub fn sys_path(&self) -> &Path {
        &self.sys_path
    }

    /// Final component of the device path, e.g. `nvme0n1` or `0000:80:40.0`.
    pub fn sys_name(&self) -> &str {
        &self.sys_name
    }

    pub fn subsystem(&self) -> Option<&str> {
        self.subsystem.as_deref()
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

/// A PCI hot-plug slot as listed under `bus/pci/slots`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PciSlot {
    /// Slot label, e.g. `27` or `0-3`.
    pub name: String,
    /// Bus address without function, e.g. `0000:80:40`.
    pub address: String,
}

impl PciSlot {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// An open topology query session.
pub trait Topology {
    /// All devices belonging to `subsystem`, in enumeration order.
    fn list_devices(&self, subsystem: &str) -> TopologyResult<Vec<Device>>;

    /// Resolve the device at `path`, following links.
    ///
    /// Fails with [`TopologyError::NotFound`] when no device node exists there.
    fn device_from_path(&self, path: &Path) -> TopologyResult<Device>;

    /// Nearest ancestor that is itself a device.
    fn parent(&self, device: &Device) -> TopologyResult<Option<Device>>;

    /// Every device below `device`, parents before their children.
    fn children(&self, device: &Device) -> TopologyResult<Vec<Device>>;

    /// Raw value of a sysfs attribute with trailing newlines removed.
    fn attribute(&self, device: &Device, name: &str) -> TopologyResult<Option<Vec<u8>>>;

    /// PCI hot-plug slots with their bus addresses.
    fn pci_slots(&self) -> TopologyResult<Vec<PciSlot>>;
}

/// Source of scoped topology sessions. A session lives for one mapping call
/// and is released when dropped.
pub trait TopologyProvider {
    type Session: Topology;

    fn open(&self) -> TopologyResult<Self::Session>;
}
