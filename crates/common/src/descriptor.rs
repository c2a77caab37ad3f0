use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Slot, VALUE_RAW_INSTALLED, VALUE_RAW_NOT_INSTALLED};

/// Element status as reported for an array device slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Not Installed")]
    NotInstalled,
}

impl SlotStatus {
    /// Raw element code paired with this status.
    pub fn value_raw(&self) -> &'static str {
        match self {
            SlotStatus::Ok => VALUE_RAW_INSTALLED,
            SlotStatus::NotInstalled => VALUE_RAW_NOT_INSTALLED,
        }
    }
}

/// Back-reference used to correlate a slot with the enclosure it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementOrigin {
    pub enclosure_id: String,
    pub enclosure_sg: Option<String>,
    pub enclosure_bsg: Option<String>,
    pub descriptor: String,
    pub slot: Slot,
}

/// A single drive bay of an enclosure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotElement {
    pub descriptor: String,
    pub status: SlotStatus,
    pub value: Option<String>,
    pub value_raw: String,
    pub dev: Option<String>,
    pub original: ElementOrigin,
}

impl SlotElement {
    /// Element for `slot` of the enclosure `enclosure_id`, occupied by `dev`.
    pub fn new(enclosure_id: &str, slot: Slot, dev: Option<String>) -> Self {
        let status = if dev.is_some() {
            SlotStatus::Ok
        } else {
            SlotStatus::NotInstalled
        };
        Self {
            descriptor: format!("Disk #{slot}"),
            status,
            value: None,
            value_raw: status.value_raw().to_string(),
            dev,
            original: ElementOrigin {
                enclosure_id: enclosure_id.to_string(),
                enclosure_sg: None,
                enclosure_bsg: None,
                descriptor: format!("slot{slot}"),
                slot,
            },
        }
    }

    pub fn is_installed(&self) -> bool {
        self.status == SlotStatus::Ok
    }
}

/// Element categories of an enclosure. Synthetic NVMe enclosures only carry
/// array device slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elements {
    #[serde(rename = "Array Device Slot")]
    pub array_device_slot: BTreeMap<Slot, SlotElement>,
}

/// Normalized enclosure record consumed by the enclosure-merging logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnclosureDescriptor {
    pub id: String,
    pub dmi: String,
    pub sg: Option<String>,
    pub bsg: Option<String>,
    pub name: String,
    pub controller: bool,
    pub status: Vec<String>,
    pub elements: Elements,
}

impl EnclosureDescriptor {
    /// Empty controller enclosure identified by `id`.
    pub fn synthetic(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            dmi: id.clone(),
            id,
            sg: None,
            bsg: None,
            name: name.into(),
            controller: true,
            status: vec!["OK".to_string()],
            elements: Elements::default(),
        }
    }

    pub fn slots(&self) -> &BTreeMap<Slot, SlotElement> {
        &self.elements.array_device_slot
    }

    pub fn installed(&self) -> impl Iterator<Item = &SlotElement> {
        self.slots().values().filter(|element| element.is_installed())
    }
}
