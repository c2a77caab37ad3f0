//! Rear NVMe bays fanned out by a PLX PCIe switch (M50, M60, R50BM).

use std::collections::HashMap;
use std::sync::LazyLock;

use common::{PlatformModel, Slot, SlotMap};
use regex::Regex;
use topology::{Device, Topology, TopologyResult, PROPERTY_SUBSYSTEM};
use tracing::{debug, instrument};

use crate::error::{EnclosureError, EnclosureResult, QueryContext};
use crate::tables::{lookup, PLX_BRIDGE_HANDLE};

static SLOT_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0-([0-9]+)$").expect("slot label pattern is valid"));

/// Bay number encoded in a PLX slot label such as `0-3`.
pub fn parse_slot_label(label: &str) -> Option<Slot> {
    SLOT_LABEL
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|raw| raw.as_str().parse().ok())
}

fn grandparent<T: Topology + ?Sized>(
    session: &T,
    device: &Device,
) -> TopologyResult<Option<Device>> {
    match session.parent(device)? {
        Some(parent) => session.parent(&parent),
        None => Ok(None),
    }
}

/// Map the block devices below the PLX bridge to their bays.
///
/// The bridge has no physical node when no rear drive is plugged in; that
/// yields an empty map. `fixup` translates slot label numbers to logical bays
/// and drops any label it does not list.
#[instrument(level = "debug", skip(session, fixup), fields(model = %model))]
pub fn map_plx_bridge<T: Topology + ?Sized>(
    session: &T,
    model: PlatformModel,
    nvme_slots: u32,
    fixup: Option<&[(Slot, Slot)]>,
) -> EnclosureResult<SlotMap> {
    let labels: HashMap<String, String> = session
        .pci_slots()
        .during("read pci slots")?
        .into_iter()
        .map(|slot| (slot.address, slot.name))
        .collect();

    let mut mapped = SlotMap::new();
    for acpi in session.list_devices("acpi").during("list acpi devices")? {
        let handle = session.attribute(&acpi, "path").during("read acpi path")?;
        if handle.as_deref() != Some(PLX_BRIDGE_HANDLE) {
            continue;
        }

        let node = match session.device_from_path(&acpi.sys_path().join("physical_node")) {
            Ok(node) => node,
            Err(err) if err.is_not_found() => {
                debug!(
                    acpi = acpi.sys_name(),
                    "PLX bridge has no physical node, no rear drives present"
                );
                continue;
            }
            Err(err) => return Err(EnclosureError::topology("resolve physical node", err)),
        };

        for child in session.children(&node).during("list bridge children")? {
            if child.property(PROPERTY_SUBSYSTEM) != Some("block") {
                continue;
            }

            let controller = grandparent(session, &child).during("walk device parents")?;
            let Some(controller) = controller else {
                debug!(device = child.sys_name(), "Block device has no controller, skipping");
                continue;
            };

            let address = controller.sys_name().split('.').next().unwrap_or_default();
            let Some(label) = labels.get(address) else {
                debug!(device = child.sys_name(), address, "No PCI slot for controller");
                continue;
            };

            let Some(raw) = parse_slot_label(label) else {
                debug!(device = child.sys_name(), label = %label, "Unrecognised PCI slot label");
                continue;
            };

            let slot = match fixup {
                Some(table) => lookup(table, &raw),
                None => Some(raw),
            };
            let Some(slot) = slot.filter(|slot| (1..=nvme_slots).contains(slot)) else {
                debug!(device = child.sys_name(), raw, "Slot label outside of the bay range");
                continue;
            };

            debug!(slot, device = child.sys_name(), "Mapped drive behind PLX bridge");
            mapped.record(slot, Some(child.sys_name().to_string()));
        }
    }

    Ok(mapped)
}
