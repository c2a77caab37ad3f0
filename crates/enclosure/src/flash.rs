//! Front-loaded all-NVMe chassis (R30 and the F-series).

use std::collections::HashMap;

use common::{Slot, SlotMap};
use topology::Topology;
use tracing::{debug, instrument};

use crate::error::{EnclosureError, EnclosureResult, QueryContext};
use crate::tables::lookup;

/// PCI slot address of a controller function: `0000:80:40.0` -> `0000:80:40`.
pub fn slot_address(function: &str) -> Option<&str> {
    let end = function.len().checked_sub(2)?;
    function.get(..end).filter(|address| !address.is_empty())
}

/// Map first namespaces of all NVMe controllers to bays through `labels`.
///
/// Controllers without a first namespace and PCI slots missing from `labels`
/// are skipped.
#[instrument(level = "debug", skip(session, labels))]
pub fn map_flash<T: Topology + ?Sized>(
    session: &T,
    labels: &[(&str, Slot)],
) -> EnclosureResult<SlotMap> {
    let mut namespaces: HashMap<String, String> = HashMap::new();
    for controller in session.list_devices("nvme").during("list nvme controllers")? {
        let path = controller
            .sys_path()
            .join(format!("{}n1", controller.sys_name()));
        let namespace = match session.device_from_path(&path) {
            Ok(namespace) => namespace,
            Err(err) if err.is_not_found() => {
                debug!(controller = controller.sys_name(), "Controller has no namespace, skipping");
                continue;
            }
            Err(err) => return Err(EnclosureError::topology("resolve namespace", err)),
        };

        let parent = session.parent(&controller).during("walk device parents")?;
        let address = parent
            .as_ref()
            .and_then(|parent| slot_address(parent.sys_name()));
        let Some(address) = address else {
            debug!(controller = controller.sys_name(), "Controller has no PCI parent, skipping");
            continue;
        };
        namespaces.insert(address.to_string(), namespace.sys_name().to_string());
    }

    let mut mapped = SlotMap::new();
    for pci in session.pci_slots().during("read pci slots")? {
        let Some(namespace) = namespaces.get(&pci.address) else {
            continue;
        };
        let Some(slot) = lookup(labels, &pci.name.as_str()) else {
            debug!(label = %pci.name, namespace = %namespace, "PCI slot has no bay assignment");
            continue;
        };
        debug!(slot, namespace = %namespace, "Mapped flash bay");
        mapped.record(slot, Some(namespace.clone()));
    }

    Ok(mapped)
}

#[cfg(test)]
mod tests {
    use topology::{MemoryTopology, MemoryTopologyBuilder, TopologyProvider};
    use tracing_test::traced_test;

    use super::*;
    use crate::tables::{F_SERIES_SLOT_LABELS, R30_SLOT_LABELS};

    /// NVMe controller `index` at PCI function `function`, with or without
    /// its first namespace.
    fn controller(
        builder: MemoryTopologyBuilder,
        function: &str,
        index: u32,
        with_namespace: bool,
    ) -> MemoryTopologyBuilder {
        let pci = format!("/sys/devices/pci0000:80/{function}");
        let nvme = format!("{pci}/nvme/nvme{index}");
        let builder = builder.device(&pci, "pci").device(&nvme, "nvme");
        if with_namespace {
            builder.device(format!("{nvme}/nvme{index}n1"), "block")
        } else {
            builder
        }
    }

    fn run(topology: &MemoryTopology, labels: &[(&str, Slot)]) -> SlotMap {
        let session = topology.open().unwrap();
        map_flash(&session, labels).unwrap()
    }

    #[test]
    fn slot_address_strips_function() {
        assert_eq!(slot_address("0000:80:40.0"), Some("0000:80:40"));
        assert_eq!(slot_address("0000:17:00.1"), Some("0000:17:00"));
        assert_eq!(slot_address(".0"), None);
        assert_eq!(slot_address("0"), None);
    }

    #[test]
    fn r30_uses_board_layout() {
        let builder = controller(MemoryTopology::builder(), "0000:80:40.0", 3, true);
        let builder = controller(builder, "0000:80:41.0", 0, true);
        let topology = builder
            .pci_slot("27", "0000:80:40")
            .pci_slot("26", "0000:80:41")
            .build();
        let mapped = run(&topology, R30_SLOT_LABELS);

        assert_eq!(mapped.device(1), Some("nvme3n1"));
        assert_eq!(mapped.device(7), Some("nvme0n1"));
        assert_eq!(mapped.len(), 2);
    }

    #[test]
    fn r30_slot_without_namespace_stays_empty() {
        let topology = controller(MemoryTopology::builder(), "0000:80:40.0", 3, false)
            .pci_slot("27", "0000:80:40")
            .build();
        let mapped = run(&topology, R30_SLOT_LABELS);
        assert!(mapped.is_empty());
    }

    #[test]
    fn f_series_labels_map_directly() {
        let builder = controller(MemoryTopology::builder(), "0000:17:00.0", 0, true);
        let builder = controller(builder, "0000:18:00.0", 1, true);
        let topology = builder
            .pci_slot("24", "0000:17:00")
            .pci_slot("5", "0000:18:00")
            .pci_slot("6", "0000:19:00")
            .build();
        let mapped = run(&topology, F_SERIES_SLOT_LABELS);

        assert_eq!(mapped.device(24), Some("nvme0n1"));
        assert_eq!(mapped.device(5), Some("nvme1n1"));
        assert!(!mapped.contains(6));
    }

    #[traced_test]
    #[test]
    fn unassigned_labels_are_dropped() {
        let topology = controller(MemoryTopology::builder(), "0000:80:40.0", 0, true)
            .pci_slot("99", "0000:80:40")
            .build();
        assert!(run(&topology, R30_SLOT_LABELS).is_empty());
        assert!(logs_contain("PCI slot has no bay assignment"));
    }

    #[traced_test]
    #[test]
    fn controllers_without_namespace_are_logged() {
        let topology = controller(MemoryTopology::builder(), "0000:80:40.0", 2, false).build();
        assert!(run(&topology, F_SERIES_SLOT_LABELS).is_empty());
        assert!(logs_contain("Controller has no namespace"));
    }
}
