//! Discrete rear NVMe bays, each behind its own ACPI handle (R50, R50B).

use common::{Slot, SlotMap};
use topology::Topology;
use tracing::{debug, instrument, warn};

use crate::error::{EnclosureError, EnclosureResult, QueryContext};
use crate::tables::lookup;

/// Map each bay listed in `handles` to the first NVMe block device below it.
///
/// A bay whose handle is found but holds no drive is recorded as empty. The
/// handles are mandatory on supported chassis, so a handle without a physical
/// node ends the scan and the bays resolved so far are returned. Scanning
/// stops as soon as every bay is resolved.
#[instrument(level = "debug", skip(session, handles))]
pub fn map_rear_bays<T: Topology + ?Sized>(
    session: &T,
    nvme_slots: u32,
    handles: &[(&[u8], Slot)],
) -> EnclosureResult<SlotMap> {
    let mut mapped = SlotMap::new();
    for acpi in session.list_devices("acpi").during("list acpi devices")? {
        let Some(handle) = session.attribute(&acpi, "path").during("read acpi path")? else {
            continue;
        };
        let Some(slot) = lookup(handles, &handle.as_slice()) else {
            continue;
        };

        let node = match session.device_from_path(&acpi.sys_path().join("physical_node")) {
            Ok(node) => node,
            Err(err) if err.is_not_found() => {
                warn!(
                    handle = %String::from_utf8_lossy(&handle),
                    slot,
                    resolved = mapped.len(),
                    "Rear NVMe bay handle has no physical node, aborting scan"
                );
                break;
            }
            Err(err) => return Err(EnclosureError::topology("resolve physical node", err)),
        };

        let drive = session
            .children(&node)
            .during("list bay children")?
            .into_iter()
            .find(|dev| dev.sys_name().starts_with("nvme") && dev.subsystem() == Some("block"))
            .map(|dev| dev.sys_name().to_string());

        debug!(slot, drive = ?drive, "Resolved rear NVMe bay");
        mapped.record(slot, drive);

        if mapped.len() == nvme_slots as usize {
            debug!("All rear bays resolved, stopping ACPI scan");
            break;
        }
    }

    Ok(mapped)
}
