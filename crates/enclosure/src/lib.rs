//! Synthetic enclosures for NVMe drive bays.
//!
//! NVMe bays on these chassis are not reported by any enclosure controller.
//! [`map_nvme`] works out which drive sits in which bay from the live device
//! topology and packages the result as an [`EnclosureDescriptor`] shaped like
//! the ones real enclosures produce, so the general enclosure-merging logic
//! can treat both alike.

mod descriptor;
mod error;
pub mod flash;
pub mod plx;
pub mod rear_bay;
pub mod tables;

use common::{EnclosureDescriptor, PlatformModel, SlotMap};
use topology::{Topology, TopologyProvider};
use tracing::{debug, info, info_span};

pub use descriptor::build_enclosure;
pub use error::{EnclosureError, EnclosureResult};
pub use tables::{MapperKind, MapperTable, ModelProfile, MODEL_PROFILES};

/// Map the NVMe bays of the platform named by `identifier`.
///
/// Returns an empty list for platforms without NVMe bays to map, otherwise a
/// single descriptor covering every bay of the chassis. One topology session
/// is opened per call and released before returning.
pub fn map_nvme<P>(identifier: &str, provider: &P) -> EnclosureResult<Vec<EnclosureDescriptor>>
where
    P: TopologyProvider + ?Sized,
{
    let span = info_span!("map_nvme", identifier);
    let _enter = span.enter();

    let Some(profile) = PlatformModel::from_identifier(identifier).and_then(tables::profile) else {
        debug!("Platform has no NVMe bays to map");
        return Ok(Vec::new());
    };

    let session = provider
        .open()
        .map_err(|err| EnclosureError::topology("open session", err))?;
    map_model(&session, profile)
}

/// Map the bays of `profile` using an already open session.
pub fn map_model<T: Topology + ?Sized>(
    session: &T,
    profile: &ModelProfile,
) -> EnclosureResult<Vec<EnclosureDescriptor>> {
    let model = profile.model;
    let mapped: SlotMap = match profile.table {
        MapperTable::PlxBridge { fixup } => {
            plx::map_plx_bridge(session, model, profile.nvme_slots, fixup)?
        }
        MapperTable::RearBay { handles } => {
            rear_bay::map_rear_bays(session, profile.nvme_slots, handles)?
        }
        MapperTable::Flash { labels } => flash::map_flash(session, labels)?,
    };

    let descriptors = build_enclosure(model, profile.nvme_slots, &mapped);
    info!(
        model = %model,
        mapper = %profile.table.kind(),
        slots = profile.nvme_slots,
        installed = descriptors.iter().map(|enc| enc.installed().count()).sum::<usize>(),
        "Mapped NVMe enclosure"
    );
    Ok(descriptors)
}
