use common::{EnclosureDescriptor, PlatformModel, SlotElement, SlotMap};

/// Package a slot map as the synthetic enclosure of `model`.
///
/// Every slot in `1..=nvme_slots` is present in the result; slots without a
/// device are reported as "Not Installed". The enclosure-merging logic expects
/// a list, although a single enclosure is always produced.
pub fn build_enclosure(
    model: PlatformModel,
    nvme_slots: u32,
    mapped: &SlotMap,
) -> Vec<EnclosureDescriptor> {
    let id = model.enclosure_id();
    let name = format!("{model} NVMe Enclosure");
    let mut enclosure = EnclosureDescriptor::synthetic(id.clone(), name);
    for slot in 1..=nvme_slots {
        let dev = mapped.device(slot).map(str::to_string);
        enclosure
            .elements
            .array_device_slot
            .insert(slot, SlotElement::new(&id, slot, dev));
    }
    vec![enclosure]
}
