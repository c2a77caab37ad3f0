//! Per-model hardware knowledge.
//!
//! Every quirk of a supported chassis lives in [`MODEL_PROFILES`]; the mappers
//! only interpret these tables and never branch on a model directly.

use std::fmt;

use common::{PlatformModel, Slot};

/// ACPI handle of the PLX PCIe switch feeding the rear NVMe bays.
pub const PLX_BRIDGE_HANDLE: &[u8] = b"\\_SB_.PC03.BR3A";

/// Strategy used to locate the NVMe bays of a chassis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperKind {
    PlxBridge,
    RearBay,
    Flash,
}

impl fmt::Display for MapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MapperKind::PlxBridge => "plx-bridge",
            MapperKind::RearBay => "rear-bay",
            MapperKind::Flash => "flash",
        };
        f.pad(name)
    }
}

/// Mapper selection together with the tables that mapper consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperTable {
    /// Bays behind [`PLX_BRIDGE_HANDLE`], numbered by PCI slot label `0-N`.
    /// `fixup` translates label numbers to logical slots; `None` keeps them.
    PlxBridge {
        fixup: Option<&'static [(Slot, Slot)]>,
    },
    /// One ACPI handle per bay.
    RearBay {
        handles: &'static [(&'static [u8], Slot)],
    },
    /// PCI slot label to logical slot.
    Flash {
        labels: &'static [(&'static str, Slot)],
    },
}

impl MapperTable {
    pub fn kind(&self) -> MapperKind {
        match self {
            MapperTable::PlxBridge { .. } => MapperKind::PlxBridge,
            MapperTable::RearBay { .. } => MapperKind::RearBay,
            MapperTable::Flash { .. } => MapperKind::Flash,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelProfile {
    pub model: PlatformModel,
    pub nvme_slots: u32,
    pub table: MapperTable,
}

/// R50BM labels its four rear bays `0-2` through `0-5`, and the bays labelled
/// `0-3` and `0-4` are physically swapped. Verified on hardware.
pub const R50BM_PLX_FIXUP: &[(Slot, Slot)] = &[(2, 1), (3, 3), (4, 2), (5, 4)];

pub const R50_REAR_HANDLES: &[(&[u8], Slot)] = &[
    (b"\\_SB_.PC01.BR1A.OCL0", 1),
    (b"\\_SB_.PC01.BR1B.OCL1", 2),
    (b"\\_SB_.PC00.RP01.PXSX", 3),
];

pub const R50B_REAR_HANDLES: &[(&[u8], Slot)] = &[
    (b"\\_SB_.PC00.RP01.PXSX", 1),
    (b"\\_SB_.PC03.BR3A", 2),
];

/// Physical board layout of the R30 front bays.
pub const R30_SLOT_LABELS: &[(&str, Slot)] = &[
    ("27", 1),
    ("26", 7),
    ("25", 2),
    ("24", 8),
    ("37", 3),
    ("36", 9),
    ("35", 4),
    ("34", 10),
    ("45", 5),
    ("47", 11),
    ("40", 6),
    ("41", 12),
    ("38", 14),
    ("39", 16),
    ("43", 13),
    ("44", 15),
];

/// F-series slot labels already match the bay numbering.
pub const F_SERIES_SLOT_LABELS: &[(&str, Slot)] = &[
    ("1", 1),
    ("2", 2),
    ("3", 3),
    ("4", 4),
    ("5", 5),
    ("6", 6),
    ("7", 7),
    ("8", 8),
    ("9", 9),
    ("10", 10),
    ("11", 11),
    ("12", 12),
    ("13", 13),
    ("14", 14),
    ("15", 15),
    ("16", 16),
    ("17", 17),
    ("18", 18),
    ("19", 19),
    ("20", 20),
    ("21", 21),
    ("22", 22),
    ("23", 23),
    ("24", 24),
];

pub const MODEL_PROFILES: &[ModelProfile] = &[
    ModelProfile {
        model: PlatformModel::R30,
        nvme_slots: 16,
        table: MapperTable::Flash {
            labels: R30_SLOT_LABELS,
        },
    },
    ModelProfile {
        model: PlatformModel::R50,
        nvme_slots: 3,
        table: MapperTable::RearBay {
            handles: R50_REAR_HANDLES,
        },
    },
    ModelProfile {
        model: PlatformModel::R50B,
        nvme_slots: 2,
        table: MapperTable::RearBay {
            handles: R50B_REAR_HANDLES,
        },
    },
    ModelProfile {
        model: PlatformModel::R50BM,
        nvme_slots: 4,
        table: MapperTable::PlxBridge {
            fixup: Some(R50BM_PLX_FIXUP),
        },
    },
    ModelProfile {
        model: PlatformModel::M50,
        nvme_slots: 4,
        table: MapperTable::PlxBridge { fixup: None },
    },
    ModelProfile {
        model: PlatformModel::M60,
        nvme_slots: 4,
        table: MapperTable::PlxBridge { fixup: None },
    },
    ModelProfile {
        model: PlatformModel::F60,
        nvme_slots: 24,
        table: MapperTable::Flash {
            labels: F_SERIES_SLOT_LABELS,
        },
    },
    ModelProfile {
        model: PlatformModel::F100,
        nvme_slots: 24,
        table: MapperTable::Flash {
            labels: F_SERIES_SLOT_LABELS,
        },
    },
    ModelProfile {
        model: PlatformModel::F130,
        nvme_slots: 24,
        table: MapperTable::Flash {
            labels: F_SERIES_SLOT_LABELS,
        },
    },
];

/// Profile for `model`, if the chassis carries NVMe bays needing a mapping.
pub fn profile(model: PlatformModel) -> Option<&'static ModelProfile> {
    MODEL_PROFILES.iter().find(|profile| profile.model == model)
}

/// Look up `key` in a constant `(key, slot)` table.
pub(crate) fn lookup<K: PartialEq>(table: &[(K, Slot)], key: &K) -> Option<Slot> {
    table
        .iter()
        .find(|(candidate, _)| candidate == key)
        .map(|(_, slot)| *slot)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn every_model_has_a_profile() {
        for model in PlatformModel::ALL {
            assert!(profile(model).is_some(), "{model} missing");
        }
        assert_eq!(MODEL_PROFILES.len(), PlatformModel::ALL.len());
    }

    #[test]
    fn tables_cover_exactly_the_slot_range() {
        for profile in MODEL_PROFILES {
            let expected: BTreeSet<Slot> = (1..=profile.nvme_slots).collect();
            let produced: BTreeSet<Slot> = match profile.table {
                MapperTable::PlxBridge { fixup: Some(fixup) } => {
                    fixup.iter().map(|(_, slot)| *slot).collect()
                }
                MapperTable::PlxBridge { fixup: None } => continue,
                MapperTable::RearBay { handles } => handles.iter().map(|(_, slot)| *slot).collect(),
                MapperTable::Flash { labels } => labels.iter().map(|(_, slot)| *slot).collect(),
            };
            assert_eq!(produced, expected, "{}", profile.model);
        }
    }

    #[test]
    fn r50bm_fixup_shifts_and_swaps() {
        assert_eq!(lookup(R50BM_PLX_FIXUP, &2), Some(1));
        assert_eq!(lookup(R50BM_PLX_FIXUP, &3), Some(3));
        assert_eq!(lookup(R50BM_PLX_FIXUP, &4), Some(2));
        assert_eq!(lookup(R50BM_PLX_FIXUP, &5), Some(4));
        assert_eq!(lookup(R50BM_PLX_FIXUP, &1), None);
    }

    #[test]
    fn r30_table_is_a_permutation() {
        assert_eq!(lookup(R30_SLOT_LABELS, &"27"), Some(1));
        assert_eq!(lookup(R30_SLOT_LABELS, &"44"), Some(15));
        assert_eq!(lookup(R30_SLOT_LABELS, &"1"), None);
    }

    #[test]
    fn f_series_table_is_identity() {
        for (label, slot) in F_SERIES_SLOT_LABELS {
            assert_eq!(label.parse::<Slot>().unwrap(), *slot);
        }
    }

    #[test]
    fn mapper_kinds() {
        assert_eq!(profile(PlatformModel::M60).unwrap().table.kind(), MapperKind::PlxBridge);
        assert_eq!(profile(PlatformModel::R50B).unwrap().table.kind(), MapperKind::RearBay);
        assert_eq!(profile(PlatformModel::F130).unwrap().table.kind(), MapperKind::Flash);
        assert_eq!(MapperKind::RearBay.to_string(), "rear-bay");
    }
}
