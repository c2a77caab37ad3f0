use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chassis prefix carried by platform identifiers.
pub const IDENTIFIER_PREFIX: &str = "TRUENAS-";

/// Suffix carried by identifiers of high-availability chassis.
pub const IDENTIFIER_SUFFIX_HA: &str = "-HA";

/// Chassis models with NVMe drive bays that lack native enclosure reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlatformModel {
    R30,
    R50,
    R50B,
    R50BM,
    M50,
    M60,
    F60,
    F100,
    F130,
}

/// Returned when a model tag is not one of the supported chassis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported platform model `{0}`")]
pub struct UnknownModel(pub String);

impl PlatformModel {
    pub const ALL: [PlatformModel; 9] = [
        PlatformModel::R30,
        PlatformModel::R50,
        PlatformModel::R50B,
        PlatformModel::R50BM,
        PlatformModel::M50,
        PlatformModel::M60,
        PlatformModel::F60,
        PlatformModel::F100,
        PlatformModel::F130,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformModel::R30 => "R30",
            PlatformModel::R50 => "R50",
            PlatformModel::R50B => "R50B",
            PlatformModel::R50BM => "R50BM",
            PlatformModel::M50 => "M50",
            PlatformModel::M60 => "M60",
            PlatformModel::F60 => "F60",
            PlatformModel::F100 => "F100",
            PlatformModel::F130 => "F130",
        }
    }

    /// Resolve a platform identifier such as `TRUENAS-R50-HA` to its model.
    ///
    /// Only the exact prefix and suffix decorations are removed; anything else
    /// (lower-case tags, extra whitespace, unknown chassis) yields `None`.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        let tag = identifier
            .strip_prefix(IDENTIFIER_PREFIX)
            .unwrap_or(identifier);
        let tag = tag.strip_suffix(IDENTIFIER_SUFFIX_HA).unwrap_or(tag);
        tag.parse().ok()
    }

    /// Stable identifier of the synthetic enclosure for this model.
    pub fn enclosure_id(&self) -> String {
        format!("{}_nvme_enclosure", self.as_str().to_lowercase())
    }
}

impl fmt::Display for PlatformModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for PlatformModel {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformModel::ALL
            .iter()
            .copied()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| UnknownModel(s.to_string()))
    }
}
