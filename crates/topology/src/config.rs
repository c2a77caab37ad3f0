use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default sysfs mount point.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys";

/// Location of the sysfs tree queried by [`crate::SysfsTopology`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub sysfs_root: PathBuf,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
        }
    }
}

impl TopologyConfig {
    pub fn with_root(sysfs_root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: sysfs_root.into(),
        }
    }

    /// Directory holding every device node.
    pub fn devices_dir(&self) -> PathBuf {
        self.sysfs_root.join("devices")
    }

    /// Bus-level device listing for `subsystem`.
    pub fn bus_devices_dir(&self, subsystem: &str) -> PathBuf {
        self.sysfs_root.join("bus").join(subsystem).join("devices")
    }

    /// Class-level device listing for `subsystem`.
    pub fn class_dir(&self, subsystem: &str) -> PathBuf {
        self.sysfs_root.join("class").join(subsystem)
    }

    pub fn pci_slots_dir(&self) -> PathBuf {
        self.sysfs_root.join("bus").join("pci").join("slots")
    }

    /// File holding the platform identifier (SMBIOS product name).
    pub fn product_name_path(&self) -> PathBuf {
        self.sysfs_root
            .join("class")
            .join("dmi")
            .join("id")
            .join("product_name")
    }

    pub fn root(&self) -> &Path {
        &self.sysfs_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_root_is_sys() {
        let config = TopologyConfig::default();
        assert_eq!(config.root(), Path::new("/sys"));
        assert_eq!(config.pci_slots_dir(), PathBuf::from("/sys/bus/pci/slots"));
        assert_eq!(
            config.bus_devices_dir("acpi"),
            PathBuf::from("/sys/bus/acpi/devices")
        );
        assert_eq!(config.class_dir("nvme"), PathBuf::from("/sys/class/nvme"));
    }

    #[test]
    fn derived_paths_follow_custom_root() {
        let config = TopologyConfig::with_root("/tmp/fake-sys");
        assert_eq!(config.devices_dir(), PathBuf::from("/tmp/fake-sys/devices"));
        assert_eq!(
            config.product_name_path(),
            PathBuf::from("/tmp/fake-sys/class/dmi/id/product_name")
        );
    }
}
