use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use topology::TopologyConfig;
use tracing::debug;

/// Environment override for the sysfs root.
pub const SYSFS_ROOT_ENV: &str = "ENCCTL_SYSFS_ROOT";

/// Read a YAML topology config file.
pub fn load_file(path: &Path) -> Result<TopologyConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Layer the config sources: flag over environment over file over default.
pub fn resolve(
    file: Option<&Path>,
    env_root: Option<String>,
    flag_root: Option<PathBuf>,
) -> Result<TopologyConfig> {
    let mut config = match file {
        Some(path) => load_file(path)?,
        None => TopologyConfig::default(),
    };
    if let Some(root) = env_root.filter(|root| !root.is_empty()) {
        config.sysfs_root = PathBuf::from(root);
    }
    if let Some(root) = flag_root {
        config.sysfs_root = root;
    }
    debug!(sysfs_root = %config.sysfs_root.display(), "Resolved topology config");
    Ok(config)
}

/// Platform identifier as published by SMBIOS.
pub fn read_platform_identifier(config: &TopologyConfig) -> Result<String> {
    let path = config.product_name_path();
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read platform identifier from {}", path.display()))?;
    Ok(raw.trim().to_string())
}
