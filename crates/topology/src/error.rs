use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures raised while querying the device topology.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// No device node currently exists at the path (e.g. an empty drive bay).
    #[error("No device found at {}", path.display())]
    NotFound { path: PathBuf },

    /// Reading the topology failed for a reason other than absence.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TopologyError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        TopologyError::NotFound { path: path.into() }
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        TopologyError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TopologyError::NotFound { .. })
    }
}

pub type TopologyResult<T> = std::result::Result<T, TopologyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_path() {
        let err = TopologyError::not_found("/sys/devices/foo/physical_node");
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "No device found at /sys/devices/foo/physical_node"
        );
    }

    #[test]
    fn io_error_wraps_source() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = TopologyError::io("/sys/bus/pci/slots", source);
        assert!(!err.is_not_found());
        let msg = err.to_string();
        assert!(msg.contains("/sys/bus/pci/slots"));
        assert!(msg.contains("denied"));
    }
}
