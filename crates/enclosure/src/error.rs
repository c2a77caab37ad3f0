use thiserror::Error;
use topology::{TopologyError, TopologyResult};

/// Failures that abort a mapping call.
///
/// Absent drives, empty bays and unmapped slots are not errors; they surface
/// as "Not Installed" slots. Only unexpected topology failures land here.
#[derive(Debug, Error)]
pub enum EnclosureError {
    /// A topology query failed for a reason other than an absent device.
    #[error("Topology query `{operation}` failed: {source}")]
    Topology {
        operation: &'static str,
        #[source]
        source: TopologyError,
    },
}

impl EnclosureError {
    pub fn topology(operation: &'static str, source: TopologyError) -> Self {
        EnclosureError::Topology { operation, source }
    }
}

pub type EnclosureResult<T> = std::result::Result<T, EnclosureError>;

/// Attach the failing operation to a topology error.
pub(crate) trait QueryContext<T> {
    fn during(self, operation: &'static str) -> EnclosureResult<T>;
}

impl<T> QueryContext<T> for TopologyResult<T> {
    fn during(self, operation: &'static str) -> EnclosureResult<T> {
        self.map_err(|source| EnclosureError::topology(operation, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_error_carries_operation() {
        let source = std::io::Error::new(std::io::ErrorKind::Other, "bus hiccup");
        let result: TopologyResult<()> = Err(TopologyError::io("/sys/bus/pci/slots", source));
        let err = result.during("read pci slots").unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Topology query `read pci slots` failed"));
        assert!(msg.contains("/sys/bus/pci/slots"));
    }
}
