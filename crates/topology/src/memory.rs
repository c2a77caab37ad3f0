use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{Device, PciSlot, Topology, TopologyError, TopologyProvider, TopologyResult};

#[derive(Debug, Default)]
struct Node {
    subsystem: Option<String>,
    properties: BTreeMap<String, String>,
    attributes: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Default)]
struct Inner {
    nodes: BTreeMap<PathBuf, Node>,
    links: BTreeMap<PathBuf, PathBuf>,
    slots: Vec<PciSlot>,
}

/// Topology served from a prepared device tree.
///
/// Device paths are ordered by component, so enumeration yields parents before
/// their descendants, the same order a sysfs walk produces.
#[derive(Debug, Clone, Default)]
pub struct MemoryTopology {
    inner: Arc<Inner>,
    sessions: Arc<AtomicUsize>,
}

impl MemoryTopology {
    pub fn builder() -> MemoryTopologyBuilder {
        MemoryTopologyBuilder::default()
    }

    /// Number of sessions opened so far.
    pub fn sessions_opened(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

impl TopologyProvider for MemoryTopology {
    type Session = MemorySession;

    fn open(&self) -> TopologyResult<MemorySession> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(MemorySession {
            inner: Arc::clone(&self.inner),
        })
    }
}

/// Incrementally assembles a [`MemoryTopology`].
#[derive(Debug, Default)]
pub struct MemoryTopologyBuilder {
    inner: Inner,
}

impl MemoryTopologyBuilder {
    /// Add a device node. Intermediate directories are not devices unless
    /// added explicitly.
    pub fn device(mut self, sys_path: impl AsRef<Path>, subsystem: &str) -> Self {
        self.inner
            .nodes
            .entry(sys_path.as_ref().to_path_buf())
            .or_default()
            .subsystem = Some(subsystem.to_string());
        self
    }

    /// Set an attribute on a device, creating a subsystem-less node if needed.
    pub fn attribute(
        mut self,
        sys_path: impl AsRef<Path>,
        name: &str,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        self.inner
            .nodes
            .entry(sys_path.as_ref().to_path_buf())
            .or_default()
            .attributes
            .insert(name.to_string(), value.into());
        self
    }

    pub fn property(mut self, sys_path: impl AsRef<Path>, key: &str, value: &str) -> Self {
        self.inner
            .nodes
            .entry(sys_path.as_ref().to_path_buf())
            .or_default()
            .properties
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Make `from` resolve to the device at `to`, like a sysfs symlink.
    pub fn link(mut self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Self {
        self.inner
            .links
            .insert(from.as_ref().to_path_buf(), to.as_ref().to_path_buf());
        self
    }

    pub fn pci_slot(mut self, name: &str, address: &str) -> Self {
        self.inner.slots.push(PciSlot::new(name, address));
        self
    }

    pub fn build(self) -> MemoryTopology {
        MemoryTopology {
            inner: Arc::new(self.inner),
            sessions: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// Session over a shared [`MemoryTopology`] tree.
#[derive(Debug)]
pub struct MemorySession {
    inner: Arc<Inner>,
}

impl MemorySession {
    fn device_at(&self, path: &Path) -> Option<Device> {
        self.inner.nodes.get(path).map(|node| {
            Device::new(path, node.subsystem.clone(), node.properties.clone())
        })
    }
}

impl Topology for MemorySession {
    fn list_devices(&self, subsystem: &str) -> TopologyResult<Vec<Device>> {
        Ok(self
            .inner
            .nodes
            .iter()
            .filter(|(_, node)| node.subsystem.as_deref() == Some(subsystem))
            .filter_map(|(path, _)| self.device_at(path))
            .collect())
    }

    fn device_from_path(&self, path: &Path) -> TopologyResult<Device> {
        let resolved = self
            .inner
            .links
            .get(path)
            .map(PathBuf::as_path)
            .unwrap_or(path);
        self.device_at(resolved)
            .ok_or_else(|| TopologyError::not_found(path))
    }

    fn parent(&self, device: &Device) -> TopologyResult<Option<Device>> {
        Ok(device
            .sys_path()
            .ancestors()
            .skip(1)
            .find_map(|ancestor| self.device_at(ancestor)))
    }

    fn children(&self, device: &Device) -> TopologyResult<Vec<Device>> {
        let root = device.sys_path();
        Ok(self
            .inner
            .nodes
            .keys()
            .filter(|path| path.as_path() != root && path.starts_with(root))
            .filter_map(|path| self.device_at(path))
            .collect())
    }

    fn attribute(&self, device: &Device, name: &str) -> TopologyResult<Option<Vec<u8>>> {
        Ok(self
            .inner
            .nodes
            .get(device.sys_path())
            .and_then(|node| node.attributes.get(name).cloned()))
    }

    fn pci_slots(&self) -> TopologyResult<Vec<PciSlot>> {
        Ok(self.inner.slots.clone())
    }
}
