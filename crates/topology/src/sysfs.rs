use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, trace};

use crate::{
    Device, PciSlot, Topology, TopologyConfig, TopologyError, TopologyProvider, TopologyResult,
};

/// Topology provider backed by a mounted sysfs tree.
#[derive(Debug, Clone, Default)]
pub struct SysfsTopology {
    config: TopologyConfig,
}

impl SysfsTopology {
    pub fn new(config: TopologyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }
}

impl TopologyProvider for SysfsTopology {
    type Session = SysfsSession;

    fn open(&self) -> TopologyResult<SysfsSession> {
        let root = self.config.root();
        let root = fs::canonicalize(root).map_err(|err| TopologyError::io(root, err))?;
        debug!(root = %root.display(), "Opened sysfs topology session");
        Ok(SysfsSession {
            config: TopologyConfig::with_root(root),
        })
    }
}

/// Query session over a canonicalized sysfs root.
#[derive(Debug)]
pub struct SysfsSession {
    config: TopologyConfig,
}

fn is_device_dir(path: &Path) -> bool {
    path.join("uevent").is_file()
}

fn parse_uevent(contents: &str) -> BTreeMap<String, String> {
    contents
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Entries of `dir` sorted by name. With `dirs_only`, symlinks and plain
/// files are left out.
fn sorted_entries(dir: &Path, dirs_only: bool) -> TopologyResult<Vec<PathBuf>> {
    let read = fs::read_dir(dir).map_err(|err| TopologyError::io(dir, err))?;
    let mut entries = Vec::new();
    for entry in read {
        let entry = entry.map_err(|err| TopologyError::io(dir, err))?;
        if dirs_only {
            let file_type = entry
                .file_type()
                .map_err(|err| TopologyError::io(entry.path(), err))?;
            if !file_type.is_dir() {
                continue;
            }
        }
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

impl SysfsSession {
    fn load(&self, sys_path: PathBuf) -> TopologyResult<Device> {
        let link = sys_path.join("subsystem");
        let subsystem = match fs::read_link(&link) {
            Ok(target) => target
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => return Err(TopologyError::io(&link, err)),
        };

        let uevent_path = sys_path.join("uevent");
        let uevent = match fs::read_to_string(&uevent_path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(TopologyError::io(&uevent_path, err)),
        };

        let mut properties = parse_uevent(&uevent);
        if let Ok(relative) = sys_path.strip_prefix(self.config.root()) {
            properties.insert("DEVPATH".to_string(), format!("/{}", relative.display()));
        }
        Ok(Device::new(sys_path, subsystem, properties))
    }

    fn collect_descendants(&self, dir: &Path, out: &mut Vec<Device>) -> TopologyResult<()> {
        for entry in sorted_entries(dir, true)? {
            if is_device_dir(&entry) {
                out.push(self.load(entry.clone())?);
            }
            self.collect_descendants(&entry, out)?;
        }
        Ok(())
    }
}

impl Topology for SysfsSession {
    #[instrument(level = "trace", skip(self))]
    fn list_devices(&self, subsystem: &str) -> TopologyResult<Vec<Device>> {
        let listing = [
            self.config.bus_devices_dir(subsystem),
            self.config.class_dir(subsystem),
        ]
        .into_iter()
        .find(|dir| dir.is_dir());

        let Some(listing) = listing else {
            debug!(subsystem, "Subsystem not present in sysfs");
            return Ok(Vec::new());
        };

        let mut devices = Vec::new();
        for entry in sorted_entries(&listing, false)? {
            match self.device_from_path(&entry) {
                Ok(device) => devices.push(device),
                Err(err) if err.is_not_found() => {
                    debug!(path = %entry.display(), "Skipping dangling device link");
                }
                Err(err) => return Err(err),
            }
        }
        trace!(subsystem, count = devices.len(), "Listed devices");
        Ok(devices)
    }

    fn device_from_path(&self, path: &Path) -> TopologyResult<Device> {
        let resolved = match fs::canonicalize(path) {
            Ok(resolved) => resolved,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(TopologyError::not_found(path));
            }
            Err(err) => return Err(TopologyError::io(path, err)),
        };
        if !resolved.starts_with(self.config.root()) || !is_device_dir(&resolved) {
            return Err(TopologyError::not_found(path));
        }
        self.load(resolved)
    }

    fn parent(&self, device: &Device) -> TopologyResult<Option<Device>> {
        let devices_dir = self.config.devices_dir();
        let mut current = device.sys_path().parent();
        while let Some(dir) = current {
            if dir == devices_dir || !dir.starts_with(&devices_dir) {
                break;
            }
            if is_device_dir(dir) {
                return self.load(dir.to_path_buf()).map(Some);
            }
            current = dir.parent();
        }
        Ok(None)
    }

    fn children(&self, device: &Device) -> TopologyResult<Vec<Device>> {
        let mut out = Vec::new();
        self.collect_descendants(device.sys_path(), &mut out)?;
        Ok(out)
    }

    fn attribute(&self, device: &Device, name: &str) -> TopologyResult<Option<Vec<u8>>> {
        let path = device.sys_path().join(name);
        if !path.is_file() {
            return Ok(None);
        }
        match fs::read(&path) {
            Ok(mut value) => {
                while value.last() == Some(&b'\n') {
                    value.pop();
                }
                Ok(Some(value))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(TopologyError::io(&path, err)),
        }
    }

    fn pci_slots(&self) -> TopologyResult<Vec<PciSlot>> {
        let mut slots = Vec::new();
        for entry in sorted_entries(&self.config.pci_slots_dir(), false)? {
            let Some(name) = entry.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            let address_path = entry.join("address");
            let address = fs::read_to_string(&address_path)
                .map_err(|err| TopologyError::io(&address_path, err))?;
            slots.push(PciSlot::new(name, address.trim()));
        }
        Ok(slots)
    }
}
