#![cfg(unix)]

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use common::SlotStatus;
use enclosure::map_nvme;
use tempfile::TempDir;
use topology::{SysfsTopology, TopologyConfig};

fn device(root: &Path, rel: &str, subsystem: &str) -> PathBuf {
    let path = root.join("devices").join(rel);
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("uevent"), "").unwrap();
    symlink(root.join("class").join(subsystem), path.join("subsystem")).unwrap();
    path
}

fn slot(root: &Path, name: &str, address: &str) {
    let dir = root.join("bus/pci/slots").join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("address"), format!("{address}\n")).unwrap();
}

/// R30 front bays: label 27 holds nvme3 with a namespace, label 26 holds
/// nvme0 without one, label 25 is empty.
fn r30_sysfs() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("class/nvme")).unwrap();

    device(root, "pci0000:80/0000:80:40.0", "pci");
    let nvme3 = device(root, "pci0000:80/0000:80:40.0/nvme/nvme3", "nvme");
    device(root, "pci0000:80/0000:80:40.0/nvme/nvme3/nvme3n1", "block");
    symlink(&nvme3, root.join("class/nvme/nvme3")).unwrap();

    device(root, "pci0000:80/0000:80:41.0", "pci");
    let nvme0 = device(root, "pci0000:80/0000:80:41.0/nvme/nvme0", "nvme");
    symlink(&nvme0, root.join("class/nvme/nvme0")).unwrap();

    slot(root, "27", "0000:80:40");
    slot(root, "26", "0000:80:41");
    slot(root, "25", "0000:80:42");
    dir
}

#[test]
fn r30_maps_from_sysfs() {
    let dir = r30_sysfs();
    let provider = SysfsTopology::new(TopologyConfig::with_root(dir.path()));

    let result = map_nvme("TRUENAS-R30", &provider).unwrap();
    assert_eq!(result.len(), 1);
    let slots = result[0].slots();
    assert_eq!(slots.len(), 16);
    assert_eq!(slots[&1].dev.as_deref(), Some("nvme3n1"));
    assert_eq!(slots[&1].status, SlotStatus::Ok);
    assert_eq!(slots[&7].status, SlotStatus::NotInstalled);
    assert_eq!(slots[&2].status, SlotStatus::NotInstalled);
    assert_eq!(result[0].installed().count(), 1);
}

#[test]
fn plx_chassis_without_slot_directory_fails() {
    let dir = TempDir::new().unwrap();
    let provider = SysfsTopology::new(TopologyConfig::with_root(dir.path()));

    let err = map_nvme("TRUENAS-M50-HA", &provider).unwrap_err();
    assert!(err.to_string().contains("read pci slots"));
}

#[test]
fn unsupported_chassis_never_touches_sysfs() {
    let provider = SysfsTopology::new(TopologyConfig::with_root("/nonexistent/sysfs"));
    assert!(map_nvme("TRUENAS-X10-HA", &provider).unwrap().is_empty());
}
