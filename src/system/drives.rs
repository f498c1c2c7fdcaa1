//! Drive enumeration, the scan roots for every folder based scanner.
use std::{fmt::Debug, io, path::PathBuf};

use cfg_if::cfg_if;
use itertools::Itertools;
use tracing::{debug, warn};

use crate::utils::get_drive_root;

/// Lists the currently mounted local volume roots
pub trait DriveEnumerator: Send + Sync + Debug {
    fn get_drives(&self) -> Vec<PathBuf>;
}

/// Queries the operating system, falling back to a fixed set of plausible drives when the
/// enumeration mechanism is unavailable or reports nothing
#[derive(Debug, Clone)]
pub struct SystemDrives {
    fallback: Vec<PathBuf>,
}

impl SystemDrives {
    pub fn new<S: AsRef<str>>(fallback_drives: impl IntoIterator<Item = S>) -> Self {
        Self {
            fallback: fallback_drives
                .into_iter()
                .map(|d| get_drive_root(d.as_ref()))
                .collect(),
        }
    }
}

impl DriveEnumerator for SystemDrives {
    #[tracing::instrument(level = "trace")]
    fn get_drives(&self) -> Vec<PathBuf> {
        match list_system_drives() {
            Ok(drives) if !drives.is_empty() => {
                debug!("Drives detected: {drives:?}");
                drives
            }
            Ok(_) => {
                warn!("No drives reported, using fallback drives: {:?}", self.fallback);
                self.fallback.clone()
            }
            Err(e) => {
                warn!(
                    "Drive enumeration failed, using fallback drives {:?}: {e}",
                    self.fallback
                );
                self.fallback.clone()
            }
        }
    }
}

/// A fixed list of drives, e.g. for scanning a single mounted disk image
#[derive(Debug, Clone)]
pub struct FixedDrives(pub Vec<PathBuf>);

impl DriveEnumerator for FixedDrives {
    fn get_drives(&self) -> Vec<PathBuf> {
        self.0.clone()
    }
}

cfg_if! {
    if #[cfg(windows)] {
        use crate::utils::get_command_stdout;

        fn list_system_drives() -> Result<Vec<PathBuf>, io::Error> {
            let stdout = get_command_stdout("wmic", ["logicaldisk", "get", "name"])?;
            Ok(parse_wmic_drives(&stdout))
        }
    } else if #[cfg(target_os = "linux")] {
        fn list_system_drives() -> Result<Vec<PathBuf>, io::Error> {
            let content = std::fs::read_to_string("/proc/self/mounts")?;
            Ok(parse_mount_table(&content))
        }
    } else {
        fn list_system_drives() -> Result<Vec<PathBuf>, io::Error> {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "drive enumeration is not supported on this platform",
            ))
        }
    }
}

/// Parses `wmic logicaldisk get name` output into drive roots, in listed order
#[cfg(any(windows, test))]
fn parse_wmic_drives(stdout: &str) -> Vec<PathBuf> {
    use crate::parsers::parse_drive_letter;

    stdout
        .lines()
        .filter_map(|line| parse_drive_letter(line).ok())
        .map(|(_, letter)| get_drive_root(&format!("{letter}:")))
        .collect()
}

/// Parses a mount table into the mount points of block devices, skipping pseudo filesystems
#[cfg(any(target_os = "linux", test))]
fn parse_mount_table(content: &str) -> Vec<PathBuf> {
    use crate::parsers::parse_mount_line;

    const PSEUDO_FILESYSTEMS: [&str; 6] =
        ["squashfs", "tmpfs", "devtmpfs", "overlay", "proc", "sysfs"];

    content
        .lines()
        .filter_map(|line| parse_mount_line(line).ok())
        .map(|(_, parsed)| parsed)
        .filter(|(device, _, fs_type)| {
            device.starts_with("/dev/") && !PSEUDO_FILESYSTEMS.contains(fs_type)
        })
        // Spaces in mount points are octal escaped
        .map(|(_, mount_point, _)| PathBuf::from(mount_point.replace("\\040", " ")))
        .unique()
        .collect()
}
