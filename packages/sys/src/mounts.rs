//! Mount-root discovery from the kernel mount table.

use std::fs;
use std::path::PathBuf;

use mountfs_core::{Error, MountRootProvider, Result};

/// Filesystem type the FUSE daemon registers its mounts under.
pub const DEFAULT_FSTYPE: &str = "fuse.maggiefs";

const PROC_MOUNTS: &str = "/proc/mounts";

/// Finds the mount root by scanning a `/proc/mounts`-format table for the
/// first entry of a given filesystem type.
#[derive(Debug, Clone)]
pub struct ProcMountsRoot {
    table: PathBuf,
    fstype: String,
}

impl Default for ProcMountsRoot {
    fn default() -> Self {
        Self::new(DEFAULT_FSTYPE)
    }
}

impl ProcMountsRoot {
    pub fn new(fstype: impl Into<String>) -> Self {
        Self {
            table: PathBuf::from(PROC_MOUNTS),
            fstype: fstype.into(),
        }
    }

    /// Read a different mount table, e.g. `/proc/self/mounts`.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<PathBuf>) -> Self {
        self.table = table.into();
        self
    }
}

impl MountRootProvider for ProcMountsRoot {
    fn mount_root(&self) -> Result<PathBuf> {
        let text = fs::read_to_string(&self.table).map_err(|e| Error::from_io(e, &self.table))?;
        parse_mounts(&text, &self.fstype).ok_or_else(|| {
            Error::invalid_config(format!(
                "no mount of type {} in {}",
                self.fstype,
                self.table.display()
            ))
        })
    }
}

/// Mount point of the first entry whose type is `fstype`.
///
/// Lines are `device mountpoint fstype options dump pass`; the mount point
/// has spaces and other specials escaped as `\ooo` octal.
pub fn parse_mounts(text: &str, fstype: &str) -> Option<PathBuf> {
    text.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        let _device = fields.next()?;
        let mount_point = fields.next()?;
        let kind = fields.next()?;
        (kind == fstype).then(|| PathBuf::from(unescape(mount_point)))
    })
}

fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 4 <= bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let value = digits.iter().fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                if let Ok(value) = u8::try_from(value) {
                    out.push(value);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
