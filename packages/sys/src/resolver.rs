//! Symlink-safe front end for locality sources.

use std::fs;
use std::path::Path;

use mountfs_core::locality::normalize;
use mountfs_core::{BlockLocation, ByteRange, Error, LocalitySource, PathMapper, Result, ResolvedFile};

/// Resolves block locations for physical files inside one mount.
///
/// Before any source is consulted the file is canonicalized. A path whose
/// symlinks lead outside the mount root fails with [`Error::OutOfMount`].
pub struct LocalityResolver {
    mapper: PathMapper,
    source: Box<dyn LocalitySource>,
}

impl LocalityResolver {
    pub fn new(mapper: PathMapper, source: Box<dyn LocalitySource>) -> Self {
        Self { mapper, source }
    }

    /// Records for `physical` overlapping `[start, start + length)`, sorted
    /// by offset with duplicates removed.
    pub fn resolve(&self, physical: &Path, start: u64, length: u64) -> Result<Vec<BlockLocation>> {
        let canonical = fs::canonicalize(physical).map_err(|e| Error::from_io(e, physical))?;

        let Some(mount_relative) = self.mount_relative(&canonical) else {
            tracing::warn!(
                path = %physical.display(),
                canonical = %canonical.display(),
                mount_root = %self.mapper.mount_root().display(),
                "locality requested for a path outside the mount"
            );
            return Err(Error::OutOfMount {
                path: physical.into(),
                mount_root: self.mapper.mount_root().into(),
            });
        };

        if length == 0 {
            return Ok(Vec::new());
        }

        let file = ResolvedFile {
            physical: canonical,
            mount_relative,
        };
        let records = self.source.locate(&file, ByteRange::new(start, length))?;
        tracing::trace!(file = %file.mount_relative, start, length, count = records.len(), "resolved locality");
        Ok(normalize(records))
    }

    /// Mount-relative form of a canonical path, checked against the
    /// configured root and, failing that, the root with its own symlinks
    /// resolved.
    fn mount_relative(&self, canonical: &Path) -> Option<String> {
        self.mapper.mount_relative(canonical).or_else(|| {
            let root = fs::canonicalize(self.mapper.mount_root()).ok()?;
            PathMapper::new(root).mount_relative(canonical)
        })
    }
}
