//! File operations on physical paths.
//!
//! [`LocalFs`] does the host-side half of every filesystem call: it takes a
//! physical path, performs the operation with `std::fs`, and maps failures
//! onto the typed [`Error`] variants. Statuses it returns already carry
//! logical paths, translated through its [`PathMapper`].

use std::fs::{self, DirBuilder, File, Metadata, Permissions};
use std::io;
use std::os::unix::fs::{DirBuilderExt, MetadataExt, PermissionsExt};
use std::path::Path;
use std::time::UNIX_EPOCH;

use mountfs_core::{CreateOptions, Error, FileStatus, PathMapper, Result};

use crate::writer::DurableWriter;

/// Mode for intermediate directories created on the caller's behalf.
const DEFAULT_DIR_MODE: u32 = 0o777;

/// True for errors meaning "nothing is there", including a path that runs
/// through a regular file.
fn is_missing(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::NotFound || error.raw_os_error() == Some(libc::ENOTDIR)
}

/// Host filesystem access for one mount.
#[derive(Debug, Clone)]
pub struct LocalFs {
    mapper: PathMapper,
    block_size: u64,
}

impl LocalFs {
    pub fn new(mapper: PathMapper, block_size: u64) -> Self {
        Self { mapper, block_size }
    }

    pub fn mapper(&self) -> &PathMapper {
        &self.mapper
    }

    /// Open an existing file for reading.
    pub fn open(&self, path: &Path) -> Result<File> {
        let meta = fs::metadata(path).map_err(|e| Error::from_io(e, path))?;
        if meta.is_dir() {
            return Err(Error::IsADirectory { path: path.into() });
        }
        File::open(path).map_err(|e| Error::from_io(e, path))
    }

    /// Create (or truncate) a file and return a durable writer for it.
    pub fn create(&self, path: &Path, options: &CreateOptions) -> Result<DurableWriter> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => {
                return Err(Error::IsADirectory { path: path.into() });
            }
            Ok(_) if !options.overwrite => {
                return Err(Error::AlreadyExists { path: path.into() });
            }
            Ok(_) => {}
            Err(e) if is_missing(&e) => {}
            Err(e) => return Err(Error::from_io(e, path)),
        }

        if let Some(parent) = path.parent() {
            self.ensure_parent(parent, options.create_parent_dirs)?;
        }

        let writer = DurableWriter::open(path, options.buffer_size, false)
            .map_err(|e| Error::from_io(e, path))?;

        if let Some(mode) = options.permission {
            fs::set_permissions(path, Permissions::from_mode(mode))
                .map_err(|e| Error::from_io(e, path))?;
        }

        tracing::debug!(path = %path.display(), overwrite = options.overwrite, "created file");
        Ok(writer)
    }

    /// Open an existing file for appending.
    pub fn append(&self, path: &Path, buffer_size: usize) -> Result<DurableWriter> {
        let meta = fs::metadata(path).map_err(|e| Error::from_io(e, path))?;
        if meta.is_dir() {
            return Err(Error::IsADirectory { path: path.into() });
        }
        DurableWriter::open(path, buffer_size, true).map_err(|e| Error::from_io(e, path))
    }

    pub fn delete(&self, path: &Path, recursive: bool) -> Result<()> {
        let meta = fs::symlink_metadata(path).map_err(|e| Error::from_io(e, path))?;

        if meta.is_dir() {
            if recursive {
                fs::remove_dir_all(path).map_err(|e| Error::from_io(e, path))?;
            } else {
                let mut entries = fs::read_dir(path).map_err(|e| Error::from_io(e, path))?;
                if entries.next().is_some() {
                    return Err(Error::DirectoryNotEmpty { path: path.into() });
                }
                fs::remove_dir(path).map_err(|e| Error::from_io(e, path))?;
            }
        } else {
            fs::remove_file(path).map_err(|e| Error::from_io(e, path))?;
        }

        tracing::debug!(path = %path.display(), recursive, "deleted");
        Ok(())
    }

    /// Rename with POSIX `rename(2)` semantics.
    pub fn rename(&self, src: &Path, dst: &Path) -> Result<()> {
        fs::symlink_metadata(src).map_err(|e| Error::from_io(e, src))?;
        fs::rename(src, dst).map_err(|e| Error::from_io(e, dst))?;
        tracing::debug!(src = %src.display(), dst = %dst.display(), "renamed");
        Ok(())
    }

    /// Statuses of a directory's entries, sorted by name.
    ///
    /// A file lists as its own status. Entries removed while the listing runs
    /// are skipped; dangling symlinks report the link itself.
    pub fn list(&self, path: &Path) -> Result<Vec<FileStatus>> {
        let meta = fs::metadata(path).map_err(|e| Error::from_io(e, path))?;
        if !meta.is_dir() {
            return Ok(vec![self.status_of(path, &meta)]);
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| Error::from_io(e, path))? {
            let entry = entry.map_err(|e| Error::from_io(e, path))?;
            let entry_path = entry.path();
            // Dangling or looping links are reported as the link itself.
            let meta = match fs::metadata(&entry_path) {
                Ok(meta) => meta,
                Err(_) => match fs::symlink_metadata(&entry_path) {
                    Ok(meta) => meta,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        tracing::trace!(path = %entry_path.display(), "entry vanished during listing");
                        continue;
                    }
                    Err(e) => return Err(Error::from_io(e, &entry_path)),
                },
            };
            entries.push((entry.file_name(), self.status_of(&entry_path, &meta)));
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries.into_iter().map(|(_, status)| status).collect())
    }

    /// Create a directory and any missing ancestors.
    ///
    /// Succeeds when the directory already exists. `permission` is applied
    /// to the leaf only when this call creates it.
    pub fn mkdirs(&self, path: &Path, permission: u32) -> Result<()> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => return Ok(()),
            Ok(_) => return Err(Error::NotADirectory { path: path.into() }),
            Err(e) if is_missing(&e) => {}
            Err(e) => return Err(Error::from_io(e, path)),
        }
        self.check_ancestors(path)?;

        DirBuilder::new()
            .recursive(true)
            .mode(DEFAULT_DIR_MODE)
            .create(path)
            .map_err(|e| Error::from_io(e, path))?;
        fs::set_permissions(path, Permissions::from_mode(permission))
            .map_err(|e| Error::from_io(e, path))?;

        tracing::debug!(path = %path.display(), permission = %format!("{:o}", permission), "created directory");
        Ok(())
    }

    pub fn stat(&self, path: &Path) -> Result<FileStatus> {
        let meta = fs::metadata(path).map_err(|e| Error::from_io(e, path))?;
        Ok(self.status_of(path, &meta))
    }

    fn ensure_parent(&self, parent: &Path, create: bool) -> Result<()> {
        match fs::metadata(parent) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(Error::NotADirectory {
                path: parent.into(),
            }),
            Err(e) if is_missing(&e) => {
                self.check_ancestors(parent)?;
                if !create {
                    return Err(Error::NotFound {
                        path: parent.into(),
                    });
                }
                fs::create_dir_all(parent).map_err(|e| Error::from_io(e, parent))
            }
            Err(e) => Err(Error::from_io(e, parent)),
        }
    }

    /// Fail with `NotADirectory` if the nearest existing ancestor of `path`
    /// is not a directory.
    fn check_ancestors(&self, path: &Path) -> Result<()> {
        for ancestor in path.ancestors().skip(1) {
            match fs::metadata(ancestor) {
                Ok(meta) if meta.is_dir() => return Ok(()),
                Ok(_) => {
                    return Err(Error::NotADirectory {
                        path: ancestor.into(),
                    })
                }
                Err(e) if is_missing(&e) => continue,
                Err(e) => return Err(Error::from_io(e, ancestor)),
            }
        }
        Ok(())
    }

    fn status_of(&self, physical: &Path, meta: &Metadata) -> FileStatus {
        FileStatus {
            path: self.mapper.to_logical(physical),
            length: if meta.is_dir() { 0 } else { meta.len() },
            is_dir: meta.is_dir(),
            modification_time: meta.modified().unwrap_or(UNIX_EPOCH),
            access_time: meta.accessed().unwrap_or(UNIX_EPOCH),
            permission: meta.mode() & 0o7777,
            owner: meta.uid().to_string(),
            group: meta.gid().to_string(),
            block_size: self.block_size,
            replication: 1,
        }
    }
}
