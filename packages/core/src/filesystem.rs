//! The logical filesystem contract.

use std::io::{Read, Seek, Write};

use url::Url;

use crate::locality::BlockLocation;
use crate::path::LogicalPath;
use crate::status::FileStatus;
use crate::Result;

/// A writer that can force its bytes onto stable storage.
pub trait Syncable: Write {
    /// Flush buffered bytes and block until they are durable.
    fn sync(&mut self) -> std::io::Result<()>;

    /// Sync, then release the writer. Unlike dropping it, this reports
    /// a failed final sync.
    fn close(self) -> std::io::Result<()>
    where
        Self: Sized;
}

/// Options for [`FileSystem::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateOptions {
    pub overwrite: bool,
    pub buffer_size: usize,
    /// Create missing parent directories instead of failing.
    pub create_parent_dirs: bool,
    /// Permission bits applied to the new file; host default when `None`.
    pub permission: Option<u32>,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            buffer_size: 4096,
            create_parent_dirs: true,
            permission: None,
        }
    }
}

impl CreateOptions {
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    #[must_use]
    pub fn create_parent_dirs(mut self, create: bool) -> Self {
        self.create_parent_dirs = create;
        self
    }

    #[must_use]
    pub fn permission(mut self, permission: u32) -> Self {
        self.permission = Some(permission);
        self
    }
}

/// Operations compute frameworks use against a filesystem.
///
/// Paths are logical; relative paths resolve against the working directory.
/// Every returned [`FileStatus`] carries a logical path.
pub trait FileSystem: Send + Sync {
    type Reader: Read + Seek;
    type Writer: Syncable;

    /// The URI naming this filesystem.
    fn uri(&self) -> &Url;

    fn open(&self, path: &LogicalPath) -> Result<Self::Reader>;

    fn create(&self, path: &LogicalPath, options: CreateOptions) -> Result<Self::Writer>;

    fn append(&self, path: &LogicalPath, buffer_size: usize) -> Result<Self::Writer>;

    fn delete(&self, path: &LogicalPath, recursive: bool) -> Result<()>;

    fn rename(&self, src: &LogicalPath, dst: &LogicalPath) -> Result<()>;

    fn list_status(&self, path: &LogicalPath) -> Result<Vec<FileStatus>>;

    fn mkdirs(&self, path: &LogicalPath, permission: u32) -> Result<()>;

    fn get_file_status(&self, path: &LogicalPath) -> Result<FileStatus>;

    fn get_file_block_locations(
        &self,
        path: &LogicalPath,
        start: u64,
        length: u64,
    ) -> Result<Vec<BlockLocation>>;

    fn working_directory(&self) -> LogicalPath;

    fn set_working_directory(&self, path: &LogicalPath) -> Result<()>;

    fn default_block_size(&self) -> u64;

    fn exists(&self, path: &LogicalPath) -> Result<bool> {
        match self.get_file_status(path) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
