use std::time::SystemTime;

use crate::path::LogicalPath;

/// Metadata for one file or directory, as reported to callers.
///
/// `path` is always logical: the adapter rewrites every status it returns so
/// callers never observe the physical mount root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub path: LogicalPath,
    pub length: u64,
    pub is_dir: bool,
    pub modification_time: SystemTime,
    pub access_time: SystemTime,
    /// Permission bits (`mode & 0o7777`), returned as the host reports them.
    pub permission: u32,
    pub owner: String,
    pub group: String,
    pub block_size: u64,
    /// Always 1; replicas are managed by the underlying store.
    pub replication: u16,
}

impl FileStatus {
    pub fn is_file(&self) -> bool {
        !self.is_dir
    }

    /// The same status with its path replaced.
    #[must_use]
    pub fn with_path(mut self, path: LogicalPath) -> Self {
        self.path = path;
        self
    }
}
