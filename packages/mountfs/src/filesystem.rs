use std::fs::File;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use mountfs_core::{
    BlockLocation, CreateOptions, FileStatus, FileSystem, LogicalPath, MountConfig, PathMapper,
    Result,
};
use mountfs_sys::{DurableWriter, LocalFs, LocalityResolver};
use url::Url;

use crate::builder::MountFileSystemBuilder;

/// A locally mounted filesystem presented through the [`FileSystem`]
/// contract.
///
/// Logical paths are mapped under the mount root and handed to the host
/// OS; statuses come back with the mount root stripped. Block locations
/// come from the configured locality source, behind a guard that refuses
/// files whose symlinks lead out of the mount.
pub struct MountFileSystem {
    pub(crate) uri: Url,
    pub(crate) local: LocalFs,
    pub(crate) resolver: LocalityResolver,
    pub(crate) working_dir: RwLock<LogicalPath>,
    pub(crate) block_size: u64,
}

impl MountFileSystem {
    /// Open a session with the mount root and locality source the
    /// configuration names.
    pub fn new(config: MountConfig) -> Result<Self> {
        MountFileSystemBuilder::new(config).build()
    }

    /// Open a session from `mfs://<host>:<port>/<mount/root>`.
    pub fn from_uri(uri: &str) -> Result<Self> {
        Self::new(MountConfig::from_uri(uri)?)
    }

    pub fn builder(config: MountConfig) -> MountFileSystemBuilder {
        MountFileSystemBuilder::new(config)
    }

    pub fn mapper(&self) -> &PathMapper {
        self.local.mapper()
    }

    /// Physical location of `path`, resolved against the working directory.
    pub fn to_physical(&self, path: &LogicalPath) -> Result<PathBuf> {
        let working_dir = self.working_directory();
        let physical = self.mapper().to_physical(path, &working_dir)?;
        tracing::debug!(logical = %path, physical = %physical.display(), "mapped path");
        Ok(physical)
    }

    /// `path` as a fully qualified URI in this filesystem's scheme and
    /// authority, e.g. `mfs://localhost:9000/users/a.txt`.
    pub fn make_qualified(&self, path: &LogicalPath) -> Result<Url> {
        let working_dir = self.working_directory();
        let absolute = self.mapper().resolve(path, &working_dir)?;
        let mut url = self.uri.clone();
        url.set_path(&absolute.to_string());
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }

    /// Block locations as a scheduling hint.
    ///
    /// Unlike [`FileSystem::get_file_block_locations`], failures are logged
    /// and answered with an empty list, for callers that can run without
    /// locality.
    pub fn block_location_hints(&self, path: &LogicalPath, start: u64, length: u64) -> Vec<BlockLocation> {
        match self.get_file_block_locations(path, start, length) {
            Ok(locations) => locations,
            Err(e) => {
                tracing::warn!(path = %path, start, length, error = %e, "block locality unavailable");
                Vec::new()
            }
        }
    }
}

impl FileSystem for MountFileSystem {
    type Reader = File;
    type Writer = DurableWriter;

    fn uri(&self) -> &Url {
        &self.uri
    }

    fn open(&self, path: &LogicalPath) -> Result<File> {
        self.local.open(&self.to_physical(path)?)
    }

    fn create(&self, path: &LogicalPath, options: CreateOptions) -> Result<DurableWriter> {
        self.local.create(&self.to_physical(path)?, &options)
    }

    fn append(&self, path: &LogicalPath, buffer_size: usize) -> Result<DurableWriter> {
        self.local.append(&self.to_physical(path)?, buffer_size)
    }

    fn delete(&self, path: &LogicalPath, recursive: bool) -> Result<()> {
        self.local.delete(&self.to_physical(path)?, recursive)
    }

    fn rename(&self, src: &LogicalPath, dst: &LogicalPath) -> Result<()> {
        self.local
            .rename(&self.to_physical(src)?, &self.to_physical(dst)?)
    }

    fn list_status(&self, path: &LogicalPath) -> Result<Vec<FileStatus>> {
        self.local.list(&self.to_physical(path)?)
    }

    fn mkdirs(&self, path: &LogicalPath, permission: u32) -> Result<()> {
        self.local.mkdirs(&self.to_physical(path)?, permission)
    }

    fn get_file_status(&self, path: &LogicalPath) -> Result<FileStatus> {
        self.local.stat(&self.to_physical(path)?)
    }

    fn get_file_block_locations(
        &self,
        path: &LogicalPath,
        start: u64,
        length: u64,
    ) -> Result<Vec<BlockLocation>> {
        self.resolver
            .resolve(&self.to_physical(path)?, start, length)
    }

    fn working_directory(&self) -> LogicalPath {
        self.working_dir
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_working_directory(&self, path: &LogicalPath) -> Result<()> {
        let mut working_dir = self
            .working_dir
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let resolved = self.mapper().resolve(path, &working_dir)?;
        tracing::debug!(from = %*working_dir, to = %resolved, "working directory changed");
        *working_dir = resolved;
        Ok(())
    }

    fn default_block_size(&self) -> u64 {
        self.block_size
    }
}
