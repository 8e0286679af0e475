//! Mount-root discovery through the peer daemon.

use std::path::PathBuf;

use mountfs_core::{Error as CoreError, MountRootProvider, PeerEndpoint, Result};

use crate::client::PeerClient;
use crate::executor::HttpExecutor;

const MOUNT_POINT: &str = "mountPoint";

/// Asks the peer daemon where it mounted the filesystem:
/// `GET /mountPoint`, answered with the path as plain text.
pub struct RemoteMountRoot<E> {
    client: PeerClient<E>,
}

impl<E: HttpExecutor> RemoteMountRoot<E> {
    pub fn new(executor: E, peer: &PeerEndpoint) -> Result<Self> {
        Ok(Self {
            client: PeerClient::new(executor, peer)?,
        })
    }
}

impl<E: HttpExecutor> MountRootProvider for RemoteMountRoot<E> {
    fn mount_root(&self) -> Result<PathBuf> {
        let response = self.client.get(MOUNT_POINT, &[])?;
        let root = response.body.trim();
        if !root.starts_with('/') {
            return Err(CoreError::invalid_config(format!(
                "peer {} reported a non-absolute mount point {:?}",
                self.client.base(),
                root
            )));
        }
        Ok(PathBuf::from(root))
    }
}
