//! Session construction from a [`MountConfig`].

use std::sync::RwLock;
use std::time::Duration;

use mountfs_core::{
    EmbeddedLocality, Error, LocalityConfig, LocalitySource, MountConfig, MountRootProvider,
    NoLocality, PathMapper, Result, StaticMountRoot,
};
use mountfs_http::{RemoteLocality, ReqwestExecutor};
use mountfs_sys::{LocalFs, LocalityResolver, SidecarStore, XattrStore};

use crate::filesystem::MountFileSystem;

/// Assembles a [`MountFileSystem`].
///
/// By default the mount root comes from the configuration and the locality
/// source from [`MountConfig::locality`]. Either can be replaced, e.g. to
/// discover the root from `/proc/mounts` or to serve locality from a test
/// double.
pub struct MountFileSystemBuilder {
    config: MountConfig,
    mount_root: Option<Box<dyn MountRootProvider>>,
    source: Option<Box<dyn LocalitySource>>,
}

impl MountFileSystemBuilder {
    pub fn new(config: MountConfig) -> Self {
        Self {
            config,
            mount_root: None,
            source: None,
        }
    }

    #[must_use]
    pub fn mount_root_provider(mut self, provider: Box<dyn MountRootProvider>) -> Self {
        self.mount_root = Some(provider);
        self
    }

    #[must_use]
    pub fn locality_source(mut self, source: Box<dyn LocalitySource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn build(self) -> Result<MountFileSystem> {
        let mut config = self.config;
        config.validate()?;

        let provider = self
            .mount_root
            .unwrap_or_else(|| Box::new(StaticMountRoot(config.mount_root.clone())));
        let mapper = PathMapper::from_provider(provider.as_ref())?;
        config.mount_root = mapper.mount_root().to_path_buf();

        let source = match self.source {
            Some(source) => source,
            None => source_from_config(&config)?,
        };

        let uri = config.uri()?;
        let working_dir = config.initial_working_directory()?;
        tracing::info!(
            uri = %uri,
            mount_root = %mapper.mount_root().display(),
            working_dir = %working_dir,
            "mountfs session ready"
        );

        Ok(MountFileSystem {
            uri,
            local: LocalFs::new(mapper.clone(), config.block_size),
            resolver: LocalityResolver::new(mapper, source),
            working_dir: RwLock::new(working_dir),
            block_size: config.block_size,
        })
    }
}

fn source_from_config(config: &MountConfig) -> Result<Box<dyn LocalitySource>> {
    Ok(match &config.locality {
        LocalityConfig::Xattr { attribute } => {
            Box::new(EmbeddedLocality::new(XattrStore, attribute.clone()))
        }
        LocalityConfig::Sidecar { dir, attribute } => Box::new(EmbeddedLocality::new(
            SidecarStore::new(dir.clone()),
            attribute.clone(),
        )),
        LocalityConfig::Remote => {
            let peer = config
                .peer
                .as_ref()
                .ok_or_else(|| Error::invalid_config("remote locality requires a peer endpoint"))?;
            let timeout = config.request_timeout_secs.map(Duration::from_secs);
            let executor = ReqwestExecutor::new(timeout).map_err(Error::transport)?;
            Box::new(RemoteLocality::new(executor, peer)?)
        }
        LocalityConfig::None => Box::new(NoLocality),
    })
}
