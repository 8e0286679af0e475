//! Session configuration.
//!
//! A `MountConfig` is built once per session and never mutated. It can be
//! written in code, read from JSON, or derived from a filesystem URI of the
//! form `mfs://<host>:<port>/<mount/root>`:
//!
//! ```json
//! {
//!     "mount_root": "/data/mfs",
//!     "peer": "localhost:1103",
//!     "locality": {"type": "remote"}
//! }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::path::LogicalPath;
use crate::{Error, Result};

/// Block size reported to callers unless configured otherwise.
pub const DEFAULT_BLOCK_SIZE: u64 = 64 * 1024 * 1024;

/// Extended attribute carrying embedded locality records.
pub const DEFAULT_LOCALITY_ATTRIBUTE: &str = "user.mfs.blockLocs";

/// URI scheme of the logical namespace.
pub const SCHEME: &str = "mfs";

fn default_attribute() -> String {
    DEFAULT_LOCALITY_ATTRIBUTE.to_string()
}

fn default_block_size() -> u64 {
    DEFAULT_BLOCK_SIZE
}

/// Address of the peer daemon that answers metadata queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerEndpoint {
    pub host: String,
    pub port: u16,
}

impl PeerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Base URL of the peer's HTTP endpoint.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

impl fmt::Display for PeerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for PeerEndpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::invalid_config(format!("peer '{}' is not host:port", s)))?;
        if host.is_empty() {
            return Err(Error::invalid_config(format!("peer '{}' has no host", s)));
        }
        let port = port
            .parse::<u16>()
            .map_err(|e| Error::invalid_config(format!("peer '{}' has a bad port: {}", s, e)))?;
        Ok(Self::new(host, port))
    }
}

impl TryFrom<String> for PeerEndpoint {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<PeerEndpoint> for String {
    fn from(peer: PeerEndpoint) -> Self {
        peer.to_string()
    }
}

/// Where block-locality records come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LocalityConfig {
    /// Extended attribute on each physical file.
    Xattr {
        #[serde(default = "default_attribute")]
        attribute: String,
    },
    /// Sidecar files under `dir`, one per physical file and attribute.
    Sidecar {
        dir: PathBuf,
        #[serde(default = "default_attribute")]
        attribute: String,
    },
    /// The peer's `blockLocations` endpoint.
    Remote,
    /// No locality information; every query answers empty.
    None,
}

impl Default for LocalityConfig {
    fn default() -> Self {
        LocalityConfig::Xattr {
            attribute: default_attribute(),
        }
    }
}

/// Configuration for one filesystem session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountConfig {
    /// Physical prefix of the managed tree. Empty means passthrough.
    #[serde(default)]
    pub mount_root: PathBuf,
    #[serde(default)]
    pub peer: Option<PeerEndpoint>,
    #[serde(default)]
    pub locality: LocalityConfig,
    /// Initial working directory; defaults to the caller's home directory.
    #[serde(default)]
    pub working_directory: Option<String>,
    #[serde(default = "default_block_size")]
    pub block_size: u64,
    /// Timeout applied by the remote transport. None waits indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl MountConfig {
    pub fn new(mount_root: impl Into<PathBuf>) -> Self {
        Self {
            mount_root: mount_root.into(),
            peer: None,
            locality: LocalityConfig::default(),
            working_directory: None,
            block_size: DEFAULT_BLOCK_SIZE,
            request_timeout_secs: None,
        }
    }

    #[must_use]
    pub fn with_peer(mut self, peer: PeerEndpoint) -> Self {
        self.peer = Some(peer);
        self
    }

    #[must_use]
    pub fn with_locality(mut self, locality: LocalityConfig) -> Self {
        self.locality = locality;
        self
    }

    #[must_use]
    pub fn with_working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MountConfig = serde_json::from_str(json)
            .map_err(|e| Error::invalid_config(format!("bad JSON configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Derive a configuration from `mfs://<host>:<port>/<mount/root>`.
    ///
    /// The URI path becomes the mount root. When a port is present the
    /// host:port becomes the peer and locality is served remotely.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let url = Url::parse(uri)
            .map_err(|e| Error::invalid_config(format!("bad filesystem URI '{}': {}", uri, e)))?;
        if url.scheme() != SCHEME {
            return Err(Error::invalid_config(format!(
                "unsupported scheme '{}', expected '{}'",
                url.scheme(),
                SCHEME
            )));
        }
        if !url.path().starts_with('/') {
            return Err(Error::invalid_config("mount point must be absolute"));
        }

        let root = percent_decode_str(url.path())
            .decode_utf8()
            .map_err(|e| Error::invalid_config(format!("mount point in '{}' is not UTF-8: {}", uri, e)))?;
        let mut config = MountConfig::new(root.into_owned());
        if let (Some(host), Some(port)) = (url.host_str(), url.port()) {
            config.peer = Some(PeerEndpoint::new(host, port));
            config.locality = LocalityConfig::Remote;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.mount_root.as_os_str().is_empty() && !self.mount_root.is_absolute() {
            return Err(Error::invalid_config(format!(
                "mount root must be absolute, got {}",
                self.mount_root.display()
            )));
        }
        if self.locality == LocalityConfig::Remote && self.peer.is_none() {
            return Err(Error::invalid_config(
                "remote locality requires a peer endpoint",
            ));
        }
        if self.block_size == 0 {
            return Err(Error::invalid_config("block size must be positive"));
        }
        if let Some(dir) = &self.working_directory {
            if !dir.starts_with('/') {
                return Err(Error::invalid_config(format!(
                    "working directory must be absolute, got {}",
                    dir
                )));
            }
        }
        Ok(())
    }

    /// The URI callers use to name this filesystem.
    pub fn uri(&self) -> Result<Url> {
        let authority = self
            .peer
            .as_ref()
            .map(PeerEndpoint::to_string)
            .unwrap_or_else(|| "localhost".to_string());
        let root = self.mount_root.to_string_lossy();
        let path = if root.is_empty() { "/" } else { root.as_ref() };
        Url::parse(&format!("{}://{}{}", SCHEME, authority, path))
            .map_err(|e| Error::invalid_config(format!("cannot form filesystem URI: {}", e)))
    }

    /// The working directory a new session starts in.
    pub fn initial_working_directory(&self) -> Result<LogicalPath> {
        match &self.working_directory {
            Some(dir) => Ok(LogicalPath::parse(dir)?),
            None => Ok(home_directory()),
        }
    }
}

/// `/user/<name>` for the current user, or `/` when it is unknown.
pub fn home_directory() -> LogicalPath {
    match std::env::var("USER") {
        Ok(user) if !user.is_empty() && !user.contains('/') => {
            LogicalPath::root().child("user").child(&user)
        }
        _ => LogicalPath::root(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_parses_host_port() {
        let peer: PeerEndpoint = "localhost:1103".parse().unwrap();
        assert_eq!(peer, PeerEndpoint::new("localhost", 1103));
        assert_eq!(peer.base_url(), "http://localhost:1103/");
    }

    #[test]
    fn peer_rejects_missing_port() {
        assert!("localhost".parse::<PeerEndpoint>().is_err());
        assert!("localhost:http".parse::<PeerEndpoint>().is_err());
        assert!(":80".parse::<PeerEndpoint>().is_err());
    }

    #[test]
    fn json_defaults() {
        let config = MountConfig::from_json_str(r#"{"mount_root": "/data/mfs"}"#).unwrap();
        assert_eq!(config.mount_root, PathBuf::from("/data/mfs"));
        assert_eq!(config.peer, None);
        assert_eq!(config.locality, LocalityConfig::default());
        assert_eq!(config.block_size, DEFAULT_BLOCK_SIZE);
    }

    #[test]
    fn json_remote_locality() {
        let config = MountConfig::from_json_str(
            r#"{"mount_root": "/data/mfs", "peer": "node1:1103", "locality": {"type": "remote"}}"#,
        )
        .unwrap();
        assert_eq!(config.peer, Some(PeerEndpoint::new("node1", 1103)));
        assert_eq!(config.locality, LocalityConfig::Remote);
    }

    #[test]
    fn json_sidecar_locality() {
        let config = MountConfig::from_json_str(
            r#"{"mount_root": "/data/mfs", "locality": {"type": "sidecar", "dir": "/var/lib/mfs"}}"#,
        )
        .unwrap();
        assert_eq!(
            config.locality,
            LocalityConfig::Sidecar {
                dir: PathBuf::from("/var/lib/mfs"),
                attribute: DEFAULT_LOCALITY_ATTRIBUTE.to_string(),
            }
        );
    }

    #[test]
    fn remote_without_peer_rejected() {
        let result =
            MountConfig::from_json_str(r#"{"mount_root": "/data", "locality": {"type": "remote"}}"#);
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn relative_mount_root_rejected() {
        let result = MountConfig::from_json_str(r#"{"mount_root": "data/mfs"}"#);
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn from_uri_with_port() {
        let config = MountConfig::from_uri("mfs://localhost:1103/data/mfs").unwrap();
        assert_eq!(config.mount_root, PathBuf::from("/data/mfs"));
        assert_eq!(config.peer, Some(PeerEndpoint::new("localhost", 1103)));
        assert_eq!(config.locality, LocalityConfig::Remote);
    }

    #[test]
    fn from_uri_without_port_keeps_default_locality() {
        let config = MountConfig::from_uri("mfs://localhost/data/mfs").unwrap();
        assert_eq!(config.peer, None);
        assert_eq!(config.locality, LocalityConfig::default());
    }

    #[test]
    fn from_uri_decodes_escaped_mount_point() {
        let config = MountConfig::from_uri("mfs://localhost:1103/data/my%20mfs").unwrap();
        assert_eq!(config.mount_root, PathBuf::from("/data/my mfs"));
        assert_eq!(config.uri().unwrap().as_str(), "mfs://localhost:1103/data/my%20mfs");
    }

    #[test]
    fn from_uri_rejects_non_utf8_mount_point() {
        let result = MountConfig::from_uri("mfs://localhost:1103/data/%FF");
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn from_uri_rejects_other_scheme() {
        let result = MountConfig::from_uri("hdfs://namenode:8020/data");
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn uri_round_trip() {
        let config = MountConfig::from_uri("mfs://localhost:1103/data/mfs").unwrap();
        assert_eq!(config.uri().unwrap().as_str(), "mfs://localhost:1103/data/mfs");
    }

    #[test]
    fn configured_working_directory() {
        let config = MountConfig::new("/data").with_working_directory("/jobs/7");
        assert_eq!(
            config.initial_working_directory().unwrap(),
            LogicalPath::parse("/jobs/7").unwrap()
        );
    }

    #[test]
    fn relative_working_directory_rejected() {
        let config = MountConfig::new("/data").with_working_directory("jobs");
        assert!(config.validate().is_err());
    }
}
