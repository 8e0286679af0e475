//! # mountfs-http
//!
//! Queries against the peer daemon that runs next to each mount.
//!
//! - [`RemoteLocality`]: a [`LocalitySource`](mountfs_core::LocalitySource)
//!   backed by `GET /blockLocations`
//! - [`RemoteMountRoot`]: a [`MountRootProvider`](mountfs_core::MountRootProvider)
//!   backed by `GET /mountPoint`
//!
//! Both go through an [`HttpExecutor`], so tests can swap the network out.
//!
//! ```ignore
//! use mountfs_core::PeerEndpoint;
//! use mountfs_http::{RemoteLocality, ReqwestExecutor};
//!
//! let peer: PeerEndpoint = "localhost:9000".parse()?;
//! let source = RemoteLocality::new(ReqwestExecutor::without_timeout()?, &peer)?;
//! ```

pub mod client;
pub mod error;
pub mod executor;
pub mod locality;
pub mod mount_root;
pub mod types;

pub use client::PeerClient;
pub use error::Error;
pub use executor::{HttpExecutor, ReqwestExecutor};
pub use locality::RemoteLocality;
pub use mount_root::RemoteMountRoot;
pub use types::{HttpRequest, HttpResponse, Method};
