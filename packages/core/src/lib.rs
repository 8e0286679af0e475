//! Core mountfs: path translation and locality records
//!
//! This layer holds everything that does not touch the host OS:
//! - `LogicalPath`: normalized path in the caller-visible namespace
//! - `PathMapper`: logical <-> physical translation under a mount root
//! - `MountConfig`: per-session configuration
//! - `BlockLocation`: byte-range to host-set records and their parser
//! - `FileSystem`: the logical filesystem contract the adapter implements
//!
//! # Example
//!
//! ```rust
//! use mountfs_core::{LogicalPath, PathMapper};
//!
//! let mapper = PathMapper::new("/data/mfs");
//! let logical = LogicalPath::parse("/users/a.txt").unwrap();
//! let physical = mapper.to_physical(&logical, &LogicalPath::root()).unwrap();
//! assert_eq!(physical, std::path::PathBuf::from("/data/mfs/users/a.txt"));
//! assert_eq!(mapper.to_logical(&physical), logical);
//! ```

mod config;
mod error;
mod filesystem;
pub mod locality;
mod mapper;
mod path;
mod status;

pub use config::{
    home_directory, LocalityConfig, MountConfig, PeerEndpoint, DEFAULT_BLOCK_SIZE,
    DEFAULT_LOCALITY_ATTRIBUTE, SCHEME,
};
pub use error::{Error, Result};
pub use filesystem::{CreateOptions, FileSystem, Syncable};
pub use locality::{
    BlockLocation, ByteRange, EmbeddedLocality, LocalitySource, MetadataStore, NoLocality,
    ResolvedFile,
};
pub use mapper::{MountRootProvider, PathMapper, StaticMountRoot};
pub use path::{LogicalPath, PathError};
pub use status::FileStatus;
