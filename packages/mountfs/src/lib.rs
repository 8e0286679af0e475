//! # mountfs
//!
//! Presents a distributed filesystem that is already mounted on the local
//! host (through FUSE or similar) as a [`FileSystem`] for compute
//! frameworks, with per-byte-range host locality so schedulers can place
//! tasks next to the data.
//!
//! ```no_run
//! use std::io::Write;
//!
//! use mountfs::MountFileSystem;
//! use mountfs_core::{CreateOptions, FileSystem, LogicalPath, Syncable};
//!
//! # fn main() -> mountfs_core::Result<()> {
//! let fs = MountFileSystem::from_uri("mfs://localhost:9000/data/mfs")?;
//! let path = LogicalPath::parse("/users/a.txt")?;
//!
//! let mut out = fs.create(&path, CreateOptions::default())?;
//! out.write_all(b"hello")?;
//! out.sync()?;
//!
//! for block in fs.get_file_block_locations(&path, 0, 5)? {
//!     println!("{}+{} on {:?}", block.offset, block.length, block.hosts);
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
mod filesystem;

pub use builder::MountFileSystemBuilder;
pub use filesystem::MountFileSystem;

pub use mountfs_core::FileSystem;
