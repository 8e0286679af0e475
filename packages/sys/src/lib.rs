//! # mountfs-sys
//!
//! Host OS primitives behind the mountfs adapter.
//!
//! - [`DurableWriter`]: buffered writes with fsync on `sync` and `close`
//! - [`LocalFs`]: physical-path file operations with typed errors
//! - [`XattrStore`] / [`SidecarStore`]: where embedded locality metadata lives
//! - [`LocalityResolver`]: symlink-escape guard in front of a locality source
//! - [`ProcMountsRoot`]: mount-root discovery from the kernel mount table
//!
//! ## Example
//!
//! ```rust,ignore
//! use mountfs_core::{EmbeddedLocality, PathMapper};
//! use mountfs_sys::{LocalityResolver, XattrStore};
//!
//! let mapper = PathMapper::new("/data/mfs");
//! let source = EmbeddedLocality::new(XattrStore, "user.mfs.blockLocs");
//! let resolver = LocalityResolver::new(mapper, Box::new(source));
//!
//! let locations = resolver.resolve("/data/mfs/users/a.txt".as_ref(), 0, 1 << 20)?;
//! ```

pub mod fs;
pub mod metadata;
pub mod mounts;
pub mod resolver;
pub mod writer;

pub use fs::LocalFs;
pub use metadata::{SidecarStore, XattrStore};
pub use mounts::ProcMountsRoot;
pub use resolver::LocalityResolver;
pub use writer::{DurableWriter, MIN_BUFFER_SIZE};
