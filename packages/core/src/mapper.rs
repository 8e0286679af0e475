//! Translation between the logical and the physical path space.
//!
//! Every logical path lives under a mount root on the host: `/users/a.txt`
//! under `/data/mfs` is `/data/mfs/users/a.txt`. The mapper does no OS
//! access; symlink containment is checked by the locality resolver.

use std::path::{Component, Path, PathBuf};

use crate::path::{LogicalPath, PathError};
use crate::{Error, Result};

/// Source of the mount root for a session.
///
/// Deployments discover the mount root differently: some configure it
/// statically, some ask the local kernel mount table, some ask the peer
/// daemon. Each strategy implements this trait and the session builds its
/// [`PathMapper`] from whichever one it was given.
pub trait MountRootProvider: Send + Sync {
    fn mount_root(&self) -> Result<PathBuf>;
}

/// A mount root fixed at configuration time.
#[derive(Debug, Clone)]
pub struct StaticMountRoot(pub PathBuf);

impl MountRootProvider for StaticMountRoot {
    fn mount_root(&self) -> Result<PathBuf> {
        Ok(self.0.clone())
    }
}

/// Maps logical paths onto a physical mount root and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapper {
    mount_root: PathBuf,
}

impl PathMapper {
    /// Create a mapper for `mount_root`.
    ///
    /// An empty root is a passthrough: physical paths equal logical ones.
    /// Redundant separators in the root are normalized away.
    pub fn new(mount_root: impl AsRef<Path>) -> Self {
        Self {
            mount_root: mount_root.as_ref().components().collect(),
        }
    }

    /// Create a mapper from a provider, validating the root it returns.
    pub fn from_provider(provider: &dyn MountRootProvider) -> Result<Self> {
        let root = provider.mount_root()?;
        if !root.as_os_str().is_empty() && !root.is_absolute() {
            return Err(Error::invalid_config(format!(
                "mount root must be absolute, got {}",
                root.display()
            )));
        }
        tracing::debug!(mount_root = %root.display(), "mount root resolved");
        Ok(Self::new(root))
    }

    pub fn mount_root(&self) -> &Path {
        &self.mount_root
    }

    /// Resolve `logical` against `working_dir` into an absolute logical path.
    pub fn resolve(
        &self,
        logical: &LogicalPath,
        working_dir: &LogicalPath,
    ) -> std::result::Result<LogicalPath, PathError> {
        if logical.is_absolute() {
            return Ok(logical.clone());
        }
        let base = if working_dir.is_absolute() {
            working_dir.clone()
        } else {
            LogicalPath::root().join(working_dir)?
        };
        base.join(logical)
    }

    /// Map a logical path to its physical location under the mount root.
    pub fn to_physical(
        &self,
        logical: &LogicalPath,
        working_dir: &LogicalPath,
    ) -> std::result::Result<PathBuf, PathError> {
        let absolute = self.resolve(logical, working_dir)?;
        Ok(self.physical_of(&absolute))
    }

    /// Map an already-absolute logical path to its physical location.
    pub fn physical_of(&self, absolute: &LogicalPath) -> PathBuf {
        let mut physical = if self.mount_root.as_os_str().is_empty() {
            PathBuf::from("/")
        } else {
            self.mount_root.clone()
        };
        for component in absolute.components() {
            physical.push(component);
        }
        physical
    }

    /// Map a physical path back into the logical namespace.
    ///
    /// Paths under the mount root lose exactly that prefix and are re-rooted
    /// at `/`. Paths outside it are returned unchanged.
    pub fn to_logical(&self, physical: &Path) -> LogicalPath {
        let relative = if self.mount_root.as_os_str().is_empty() {
            physical
        } else {
            physical.strip_prefix(&self.mount_root).unwrap_or(physical)
        };
        logical_from_components(relative)
    }

    /// The physical path relative to the mount root, without leading
    /// separators, as the remote metadata service expects it.
    ///
    /// Returns `None` if the path is not under the mount root.
    pub fn mount_relative(&self, physical: &Path) -> Option<String> {
        if !self.contains(physical) {
            return None;
        }
        let relative = physical.strip_prefix(&self.mount_root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Some(parts.join("/"))
    }

    /// Check if `physical` lies under the mount root, component-wise.
    pub fn contains(&self, physical: &Path) -> bool {
        self.mount_root.as_os_str().is_empty() || physical.starts_with(&self.mount_root)
    }
}

fn logical_from_components(path: &Path) -> LogicalPath {
    let mut components: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => components.push(s.to_string_lossy().into_owned()),
            Component::ParentDir => {
                components.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    LogicalPath::from_parts(true, components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical;

    fn wd() -> LogicalPath {
        LogicalPath::root()
    }

    #[test]
    fn maps_absolute_under_root() {
        let mapper = PathMapper::new("/data/mfs");
        let physical = mapper.to_physical(&logical!("/users/a.txt"), &wd()).unwrap();
        assert_eq!(physical, PathBuf::from("/data/mfs/users/a.txt"));
    }

    #[test]
    fn relative_joins_working_dir() {
        let mapper = PathMapper::new("/data/mfs");
        let physical = mapper
            .to_physical(&logical!("a.txt"), &logical!("/user/alice"))
            .unwrap();
        assert_eq!(physical, PathBuf::from("/data/mfs/user/alice/a.txt"));
    }

    #[test]
    fn relative_equals_joined_absolute() {
        let mapper = PathMapper::new("/data/mfs");
        let cases = [
            ("a.txt", "/user/alice"),
            ("x/y/", "/"),
            ("../bob/z", "/user/alice"),
            (".", "/tmp"),
        ];
        for (p, w) in cases {
            let p = logical!(p);
            let w = logical!(w);
            let joined = w.join(&p).unwrap();
            assert_eq!(
                mapper.to_physical(&p, &w).unwrap(),
                mapper.to_physical(&joined, &wd()).unwrap(),
                "mismatch for {} in {}",
                p,
                w
            );
        }
    }

    #[test]
    fn round_trips_for_all_roots() {
        let roots = ["/data/mfs", "/data/mfs/", "", "/"];
        let paths = ["/", "/users/a.txt", "/users/dir/", "//a//b", "/a/./b/../c"];
        for root in roots {
            let mapper = PathMapper::new(root);
            for p in paths {
                let logical = logical!(p);
                let physical = mapper.to_physical(&logical, &wd()).unwrap();
                assert_eq!(
                    mapper.to_logical(&physical),
                    logical,
                    "round trip failed for {} under {:?}",
                    p,
                    root
                );
            }
        }
    }

    #[test]
    fn empty_root_is_passthrough() {
        let mapper = PathMapper::new("");
        let physical = mapper.to_physical(&logical!("/etc/hosts"), &wd()).unwrap();
        assert_eq!(physical, PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn to_logical_outside_mount_unchanged() {
        let mapper = PathMapper::new("/data/mfs");
        assert_eq!(mapper.to_logical(Path::new("/etc/passwd")), logical!("/etc/passwd"));
    }

    #[test]
    fn to_logical_is_component_wise() {
        let mapper = PathMapper::new("/data/mfs");
        assert_eq!(
            mapper.to_logical(Path::new("/data/mfs2/x")),
            logical!("/data/mfs2/x")
        );
        assert_eq!(mapper.to_logical(Path::new("/data/mfs")), LogicalPath::root());
    }

    #[test]
    fn mount_relative_strips_leading_separators() {
        let mapper = PathMapper::new("/data/mfs");
        assert_eq!(
            mapper.mount_relative(Path::new("/data/mfs/users/a.txt")),
            Some("users/a.txt".to_string())
        );
        assert_eq!(mapper.mount_relative(Path::new("/data/mfs")), Some(String::new()));
        assert_eq!(mapper.mount_relative(Path::new("/etc/passwd")), None);
    }

    #[test]
    fn mount_relative_with_empty_root() {
        let mapper = PathMapper::new("");
        assert_eq!(
            mapper.mount_relative(Path::new("/users/a.txt")),
            Some("users/a.txt".to_string())
        );
    }

    #[test]
    fn dotdot_escape_is_rejected_before_mapping() {
        let mapper = PathMapper::new("/data/mfs");
        let result = mapper.to_physical(&logical!("../../etc"), &logical!("/user"));
        assert!(result.is_err());
    }

    #[test]
    fn from_provider_rejects_relative_root() {
        let result = PathMapper::from_provider(&StaticMountRoot(PathBuf::from("data/mfs")));
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn from_provider_accepts_empty_root() {
        let mapper = PathMapper::from_provider(&StaticMountRoot(PathBuf::new())).unwrap();
        assert!(mapper.contains(Path::new("/anything")));
    }
}
