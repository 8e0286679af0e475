//! Logical paths in the caller-visible namespace.

use std::fmt;
use std::str::FromStr;

/// Errors related to logical path parsing and resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path string was empty.
    Empty,
    /// A `..` component would climb above the root.
    EscapesRoot { path: String },
    /// A component contains a byte the host filesystem cannot store.
    InvalidComponent { component: String, position: usize },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Empty => write!(f, "empty path"),
            PathError::EscapesRoot { path } => {
                write!(f, "path '{}' climbs above the root", path)
            }
            PathError::InvalidComponent {
                component,
                position,
            } => write!(
                f,
                "invalid path component {:?} at position {}",
                component, position
            ),
        }
    }
}

impl std::error::Error for PathError {}

/// A normalized logical path.
///
/// Logical paths are what callers of the adapter see. They are either
/// absolute (`/users/a.txt`) or relative to the session working directory
/// (`a.txt`). Parsing normalizes the string:
///
/// - empty components are dropped (`//` and trailing `/`)
/// - `.` components are dropped
/// - `..` pops the previous component
///
/// An absolute path whose `..` would climb above `/` is rejected. A relative
/// path may keep leading `..` components; they are resolved when the path is
/// joined onto a base with [`LogicalPath::join`].
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct LogicalPath {
    absolute: bool,
    components: Vec<String>,
}

impl LogicalPath {
    /// Parse and normalize a path string.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mountfs_core::LogicalPath;
    ///
    /// let path = LogicalPath::parse("/users//a/./b/").unwrap();
    /// assert_eq!(path.to_string(), "/users/a/b");
    ///
    /// assert!(LogicalPath::parse("/..").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }

        let absolute = s.starts_with('/');
        let mut components: Vec<String> = Vec::new();

        for (i, component) in s.split('/').enumerate() {
            match component {
                "" | "." => {}
                ".." => match components.last().map(String::as_str) {
                    Some("..") | None if !absolute => components.push("..".to_string()),
                    Some(_) => {
                        components.pop();
                    }
                    None => {
                        return Err(PathError::EscapesRoot {
                            path: s.to_string(),
                        })
                    }
                },
                other => {
                    if other.contains('\0') {
                        return Err(PathError::InvalidComponent {
                            component: other.to_string(),
                            position: i,
                        });
                    }
                    components.push(other.to_string());
                }
            }
        }

        Ok(Self {
            absolute,
            components,
        })
    }

    /// Build from already-normalized components.
    pub(crate) fn from_parts(absolute: bool, components: Vec<String>) -> Self {
        Self {
            absolute,
            components,
        }
    }

    /// The absolute root path `/`.
    pub fn root() -> Self {
        Self {
            absolute: true,
            components: Vec::new(),
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Check if this is the absolute root `/`.
    pub fn is_root(&self) -> bool {
        self.absolute && self.components.is_empty()
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Get the number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// The final component, if any.
    pub fn name(&self) -> Option<&str> {
        self.components
            .last()
            .map(String::as_str)
            .filter(|c| *c != "..")
    }

    /// The parent path, or `None` for the root and for empty relative paths.
    #[must_use]
    pub fn parent(&self) -> Option<LogicalPath> {
        self.name()?;
        let mut components = self.components.clone();
        components.pop();
        Some(Self {
            absolute: self.absolute,
            components,
        })
    }

    /// Append a single child component.
    #[must_use]
    pub fn child(&self, name: &str) -> LogicalPath {
        let mut components = self.components.clone();
        components.push(name.to_string());
        Self {
            absolute: self.absolute,
            components,
        }
    }

    /// Resolve `other` against this path.
    ///
    /// An absolute `other` is returned unchanged. A relative `other` is
    /// appended, resolving any leading `..` against this path.
    pub fn join(&self, other: &LogicalPath) -> Result<LogicalPath, PathError> {
        if other.absolute {
            return Ok(other.clone());
        }

        let mut components = self.components.clone();
        for component in &other.components {
            if component == ".." {
                match components.last().map(String::as_str) {
                    Some("..") | None if !self.absolute => components.push("..".to_string()),
                    Some(_) => {
                        components.pop();
                    }
                    None => {
                        return Err(PathError::EscapesRoot {
                            path: format!("{}/{}", self, other),
                        })
                    }
                }
            } else {
                components.push(component.clone());
            }
        }

        Ok(Self {
            absolute: self.absolute,
            components,
        })
    }

    /// Check if this path has the given prefix, component-wise.
    pub fn starts_with(&self, prefix: &LogicalPath) -> bool {
        self.absolute == prefix.absolute
            && prefix.components.len() <= self.components.len()
            && prefix.components == self.components[..prefix.components.len()]
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.absolute, self.components.is_empty()) {
            (true, _) => write!(f, "/{}", self.components.join("/")),
            (false, true) => write!(f, "."),
            (false, false) => write!(f, "{}", self.components.join("/")),
        }
    }
}

impl FromStr for LogicalPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Macro for creating logical paths from literals.
///
/// # Example
///
/// ```rust
/// use mountfs_core::logical;
///
/// let p = logical!("/users/a.txt");
/// assert_eq!(p.len(), 2);
/// ```
#[macro_export]
macro_rules! logical {
    ($s:expr) => {
        $crate::LogicalPath::parse($s).expect("invalid path literal")
    };
}
