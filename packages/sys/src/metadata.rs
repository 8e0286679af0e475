//! Stores for named per-file metadata blobs.
//!
//! Embedded locality records travel as a named blob attached to each
//! physical file. Where the filesystem supports user extended attributes the
//! blob is an xattr; elsewhere it lives in a sidecar tree.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use mountfs_core::{Error, MetadataStore, Result};

/// Native extended attributes, read with `getxattr(2)`.
///
/// A missing attribute, or a filesystem without xattr support, reads as
/// `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XattrStore;

impl MetadataStore for XattrStore {
    fn read(&self, path: &Path, name: &str) -> Result<Option<Vec<u8>>> {
        xattr::get(path, name).map_err(|e| Error::from_io(e, path))
    }
}

impl XattrStore {
    /// Set an attribute. Used by tooling that publishes locality records.
    pub fn write(&self, path: &Path, name: &str, value: &[u8]) -> Result<()> {
        xattr::set(path, name, value).map_err(|e| Error::from_io(e, path))
    }
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
mod xattr {
    use std::ffi::CString;
    use std::io;
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    fn cstrings(path: &Path, name: &str) -> io::Result<(CString, CString)> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let c_name =
            CString::new(name).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        Ok((c_path, c_name))
    }

    #[cfg(target_os = "linux")]
    unsafe fn getxattr(
        path: &CString,
        name: &CString,
        value: *mut libc::c_void,
        size: usize,
    ) -> libc::ssize_t {
        libc::getxattr(path.as_ptr(), name.as_ptr(), value, size)
    }

    #[cfg(target_os = "macos")]
    unsafe fn getxattr(
        path: &CString,
        name: &CString,
        value: *mut libc::c_void,
        size: usize,
    ) -> libc::ssize_t {
        libc::getxattr(path.as_ptr(), name.as_ptr(), value, size, 0, 0)
    }

    #[cfg(target_os = "linux")]
    unsafe fn setxattr(path: &CString, name: &CString, value: &[u8]) -> libc::c_int {
        libc::setxattr(
            path.as_ptr(),
            name.as_ptr(),
            value.as_ptr() as *const libc::c_void,
            value.len(),
            0,
        )
    }

    #[cfg(target_os = "macos")]
    unsafe fn setxattr(path: &CString, name: &CString, value: &[u8]) -> libc::c_int {
        libc::setxattr(
            path.as_ptr(),
            name.as_ptr(),
            value.as_ptr() as *const libc::c_void,
            value.len(),
            0,
            0,
        )
    }

    #[cfg(target_os = "linux")]
    const NO_ATTR: i32 = libc::ENODATA;
    #[cfg(target_os = "macos")]
    const NO_ATTR: i32 = libc::ENOATTR;

    fn is_absent(error: &io::Error) -> bool {
        matches!(
            error.raw_os_error(),
            Some(code) if code == NO_ATTR || code == libc::ENOTSUP || code == libc::EOPNOTSUPP
        )
    }

    pub(super) fn get(path: &Path, name: &str) -> io::Result<Option<Vec<u8>>> {
        let (c_path, c_name) = cstrings(path, name)?;

        // The attribute can grow between the size probe and the read.
        for _ in 0..2 {
            // SAFETY: both strings are NUL-terminated; a null buffer with size
            // 0 asks only for the attribute length.
            let size = unsafe { getxattr(&c_path, &c_name, std::ptr::null_mut(), 0) };
            if size < 0 {
                let error = io::Error::last_os_error();
                return if is_absent(&error) {
                    Ok(None)
                } else {
                    Err(error)
                };
            }

            let mut buf = vec![0u8; size as usize];
            // SAFETY: `buf` is valid for `buf.len()` writable bytes.
            let read = unsafe {
                getxattr(
                    &c_path,
                    &c_name,
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                )
            };
            if read < 0 {
                let error = io::Error::last_os_error();
                if error.raw_os_error() == Some(libc::ERANGE) {
                    continue;
                }
                return if is_absent(&error) {
                    Ok(None)
                } else {
                    Err(error)
                };
            }
            buf.truncate(read as usize);
            return Ok(Some(buf));
        }

        Err(io::Error::from_raw_os_error(libc::ERANGE))
    }

    pub(super) fn set(path: &Path, name: &str, value: &[u8]) -> io::Result<()> {
        let (c_path, c_name) = cstrings(path, name)?;
        // SAFETY: strings are NUL-terminated and `value` is a valid slice.
        let rc = unsafe { setxattr(&c_path, &c_name, value) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod xattr {
    use std::io;
    use std::path::Path;

    pub(super) fn get(_path: &Path, _name: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(None)
    }

    pub(super) fn set(_path: &Path, _name: &str, _value: &[u8]) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }
}

/// Metadata kept in a separate directory tree.
///
/// The blob `name` of `/data/mfs/a/b.txt` lives at
/// `<dir>/data/mfs/a/b.txt.<name>`.
#[derive(Debug, Clone)]
pub struct SidecarStore {
    dir: PathBuf,
}

impl SidecarStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where the blob `name` for `path` is stored.
    pub fn location(&self, path: &Path, name: &str) -> PathBuf {
        let mut location = self.dir.clone();
        for component in path.components() {
            if let Component::Normal(part) = component {
                location.push(part);
            }
        }
        let mut file_name: OsString = location.as_os_str().to_owned();
        file_name.push(".");
        file_name.push(name);
        PathBuf::from(file_name)
    }

    /// Store a blob, creating intermediate directories.
    pub fn write(&self, path: &Path, name: &str, value: &[u8]) -> Result<()> {
        let location = self.location(path, name);
        if let Some(parent) = location.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::from_io(e, parent))?;
        }
        fs::write(&location, value).map_err(|e| Error::from_io(e, &location))
    }
}

impl MetadataStore for SidecarStore {
    fn read(&self, path: &Path, name: &str) -> Result<Option<Vec<u8>>> {
        let location = self.location(path, name);
        match fs::read(&location) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::from_io(e, &location)),
        }
    }
}
