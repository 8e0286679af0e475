//! Buffered file writer with an explicit durability barrier.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use mountfs_core::Syncable;

/// Smallest buffer a writer will use, whatever the caller asks for.
pub const MIN_BUFFER_SIZE: usize = 64 * 1024;

/// A buffered writer whose `sync` and `close` reach stable storage.
///
/// `write` only buffers. `sync` flushes the buffer to the OS and then
/// fsyncs the descriptor; `close` does the same before releasing it. A
/// writer dropped without `close` syncs on a best-effort basis and logs a
/// failure, since `Drop` cannot report one.
pub struct DurableWriter {
    inner: Option<BufWriter<File>>,
    path: PathBuf,
}

impl DurableWriter {
    /// Open `path` for writing, truncating or appending.
    ///
    /// The file is created if missing; parent directories are not.
    pub fn open(path: impl AsRef<Path>, buffer_size: usize, append: bool) -> io::Result<Self> {
        let path = path.as_ref();
        let mut options = OpenOptions::new();
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let file = options.create(true).open(path)?;
        Ok(Self::from_file(file, path, buffer_size))
    }

    /// Wrap an already-open file.
    pub fn from_file(file: File, path: impl Into<PathBuf>, buffer_size: usize) -> Self {
        let capacity = buffer_size.max(MIN_BUFFER_SIZE);
        Self {
            inner: Some(BufWriter::with_capacity(capacity, file)),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Buffer capacity actually in use.
    pub fn capacity(&self) -> usize {
        self.inner.as_ref().map_or(0, BufWriter::capacity)
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::other(format!("writer for {} is closed", self.path.display())))
    }

    /// Sync, then release the descriptor.
    pub fn close(mut self) -> io::Result<()> {
        self.sync()?;
        // Dropping the synced BufWriter has nothing left to flush.
        self.inner.take();
        Ok(())
    }
}

impl Write for DurableWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer()?.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.writer()?.write_all(buf)
    }

    /// Hand buffered bytes to the OS. No durability guarantee.
    fn flush(&mut self) -> io::Result<()> {
        self.writer()?.flush()
    }
}

impl Syncable for DurableWriter {
    fn sync(&mut self) -> io::Result<()> {
        let writer = self.writer()?;
        writer.flush()?;
        writer.get_ref().sync_all()
    }

    fn close(self) -> io::Result<()> {
        DurableWriter::close(self)
    }
}

impl Drop for DurableWriter {
    fn drop(&mut self) {
        if self.inner.is_none() {
            return;
        }
        if let Err(e) = self.sync() {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "durable writer dropped without close and final sync failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sync_makes_bytes_visible_after_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();

        let mut writer = DurableWriter::open(&path, 4096, false).unwrap();
        writer.write_all(&data).unwrap();
        writer.sync().unwrap();

        // Reopen through a fresh descriptor while the writer is still alive.
        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(on_disk, data);

        writer.close().unwrap();
    }

    fn write_and_close<W: Syncable>(mut writer: W, bytes: &[u8]) -> io::Result<()> {
        writer.write_all(bytes)?;
        writer.close()
    }

    #[test]
    fn close_through_trait_persists_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("generic.bin");

        let writer = DurableWriter::open(&path, 0, false).unwrap();
        write_and_close(writer, b"through the trait").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"through the trait");
    }

    #[test]
    fn buffer_floor_applies() {
        let dir = TempDir::new().unwrap();
        let writer = DurableWriter::open(dir.path().join("f"), 1024, false).unwrap();
        assert_eq!(writer.capacity(), MIN_BUFFER_SIZE);

        let writer = DurableWriter::open(dir.path().join("g"), 1 << 20, false).unwrap();
        assert_eq!(writer.capacity(), 1 << 20);
    }

    #[test]
    fn small_buffer_accepts_large_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        let data = vec![7u8; 3 * MIN_BUFFER_SIZE + 17];

        let mut writer = DurableWriter::open(&path, 1024, false).unwrap();
        writer.write_all(&data).unwrap();
        writer.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), data);
    }

    #[test]
    fn unsynced_bytes_stay_buffered() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("buffered");

        let mut writer = DurableWriter::open(&path, 0, false).unwrap();
        writer.write_all(b"pending").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"");

        writer.sync().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"pending");
        writer.close().unwrap();
    }

    #[test]
    fn sync_is_repeatable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("twice");

        let mut writer = DurableWriter::open(&path, 0, false).unwrap();
        writer.write_all(b"abc").unwrap();
        writer.sync().unwrap();
        writer.sync().unwrap();
        writer.write_all(b"def").unwrap();
        writer.sync().unwrap();
        writer.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"abcdef");
    }

    #[test]
    fn append_mode_keeps_existing_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log");
        std::fs::write(&path, "first").unwrap();

        let mut writer = DurableWriter::open(&path, 0, true).unwrap();
        writer.write_all(b"second").unwrap();
        writer.close().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "firstsecond");
    }

    #[test]
    fn truncate_mode_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("over");
        std::fs::write(&path, "old contents that are long").unwrap();

        let mut writer = DurableWriter::open(&path, 0, false).unwrap();
        writer.write_all(b"new").unwrap();
        writer.close().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn drop_without_close_still_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dropped");
        {
            let mut writer = DurableWriter::open(&path, 0, false).unwrap();
            writer.write_all(b"kept").unwrap();
        }
        assert_eq!(std::fs::read(&path).unwrap(), b"kept");
    }

    #[test]
    fn open_in_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let result = DurableWriter::open(dir.path().join("no/such/dir/f"), 0, false);
        assert_eq!(result.err().map(|e| e.kind()), Some(io::ErrorKind::NotFound));
    }
}
