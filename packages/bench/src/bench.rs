//! The three benchmarks, generic over any [`FileSystem`].

use std::io::{Read, Seek, SeekFrom, Write};
use std::time::{Duration, Instant};

use mountfs_core::{CreateOptions, FileSystem, LogicalPath, Result, Syncable};
use rand::Rng;

pub const CHUNK_SIZE: usize = 1024 * 1024;
pub const READ_SIZE: usize = 4096;
const GIB: u64 = 1024 * 1024 * 1024;

/// Bytes in `size_gb` GiB, or `None` if that does not fit in a `u64`.
pub fn gib_to_bytes(size_gb: u64) -> Option<u64> {
    size_gb.checked_mul(GIB)
}

/// What one benchmark run measured.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub operation: &'static str,
    pub bytes: u64,
    pub ops: u64,
    pub elapsed: Duration,
}

impl Report {
    pub fn megabytes_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.bytes as f64 / (1024.0 * 1024.0) / secs
    }

    pub fn millis_per_op(&self) -> f64 {
        if self.ops == 0 {
            return 0.0;
        }
        self.elapsed.as_secs_f64() * 1000.0 / self.ops as f64
    }
}

/// Write `total` bytes in 1 MiB chunks, replacing any existing file.
///
/// Timing includes the closing sync, so the figure reflects durable writes.
pub fn write<F: FileSystem>(fs: &F, path: &LogicalPath, total: u64) -> Result<Report> {
    if fs.exists(path)? {
        fs.delete(path, false)?;
    }

    let chunk = vec![0u8; CHUNK_SIZE];
    let start = Instant::now();
    let mut out = fs.create(path, CreateOptions::default().buffer_size(CHUNK_SIZE))?;
    let mut remaining = total;
    let mut ops = 0;
    while remaining > 0 {
        let n = remaining.min(CHUNK_SIZE as u64) as usize;
        out.write_all(&chunk[..n])?;
        remaining -= n as u64;
        ops += 1;
    }
    out.close()?;

    Ok(Report {
        operation: "write",
        bytes: total,
        ops,
        elapsed: start.elapsed(),
    })
}

/// Read the whole file front to back in 4 KiB reads.
pub fn scan<F: FileSystem>(fs: &F, path: &LogicalPath) -> Result<Report> {
    let mut input = fs.open(path)?;
    let mut buf = [0u8; READ_SIZE];
    let mut bytes = 0u64;
    let mut ops = 0u64;

    let start = Instant::now();
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        bytes += n as u64;
        ops += 1;
    }

    Ok(Report {
        operation: "scan",
        bytes,
        ops,
        elapsed: start.elapsed(),
    })
}

/// `count` 4 KiB reads at random 4 KiB-aligned offsets. With no count,
/// one read per 4 KiB of file.
pub fn random_read<F: FileSystem>(
    fs: &F,
    path: &LogicalPath,
    count: Option<u64>,
    rng: &mut impl Rng,
) -> Result<Report> {
    let length = fs.get_file_status(path)?.length;
    let slots = length / READ_SIZE as u64;
    let count = count.unwrap_or(slots);

    let mut input = fs.open(path)?;
    let mut buf = [0u8; READ_SIZE];
    let mut ops = 0u64;

    let start = Instant::now();
    if slots > 0 {
        for _ in 0..count {
            let offset = rng.gen_range(0..slots) * READ_SIZE as u64;
            input.seek(SeekFrom::Start(offset))?;
            input.read_exact(&mut buf)?;
            ops += 1;
        }
    }

    Ok(Report {
        operation: "rread",
        bytes: ops * READ_SIZE as u64,
        ops,
        elapsed: start.elapsed(),
    })
}
