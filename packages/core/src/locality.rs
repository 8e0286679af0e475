//! Block-locality records and the sources that produce them.
//!
//! A locality record says which hosts hold a replica of a byte range of a
//! file. Records come from one of two places:
//!
//! - embedded metadata attached to the physical file, one record per line:
//!
//!   ```text
//!   0\t67108864\tnode1,node2
//!   67108864\t134217728\tnode2,node3
//!   ```
//!
//! - a remote metadata service (see the `mountfs-http` crate).
//!
//! Both are [`LocalitySource`]s. Sources answer only for files the resolver
//! has already proven to live inside the mount.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Hosts holding a replica of `[offset, offset + length)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockLocation {
    pub offset: u64,
    pub length: u64,
    #[serde(default)]
    pub hosts: Vec<String>,
}

impl BlockLocation {
    pub fn new(offset: u64, length: u64, hosts: Vec<String>) -> Self {
        Self {
            offset,
            length,
            hosts,
        }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.length)
    }
}

/// A half-open byte range `[start, start + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub length: u64,
}

impl ByteRange {
    pub fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }

    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.length)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Half-open overlap with `[start, end)`. Touching ranges do not overlap.
    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        start < self.end() && end > self.start
    }
}

/// A file that passed the mount containment check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Canonical physical path, symlinks resolved.
    pub physical: PathBuf,
    /// Path relative to the mount root, no leading separator.
    pub mount_relative: String,
}

/// Produces locality records for a resolved file.
pub trait LocalitySource: Send + Sync {
    /// Records overlapping `range`. Absent metadata is an empty vector.
    fn locate(&self, file: &ResolvedFile, range: ByteRange) -> Result<Vec<BlockLocation>>;
}

impl<T: LocalitySource + ?Sized> LocalitySource for Box<T> {
    fn locate(&self, file: &ResolvedFile, range: ByteRange) -> Result<Vec<BlockLocation>> {
        (**self).locate(file, range)
    }
}

/// Reads a named metadata blob attached to a physical file.
///
/// Implementations return `Ok(None)` when the blob is not set.
pub trait MetadataStore: Send + Sync {
    fn read(&self, path: &Path, name: &str) -> Result<Option<Vec<u8>>>;
}

/// A source with no locality information.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocality;

impl LocalitySource for NoLocality {
    fn locate(&self, _file: &ResolvedFile, _range: ByteRange) -> Result<Vec<BlockLocation>> {
        Ok(Vec::new())
    }
}

/// Locality records embedded in a per-file metadata attribute.
pub struct EmbeddedLocality<M> {
    store: M,
    attribute: String,
}

impl<M: MetadataStore> EmbeddedLocality<M> {
    pub fn new(store: M, attribute: impl Into<String>) -> Self {
        Self {
            store,
            attribute: attribute.into(),
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }
}

impl<M: MetadataStore> LocalitySource for EmbeddedLocality<M> {
    fn locate(&self, file: &ResolvedFile, range: ByteRange) -> Result<Vec<BlockLocation>> {
        let Some(blob) = self.store.read(&file.physical, &self.attribute)? else {
            tracing::debug!(
                path = %file.physical.display(),
                attribute = %self.attribute,
                "no embedded locality metadata"
            );
            return Ok(Vec::new());
        };
        let text = std::str::from_utf8(&blob)
            .map_err(|e| Error::malformed(0, format!("metadata is not UTF-8: {}", e)))?;
        parse_records(text, range)
    }
}

/// Parse embedded records and keep those overlapping `range`.
///
/// Every line is validated, including ones outside the range: one bad line
/// fails the whole parse. Blank lines and trailing `\r` are ignored.
pub fn parse_records(text: &str, range: ByteRange) -> Result<Vec<BlockLocation>> {
    let mut records = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        let [start, end, hosts] = fields.as_slice() else {
            return Err(Error::malformed(
                line_no,
                format!("expected 3 tab-separated fields, found {}", fields.len()),
            ));
        };

        let start = parse_offset(start, line_no, "start")?;
        let end = parse_offset(end, line_no, "end")?;
        if end < start {
            return Err(Error::malformed(
                line_no,
                format!("end offset {} precedes start offset {}", end, start),
            ));
        }

        let hosts = hosts
            .split(',')
            .map(str::trim)
            .map(|h| {
                if h.is_empty() {
                    Err(Error::malformed(line_no, "empty host name"))
                } else {
                    Ok(h.to_string())
                }
            })
            .collect::<Result<Vec<_>>>()?;

        if range.overlaps(start, end) {
            records.push(BlockLocation::new(start, end - start, hosts));
        }
    }

    Ok(records)
}

fn parse_offset(field: &str, line_no: usize, what: &str) -> Result<u64> {
    field.trim().parse::<u64>().map_err(|e| {
        Error::malformed(line_no, format!("bad {} offset {:?}: {}", what, field, e))
    })
}

/// Order records by offset, drop duplicates, and de-duplicate each host
/// list keeping first occurrence.
pub fn normalize(mut records: Vec<BlockLocation>) -> Vec<BlockLocation> {
    for record in &mut records {
        let mut seen = std::collections::HashSet::new();
        record.hosts.retain(|h| seen.insert(h.clone()));
    }
    records.sort_by(|a, b| (a.offset, a.length, &a.hosts).cmp(&(b.offset, b.length, &b.hosts)));
    records.dedup();
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn overlapping_record_included() {
        let records = parse_records("100\t200\th1", ByteRange::new(150, 150)).unwrap();
        assert_eq!(records, vec![BlockLocation::new(100, 100, hosts(&["h1"]))]);
    }

    #[test]
    fn disjoint_record_excluded() {
        let records = parse_records("100\t200\th1", ByteRange::new(0, 50)).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn touching_record_excluded() {
        let records = parse_records("100\t200\th1", ByteRange::new(0, 100)).unwrap();
        assert!(records.is_empty());

        let records = parse_records("100\t200\th1", ByteRange::new(200, 10)).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn multiple_records_and_hosts() {
        let text = "0\t100\tn1,n2\n100\t200\tn2,n3\n200\t300\tn3\n";
        let records = parse_records(text, ByteRange::new(50, 100)).unwrap();
        assert_eq!(
            records,
            vec![
                BlockLocation::new(0, 100, hosts(&["n1", "n2"])),
                BlockLocation::new(100, 100, hosts(&["n2", "n3"])),
            ]
        );
    }

    #[test]
    fn non_numeric_offset_fails() {
        let err = parse_records("abc\t200\th1", ByteRange::new(0, 1000)).unwrap_err();
        assert!(matches!(err, Error::MetadataMalformed { line: 1, .. }));
    }

    #[test]
    fn malformed_line_outside_range_still_fails() {
        let text = "0\t100\th1\n5000\tx\th2";
        let err = parse_records(text, ByteRange::new(0, 10)).unwrap_err();
        assert!(matches!(err, Error::MetadataMalformed { line: 2, .. }));
    }

    #[test]
    fn wrong_field_count_fails() {
        assert!(parse_records("0\t100", ByteRange::new(0, 10)).is_err());
        assert!(parse_records("0\t100\th1\textra", ByteRange::new(0, 10)).is_err());
    }

    #[test]
    fn reversed_range_fails() {
        assert!(parse_records("200\t100\th1", ByteRange::new(0, 1000)).is_err());
    }

    #[test]
    fn empty_host_fails() {
        assert!(parse_records("0\t100\t", ByteRange::new(0, 10)).is_err());
        assert!(parse_records("0\t100\th1,,h2", ByteRange::new(0, 10)).is_err());
    }

    #[test]
    fn blank_lines_and_crlf_ignored() {
        let text = "\r\n0\t100\th1\r\n\n";
        let records = parse_records(text, ByteRange::new(0, 10)).unwrap();
        assert_eq!(records, vec![BlockLocation::new(0, 100, hosts(&["h1"]))]);
    }

    #[test]
    fn range_end_saturates() {
        let records = parse_records("100\t200\th1", ByteRange::new(150, u64::MAX)).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn normalize_sorts_and_dedupes() {
        let records = vec![
            BlockLocation::new(100, 100, hosts(&["b", "a", "b"])),
            BlockLocation::new(0, 100, hosts(&["a"])),
            BlockLocation::new(100, 100, hosts(&["b", "a"])),
        ];
        assert_eq!(
            normalize(records),
            vec![
                BlockLocation::new(0, 100, hosts(&["a"])),
                BlockLocation::new(100, 100, hosts(&["b", "a"])),
            ]
        );
    }

    struct MapStore(HashMap<(PathBuf, String), Vec<u8>>);

    impl MetadataStore for MapStore {
        fn read(&self, path: &Path, name: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.0.get(&(path.to_path_buf(), name.to_string())).cloned())
        }
    }

    fn resolved(path: &str) -> ResolvedFile {
        ResolvedFile {
            physical: PathBuf::from(path),
            mount_relative: path.trim_start_matches('/').to_string(),
        }
    }

    #[test]
    fn embedded_source_reads_attribute() {
        let mut map = HashMap::new();
        map.insert(
            (PathBuf::from("/m/a"), "user.locs".to_string()),
            b"0\t10\th1".to_vec(),
        );
        let source = EmbeddedLocality::new(MapStore(map), "user.locs");
        let records = source.locate(&resolved("/m/a"), ByteRange::new(0, 5)).unwrap();
        assert_eq!(records, vec![BlockLocation::new(0, 10, hosts(&["h1"]))]);
    }

    #[test]
    fn embedded_source_missing_attribute_is_empty() {
        let source = EmbeddedLocality::new(MapStore(HashMap::new()), "user.locs");
        let records = source.locate(&resolved("/m/a"), ByteRange::new(0, 5)).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn embedded_source_rejects_non_utf8() {
        let mut map = HashMap::new();
        map.insert((PathBuf::from("/m/a"), "a".to_string()), vec![0xff, 0xfe]);
        let source = EmbeddedLocality::new(MapStore(map), "a");
        assert!(source.locate(&resolved("/m/a"), ByteRange::new(0, 5)).is_err());
    }

    #[test]
    fn block_location_deserializes_historical_format() {
        let json = r#"{"names":["n1:50010"],"hosts":["n1"],"topologyPaths":[],"offset":0,"length":10,"corrupt":false}"#;
        let record: BlockLocation = serde_json::from_str(json).unwrap();
        assert_eq!(record, BlockLocation::new(0, 10, hosts(&["n1"])));
    }
}
