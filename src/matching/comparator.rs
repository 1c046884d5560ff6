//! Two-stage similarity comparator.
//!
//! Two files are similar when:
//!
//! 1. **Size gate**: `min_size / max_size >= size_tolerance`. Failing pairs are rejected
//!    without reading any content.
//! 2. **Content scan**: both files are read in lockstep over `[0, min_size)` and the equal
//!    byte positions are counted. The pair is similar when
//!    `matching_bytes / max_size >= content_similarity_threshold`.
//!
//! The denominator is the larger file's size, so bytes past the end of the shorter file
//! count against the ratio exactly like mismatching bytes do. A truncated copy is penalized
//! the same way as a corrupted one.
//!
//! Two empty files are similar. An empty file is never similar to a non-empty one.

use std::io::{self, ErrorKind, Read};

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::config::ComparatorConfig;
use crate::core::file_ref::{ContentSource, SourceError};

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Failed to open {path}: {source}")]
    Open { path: String, source: io::Error },

    #[error("Failed to stat {path}: {source}")]
    Stat { path: String, source: io::Error },

    #[error("Failed to read {path} at offset {offset}: {source}")]
    Read {
        path: String,
        offset: u64,
        source: io::Error,
    },

    #[error("Short read from {path} at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        path: String,
        offset: u64,
        expected: usize,
        actual: usize,
    },
}

/// Which step of the comparison produced the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Both files are empty, or exactly one is
    Empty,
    /// Rejected by the size ratio before any content was read
    SizeGate,
    /// Decided by the byte-identity ratio
    Content,
}

/// Detailed result of comparing two files
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub size_a: u64,
    pub size_b: u64,

    /// `min_size / max_size`, 1.0 when both files are empty
    pub size_ratio: f64,

    /// Equal byte positions in `[0, min_size)`; `None` if content was not scanned
    pub matching_bytes: Option<u64>,

    /// `matching_bytes / max_size`; `None` if content was not scanned
    pub similarity_ratio: Option<f64>,

    pub decided_by: Stage,
    pub similar: bool,
}

impl Comparison {
    #[must_use]
    pub fn min_size(&self) -> u64 {
        self.size_a.min(self.size_b)
    }

    #[must_use]
    pub fn max_size(&self) -> u64 {
        self.size_a.max(self.size_b)
    }
}

/// Convert a byte count to f64 for ratio calculations.
///
/// Precision loss only starts above 2^53 bytes, far beyond any real file.
#[inline]
fn bytes_to_f64(count: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Compares files by size ratio and byte identity
#[derive(Debug, Clone, Default)]
pub struct SimilarityComparator {
    config: ComparatorConfig,
}

impl SimilarityComparator {
    #[must_use]
    pub fn new(config: ComparatorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ComparatorConfig {
        &self.config
    }

    /// Decide whether two files are similar.
    ///
    /// # Errors
    ///
    /// Returns a [`CompareError`] if either file cannot be opened, stat'ed, or read
    /// for the expected number of bytes.
    pub fn compare<A, B>(&self, a: &A, b: &B) -> Result<bool, CompareError>
    where
        A: ContentSource + ?Sized,
        B: ContentSource + ?Sized,
    {
        self.compare_detailed(a, b).map(|c| c.similar)
    }

    /// Compare two files and report every intermediate value.
    ///
    /// Both handles live only for the duration of this call. If the second file fails
    /// to open, the first is closed before the error is returned.
    ///
    /// # Errors
    ///
    /// Same as [`SimilarityComparator::compare`].
    pub fn compare_detailed<A, B>(&self, a: &A, b: &B) -> Result<Comparison, CompareError>
    where
        A: ContentSource + ?Sized,
        B: ContentSource + ?Sized,
    {
        let (mut reader_a, size_a) = open(a)?;
        let (mut reader_b, size_b) = open(b)?;

        let max_size = size_a.max(size_b);
        let min_size = size_a.min(size_b);

        if max_size == 0 {
            return Ok(Comparison {
                size_a,
                size_b,
                size_ratio: 1.0,
                matching_bytes: None,
                similarity_ratio: None,
                decided_by: Stage::Empty,
                similar: true,
            });
        }

        if min_size == 0 {
            return Ok(Comparison {
                size_a,
                size_b,
                size_ratio: 0.0,
                matching_bytes: None,
                similarity_ratio: None,
                decided_by: Stage::Empty,
                similar: false,
            });
        }

        let size_ratio = bytes_to_f64(min_size) / bytes_to_f64(max_size);
        if size_ratio < self.config.size_tolerance {
            trace!(
                a = %a.label(),
                b = %b.label(),
                size_ratio,
                "rejected by size gate"
            );
            return Ok(Comparison {
                size_a,
                size_b,
                size_ratio,
                matching_bytes: None,
                similarity_ratio: None,
                decided_by: Stage::SizeGate,
                similar: false,
            });
        }

        let matching_bytes = self.count_matching_bytes(
            (&mut reader_a, &a.label()),
            (&mut reader_b, &b.label()),
            min_size,
        )?;

        let similarity_ratio = bytes_to_f64(matching_bytes) / bytes_to_f64(max_size);
        let similar = similarity_ratio >= self.config.content_similarity_threshold;

        trace!(
            a = %a.label(),
            b = %b.label(),
            matching_bytes,
            similarity_ratio,
            similar,
            "content scan finished"
        );

        Ok(Comparison {
            size_a,
            size_b,
            size_ratio,
            matching_bytes: Some(matching_bytes),
            similarity_ratio: Some(similarity_ratio),
            decided_by: Stage::Content,
            similar,
        })
    }

    /// Count equal byte positions in `[0, len)`, reading both streams chunk by chunk.
    fn count_matching_bytes<RA: Read, RB: Read>(
        &self,
        (reader_a, label_a): (&mut RA, &str),
        (reader_b, label_b): (&mut RB, &str),
        len: u64,
    ) -> Result<u64, CompareError> {
        // An unvalidated config may carry chunk_bytes = 0, which would never advance
        let chunk_bytes = self.config.chunk_bytes.max(1);
        let chunk = usize::try_from(len).map_or(chunk_bytes, |l| l.min(chunk_bytes));
        let mut buf_a = vec![0u8; chunk];
        let mut buf_b = vec![0u8; chunk];

        let mut offset = 0u64;
        let mut matching = 0u64;

        while offset < len {
            let want = usize::try_from(len - offset).map_or(chunk, |rest| rest.min(chunk));

            read_chunk(reader_a, &mut buf_a[..want], label_a, offset)?;
            read_chunk(reader_b, &mut buf_b[..want], label_b, offset)?;

            let equal = buf_a[..want]
                .iter()
                .zip(&buf_b[..want])
                .filter(|(x, y)| x == y)
                .count();
            matching += equal as u64;
            offset += want as u64;
        }

        Ok(matching)
    }
}

fn open<S: ContentSource + ?Sized>(src: &S) -> Result<(S::Reader, u64), CompareError> {
    src.open_sized().map_err(|e| match e {
        SourceError::Open(source) => CompareError::Open {
            path: src.label(),
            source,
        },
        SourceError::Stat(source) => CompareError::Stat {
            path: src.label(),
            source,
        },
    })
}

/// Fill `buf` completely from `reader`; running out of data first is a short read.
fn read_chunk<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    label: &str,
    offset: u64,
) -> Result<(), CompareError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(source) => {
                return Err(CompareError::Read {
                    path: label.to_string(),
                    offset: offset + filled as u64,
                    source,
                })
            }
        }
    }

    if filled < buf.len() {
        return Err(CompareError::ShortRead {
            path: label.to_string(),
            offset,
            expected: buf.len(),
            actual: filled,
        });
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Cursor;
    use std::rc::Rc;

    /// In-memory source that counts `read` calls across every reader it hands out.
    pub(crate) struct MemSource {
        pub name: &'static str,
        pub data: Vec<u8>,
        /// Size reported on open; differs from `data.len()` to simulate truncation
        pub reported_size: Option<u64>,
        pub fail_open: bool,
        pub fail_stat: bool,
        pub reads: Rc<Cell<usize>>,
    }

    impl MemSource {
        pub(crate) fn new(name: &'static str, data: Vec<u8>) -> Self {
            Self {
                name,
                data,
                reported_size: None,
                fail_open: false,
                fail_stat: false,
                reads: Rc::new(Cell::new(0)),
            }
        }

        pub(crate) fn unreadable(name: &'static str) -> Self {
            Self {
                fail_open: true,
                ..Self::new(name, Vec::new())
            }
        }
    }

    pub(crate) struct CountingReader {
        inner: Cursor<Vec<u8>>,
        reads: Rc<Cell<usize>>,
    }

    impl Read for CountingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads.set(self.reads.get() + 1);
            self.inner.read(buf)
        }
    }

    impl ContentSource for MemSource {
        type Reader = CountingReader;

        fn open_sized(&self) -> Result<(CountingReader, u64), SourceError> {
            if self.fail_open {
                return Err(SourceError::Open(io::Error::new(
                    ErrorKind::PermissionDenied,
                    "denied",
                )));
            }
            if self.fail_stat {
                return Err(SourceError::Stat(io::Error::new(ErrorKind::Other, "stale handle")));
            }
            let size =self.reported_size.unwrap_or(self.data.len() as u64);
            let reader = CountingReader {
                inner: Cursor::new(self.data.clone()),
                reads: Rc::clone(&self.reads),
            };
            Ok((reader, size))
        }

        fn label(&self) -> String {
            self.name.to_string()
        }
    }

    fn patterned(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn comparator() -> SimilarityComparator {
        SimilarityComparator::default()
    }

    #[test]
    fn test_identity() {
        let a = MemSource::new("a", patterned(20_000));
        assert!(comparator().compare(&a, &a).unwrap());
    }

    #[test]
    fn test_identity_on_disk() {
        use crate::core::file_ref::FileRef;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, patterned(30_000)).unwrap();

        let f = FileRef::new(&path);
        assert!(comparator().compare(&f, &f).unwrap());
    }

    #[test]
    fn test_symmetry() {
        let base = patterned(1000);
        let mut corrupted = base.clone();
        for byte in corrupted.iter_mut().take(60) {
            *byte = byte.wrapping_add(1);
        }
        let pairs = [
            (base.clone(), corrupted.clone()),
            (base.clone(), base[..950].to_vec()),
            (base.clone(), base[..500].to_vec()),
            (Vec::new(), base.clone()),
        ];

        for (x, y) in pairs {
            let a = MemSource::new("a", x);
            let b = MemSource::new("b", y);
            assert_eq!(
                comparator().compare(&a, &b).unwrap(),
                comparator().compare(&b, &a).unwrap()
            );
        }
    }

    #[test]
    fn test_size_gate_reads_nothing() {
        let a = MemSource::new("a", patterned(1000));
        let b = MemSource::new("b", patterned(899));

        let result = comparator().compare_detailed(&a, &b).unwrap();
        assert!(!result.similar);
        assert_eq!(result.decided_by, Stage::SizeGate);
        assert_eq!(result.matching_bytes, None);
        assert_eq!(a.reads.get(), 0);
        assert_eq!(b.reads.get(), 0);
    }

    #[test]
    fn test_prefix_at_threshold_is_similar() {
        let full = patterned(1000);
        let a = MemSource::new("full", full.clone());
        let b = MemSource::new("prefix", full[..950].to_vec());

        let result = comparator().compare_detailed(&a, &b).unwrap();
        assert_eq!(result.decided_by, Stage::Content);
        assert_eq!(result.matching_bytes, Some(950));
        assert!(result.similar);
    }

    #[test]
    fn test_prefix_below_threshold_fails_at_gate() {
        let full = patterned(1000);
        let a = MemSource::new("full", full.clone());
        let b = MemSource::new("prefix", full[..940].to_vec());

        let result = comparator().compare_detailed(&a, &b).unwrap();
        assert!(!result.similar);
        assert_eq!(result.decided_by, Stage::SizeGate);
    }

    #[test]
    fn test_truncation_penalized_after_gate() {
        // 920/1000 passes the 0.90 gate but 920 matching bytes are below 0.95
        let full = patterned(1000);
        let a = MemSource::new("full", full.clone());
        let b = MemSource::new("prefix", full[..920].to_vec());

        let result = comparator().compare_detailed(&a, &b).unwrap();
        assert_eq!(result.decided_by, Stage::Content);
        assert!(!result.similar);
    }

    #[test]
    fn test_scattered_corruption_within_threshold() {
        let base = patterned(1000);
        let mut corrupted = base.clone();
        for i in (0..1000).step_by(100) {
            corrupted[i] = !corrupted[i];
        }
        let a = MemSource::new("a", base);
        let b = MemSource::new("b", corrupted);

        let result = comparator().compare_detailed(&a, &b).unwrap();
        assert_eq!(result.matching_bytes, Some(990));
        assert!((result.similarity_ratio.unwrap() - 0.99).abs() < 1e-12);
        assert!(result.similar);
    }

    #[test]
    fn test_heavy_corruption_not_similar() {
        let base = patterned(1000);
        let mut corrupted = base.clone();
        for byte in corrupted.iter_mut().take(51) {
            *byte = !*byte;
        }
        let a = MemSource::new("a", base);
        let b = MemSource::new("b", corrupted);
        assert!(!comparator().compare(&a, &b).unwrap());
    }

    #[test]
    fn test_empty_files() {
        let empty_a = MemSource::new("a", Vec::new());
        let empty_b = MemSource::new("b", Vec::new());
        let full = MemSource::new("c", patterned(10));

        assert!(comparator().compare(&empty_a, &empty_b).unwrap());
        assert!(!comparator().compare(&empty_a, &full).unwrap());
        assert!(!comparator().compare(&full, &empty_b).unwrap());
        assert_eq!(empty_a.reads.get() + empty_b.reads.get() + full.reads.get(), 0);
    }

    #[test]
    fn test_only_overlap_is_read() {
        let full = patterned(1000);
        let a = MemSource::new("a", full.clone());
        let b = MemSource::new("b", full[..960].to_vec());

        let config = ComparatorConfig {
            chunk_bytes: 100,
            ..ComparatorConfig::default()
        };
        let result = SimilarityComparator::new(config)
            .compare_detailed(&a, &b)
            .unwrap();

        assert_eq!(result.matching_bytes, Some(960));
        // 9 full chunks plus a 60 byte tail, one read each from a cursor
        assert_eq!(a.reads.get(), 10);
        assert_eq!(b.reads.get(), 10);
    }

    #[test]
    fn test_chunk_size_does_not_change_result() {
        let base = patterned(10_000);
        let mut other = base.clone();
        for i in (0..10_000).step_by(37) {
            other[i] ^= 0x55;
        }

        let expected = comparator()
            .compare_detailed(&MemSource::new("a", base.clone()), &MemSource::new("b", other.clone()))
            .unwrap();

        for chunk_bytes in [1, 7, 4096, 1 << 20] {
            let config = ComparatorConfig {
                chunk_bytes,
                ..ComparatorConfig::default()
            };
            let result = SimilarityComparator::new(config)
                .compare_detailed(&MemSource::new("a", base.clone()), &MemSource::new("b", other.clone()))
                .unwrap();
            assert_eq!(result.matching_bytes, expected.matching_bytes);
            assert_eq!(result.similar, expected.similar);
        }
    }

    #[test]
    fn test_short_read_is_error() {
        let a = MemSource::new("a", patterned(1000));
        let mut b = MemSource::new("b", patterned(500));
        b.reported_size = Some(1000);

        let err = comparator().compare(&a, &b).unwrap_err();
        match err {
            CompareError::ShortRead { path, expected, .. } => {
                assert_eq!(path, "b");
                assert!(expected > 0);
            }
            other => panic!("expected short read, got {other:?}"),
        }
    }

    #[test]
    fn test_open_failure_on_either_side() {
        let good = MemSource::new("good", patterned(100));
        let bad = MemSource::unreadable("bad");

        assert!(matches!(
            comparator().compare(&good, &bad),
            Err(CompareError::Open { path, .. }) if path == "bad"
        ));
        assert!(matches!(
            comparator().compare(&bad, &good),
            Err(CompareError::Open { path, .. }) if path == "bad"
        ));
    }

    #[test]
    fn test_stat_failure_names_the_file() {
        let good = MemSource::new("good", patterned(100));
        let stale = MemSource {
            fail_stat: true,
            ..MemSource::new("stale", patterned(100))
        };

        let err = comparator().compare(&good, &stale).unwrap_err();
        assert!(matches!(err, CompareError::Stat { ref path, .. } if path == "stale"));
        assert!(err.to_string().contains("stale"));
        assert_eq!(good.reads.get() + stale.reads.get(), 0);
    }

    #[test]
    fn test_zero_chunk_size_still_terminates() {
        let base = patterned(100);
        let mut other = base.clone();
        other[3] = !other[3];

        let config = ComparatorConfig {
            chunk_bytes: 0,
            ..ComparatorConfig::default()
        };
        let result = SimilarityComparator::new(config)
            .compare_detailed(&MemSource::new("a", base), &MemSource::new("b", other))
            .unwrap();
        assert_eq!(result.matching_bytes, Some(99));
        assert!(result.similar);
    }

    #[test]
    fn test_missing_file_on_disk_is_open_error() {
        use crate::core::file_ref::FileRef;

        let dir = tempfile::TempDir::new().unwrap();
        let present = dir.path().join("present.bin");
        std::fs::write(&present, b"abc").unwrap();

        let err = comparator()
            .compare(&FileRef::new(&present), &FileRef::new(dir.path().join("absent.bin")))
            .unwrap_err();
        assert!(matches!(err, CompareError::Open { .. }));
    }

    #[test]
    fn test_stricter_threshold() {
        let base = patterned(1000);
        let mut corrupted = base.clone();
        corrupted[0] = !corrupted[0];

        let config = ComparatorConfig {
            content_similarity_threshold: 1.0,
            ..ComparatorConfig::default()
        };
        let strict = SimilarityComparator::new(config);
        assert!(!strict
            .compare(&MemSource::new("a", base.clone()), &MemSource::new("b", corrupted))
            .unwrap());
        assert!(strict
            .compare(&MemSource::new("a", base.clone()), &MemSource::new("b", base))
            .unwrap());
    }
}
