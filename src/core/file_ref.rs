use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A file that can be compared: something that opens to a byte stream of known length.
///
/// Implementations must return a fresh reader positioned at offset 0 on every call,
/// and the reported size must be the number of bytes the reader will yield.
pub trait ContentSource {
    type Reader: Read;

    /// Open the content and report its size in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Open`] if the content cannot be opened, or
    /// [`SourceError::Stat`] if its size cannot be determined.
    fn open_sized(&self) -> Result<(Self::Reader, u64), SourceError>;

    /// Human-readable name used in error messages and logs.
    fn label(&self) -> String;
}

/// Failure to open or stat a [`ContentSource`].
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to open: {0}")]
    Open(#[source] io::Error),

    #[error("Failed to stat: {0}")]
    Stat(#[source] io::Error),
}

/// Reference to a file on disk.
///
/// Cheap to clone, never mutated. The same `FileRef` may take part in many comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef(pub PathBuf);

impl FileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// File name without its final extension (`"10.mp3"` -> `"10"`).
    #[must_use]
    pub fn base_name(&self) -> String {
        self.0
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Full file name including extension.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for FileRef {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&Path> for FileRef {
    fn from(path: &Path) -> Self {
        Self(path.to_path_buf())
    }
}

impl ContentSource for FileRef {
    type Reader = File;

    fn open_sized(&self) -> Result<(File, u64), SourceError> {
        let file = File::open(&self.0).map_err(SourceError::Open)?;
        // Stat the open handle, not the path, so size and content describe the same file
        let size = file.metadata().map_err(SourceError::Stat)?.len();
        Ok((file, size))
    }

    fn label(&self) -> String {
        self.0.display().to_string()
    }
}

impl<T: ContentSource + ?Sized> ContentSource for &T {
    type Reader = T::Reader;

    fn open_sized(&self) -> Result<(Self::Reader, u64), SourceError> {
        (**self).open_sized()
    }

    fn label(&self) -> String {
        (**self).label()
    }
}
