//! Filesystem collection of query and candidate files.
//!
//! - [`list_queries`]: non-recursive listing of the main directory, sorted by the query
//!   ordering policy
//! - [`discover_candidates`]: recursive discovery under one or more candidate roots

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::core::file_ref::FileRef;
use crate::core::ordering::sort_queries;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to list {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to walk {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        source: walkdir::Error,
    },
}

/// Filters shared by query listing and candidate discovery
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Keep only files with one of these extensions (case-insensitive, no leading dot).
    /// Empty keeps every file.
    pub extensions: Vec<String>,
    /// Paths pruned from candidate discovery, together with everything beneath them
    pub exclude: Vec<PathBuf>,
    /// Follow symbolic links
    pub follow_links: bool,
}

impl ScanOptions {
    /// Normalize user-supplied extensions: strip leading dots, lowercase.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| self.extensions.contains(&ext))
    }
}

/// List the regular files directly inside `dir`, in query order.
///
/// # Errors
///
/// Returns `ScanError::NotADirectory` if `dir` is not a directory, or `ScanError::Io`
/// if it cannot be listed.
pub fn list_queries(dir: &Path, options: &ScanOptions) -> Result<Vec<FileRef>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }

    let io_err = |source| ScanError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut queries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();

        let is_file = if options.follow_links {
            path.is_file()
        } else {
            entry.file_type().map_err(io_err)?.is_file()
        };

        if is_file && options.accepts(&path) {
            queries.push(FileRef::new(path));
        }
    }

    sort_queries(&mut queries);
    debug!("Listed {} query files in {}", queries.len(), dir.display());
    Ok(queries)
}

/// Recursively collect candidate files under every root, in root order.
///
/// Entries are visited sorted by file name so repeated runs see the same candidate order.
///
/// # Errors
///
/// Returns `ScanError::NotADirectory` if a root is not a directory, or `ScanError::Walk`
/// on the first traversal error.
pub fn discover_candidates(
    roots: &[PathBuf],
    options: &ScanOptions,
) -> Result<Vec<FileRef>, ScanError> {
    let excluded: Vec<PathBuf> = options
        .exclude
        .iter()
        .map(|p| std::fs::canonicalize(p).unwrap_or_else(|_| p.clone()))
        .collect();

    let mut candidates = Vec::new();

    for root in roots {
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.clone()));
        }

        let walker = WalkDir::new(root)
            .follow_links(options.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_excluded(entry, &options.exclude, &excluded));

        for entry in walker {
            let entry = entry.map_err(|source| ScanError::Walk {
                root: root.clone(),
                source,
            })?;

            if entry.file_type().is_file() && options.accepts(entry.path()) {
                candidates.push(FileRef::new(entry.into_path()));
            }
        }
    }

    debug!("Discovered {} candidate files", candidates.len());
    Ok(candidates)
}

fn is_excluded(entry: &walkdir::DirEntry, raw: &[PathBuf], canonical: &[PathBuf]) -> bool {
    let path = entry.path();
    if raw.iter().any(|ex| ex == path) {
        return true;
    }
    // Only directories are canonicalized; they are few and prune whole subtrees
    entry.file_type().is_dir()
        && std::fs::canonicalize(path).is_ok_and(|p| canonical.contains(&p))
}
