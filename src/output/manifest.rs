use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::core::record::MatchRecord;
use crate::output::paths::PathNormalizer;

/// Prefix marking a query for which no candidate was found
pub const NOT_FOUND_PREFIX: &str = "notfound:";

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write manifest to {}: {source}", .path.display())]
    Write {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// Render one record: the candidate's path if matched, `notfound:<query path>` otherwise.
#[must_use]
pub fn render_line(record: &MatchRecord, normalizer: &PathNormalizer) -> String {
    match record {
        MatchRecord::Matched { candidate, .. } => normalizer.normalize(candidate.path()),
        MatchRecord::Unmatched { query } => {
            format!("{NOT_FOUND_PREFIX}{}", normalizer.normalize(query.path()))
        }
    }
}

/// Render all records, one per line, joined by `\n` with no trailing newline.
#[must_use]
pub fn render_manifest(records: &[MatchRecord], normalizer: &PathNormalizer) -> String {
    records
        .iter()
        .map(|r| render_line(r, normalizer))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the manifest to `dest`, or to stdout when `dest` is `-`.
///
/// # Errors
///
/// Returns `OutputError::Write` if the destination cannot be written.
pub fn write_manifest(dest: &Path, content: &str) -> Result<(), OutputError> {
    let write_err = |source| OutputError::Write {
        path: dest.to_path_buf(),
        source,
    };

    if dest.as_os_str() == "-" {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(content.as_bytes()).map_err(write_err)?;
        return handle.flush().map_err(write_err);
    }

    std::fs::write(dest, content).map_err(write_err)
}
