use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::MatchConfig;
use crate::core::file_ref::FileRef;
use crate::core::record::{MatchRecord, MatchSummary};
use crate::matching::comparator::{CompareError, SimilarityComparator};
use crate::matching::selector::{MatchSelector, Similarity};

/// Runs the selector for every query, in query order
pub struct MatchingEngine<S = SimilarityComparator> {
    selector: MatchSelector<S>,
    exclude_self: bool,
}

impl MatchingEngine<SimilarityComparator> {
    /// Create an engine backed by the file similarity comparator
    #[must_use]
    pub fn new(config: &MatchConfig) -> Self {
        Self::with_similarity(SimilarityComparator::new(config.comparator), config)
    }
}

impl<S> MatchingEngine<S>
where
    S: Similarity<FileRef, FileRef>,
{
    /// Create an engine with a custom similarity judgement
    pub fn with_similarity(similarity: S, config: &MatchConfig) -> Self {
        Self {
            selector: MatchSelector::new(similarity, config.on_unreadable),
            exclude_self: config.exclude_self,
        }
    }

    /// Produce one record per query, in the order given.
    ///
    /// `queries` should already be sorted with [`crate::core::ordering::sort_queries`].
    ///
    /// # Errors
    ///
    /// Returns the first [`CompareError`] when the unreadable policy is `Abort`.
    /// Records produced before the failure are discarded.
    pub fn run(
        &self,
        queries: &[FileRef],
        candidates: &[FileRef],
    ) -> Result<Vec<MatchRecord>, CompareError> {
        let canonical: HashMap<&Path, PathBuf> = if self.exclude_self {
            candidates
                .iter()
                .map(|c| (c.path(), canonical_path(c.path())))
                .collect()
        } else {
            HashMap::new()
        };

        let total = queries.len();
        let mut records = Vec::with_capacity(total);

        for (i, query) in queries.iter().enumerate() {
            let chosen = if self.exclude_self {
                let query_canonical = canonical_path(query.path());
                self.selector.select_match_where(query, candidates, |c| {
                    canonical.get(c.path()) != Some(&query_canonical)
                })?
            } else {
                self.selector.select_match(query, candidates)?
            };

            let record = match chosen {
                Some(candidate) => {
                    info!("[{}/{total}] {query} -> {candidate}", i + 1);
                    MatchRecord::Matched {
                        query: query.clone(),
                        candidate: candidate.clone(),
                    }
                }
                None => {
                    info!("[{}/{total}] {query}: no match", i + 1);
                    MatchRecord::Unmatched {
                        query: query.clone(),
                    }
                }
            };
            records.push(record);
        }

        let summary = MatchSummary::from_records(&records);
        debug!(
            total = summary.total,
            matched = summary.matched,
            unmatched = summary.unmatched,
            "matching finished"
        );

        Ok(records)
    }
}

/// Resolve symlinks and relative components; unresolvable paths are used as given.
fn canonical_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
