use serde::Serialize;

use crate::core::file_ref::FileRef;

/// Outcome of matching one query file against the candidate set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchRecord {
    /// A candidate was judged similar to the query
    Matched { query: FileRef, candidate: FileRef },
    /// No candidate was judged similar
    Unmatched { query: FileRef },
}

impl MatchRecord {
    #[must_use]
    pub fn query(&self) -> &FileRef {
        match self {
            Self::Matched { query, .. } | Self::Unmatched { query } => query,
        }
    }

    #[must_use]
    pub fn candidate(&self) -> Option<&FileRef> {
        match self {
            Self::Matched { candidate, .. } => Some(candidate),
            Self::Unmatched { .. } => None,
        }
    }

    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// Counts over a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
}

impl MatchSummary {
    #[must_use]
    pub fn from_records(records: &[MatchRecord]) -> Self {
        let matched = records.iter().filter(|r| r.is_matched()).count();
        Self {
            total: records.len(),
            matched,
            unmatched: records.len() - matched,
        }
    }
}
