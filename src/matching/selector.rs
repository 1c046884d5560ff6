use tracing::warn;

use crate::config::UnreadablePolicy;
use crate::core::file_ref::ContentSource;
use crate::matching::comparator::{CompareError, SimilarityComparator};

/// A yes/no similarity judgement between a query and one candidate.
pub trait Similarity<Q: ?Sized, C: ?Sized> {
    /// # Errors
    ///
    /// Returns a [`CompareError`] if either side cannot be read.
    fn is_similar(&self, query: &Q, candidate: &C) -> Result<bool, CompareError>;
}

impl<Q, C> Similarity<Q, C> for SimilarityComparator
where
    Q: ContentSource + ?Sized,
    C: ContentSource + ?Sized,
{
    fn is_similar(&self, query: &Q, candidate: &C) -> Result<bool, CompareError> {
        self.compare(query, candidate)
    }
}

/// Picks the first candidate judged similar to a query
pub struct MatchSelector<S> {
    similarity: S,
    on_unreadable: UnreadablePolicy,
}

impl<S> MatchSelector<S> {
    pub fn new(similarity: S, on_unreadable: UnreadablePolicy) -> Self {
        Self {
            similarity,
            on_unreadable,
        }
    }

    pub fn similarity(&self) -> &S {
        &self.similarity
    }

    /// Scan `candidates` in order and return the first one similar to `query`.
    ///
    /// Stops at the first match; later candidates are never compared. Returns `Ok(None)`
    /// once every candidate has been rejected.
    ///
    /// # Errors
    ///
    /// With [`UnreadablePolicy::Abort`] the first comparison error ends the scan and is
    /// returned. With [`UnreadablePolicy::Skip`] errors are logged and the offending
    /// candidate is treated as not matching.
    pub fn select_match<'c, Q, C>(
        &self,
        query: &Q,
        candidates: &'c [C],
    ) -> Result<Option<&'c C>, CompareError>
    where
        Q: ?Sized,
        S: Similarity<Q, C>,
    {
        self.select_match_where(query, candidates, |_| true)
    }

    /// Like [`MatchSelector::select_match`], but candidates rejected by `eligible` are
    /// passed over without being compared.
    ///
    /// # Errors
    ///
    /// Same as [`MatchSelector::select_match`].
    pub fn select_match_where<'c, Q, C, F>(
        &self,
        query: &Q,
        candidates: &'c [C],
        mut eligible: F,
    ) -> Result<Option<&'c C>, CompareError>
    where
        Q: ?Sized,
        S: Similarity<Q, C>,
        F: FnMut(&C) -> bool,
    {
        for candidate in candidates {
            if !eligible(candidate) {
                continue;
            }

            match self.similarity.is_similar(query, candidate) {
                Ok(true) => return Ok(Some(candidate)),
                Ok(false) => {}
                Err(e) => match self.on_unreadable {
                    UnreadablePolicy::Abort => return Err(e),
                    UnreadablePolicy::Skip => {
                        warn!("Skipping unreadable candidate: {e}");
                    }
                },
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::comparator::tests::MemSource;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::io;

    /// Judges by name and records every candidate it is asked about.
    struct Scripted {
        similar: HashSet<&'static str>,
        unreadable: HashSet<&'static str>,
        calls: RefCell<Vec<&'static str>>,
    }

    impl Scripted {
        fn new(similar: &[&'static str], unreadable: &[&'static str]) -> Self {
            Self {
                similar: similar.iter().copied().collect(),
                unreadable: unreadable.iter().copied().collect(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Similarity<str, &'static str> for Scripted {
        fn is_similar(&self, _query: &str, candidate: &&'static str) -> Result<bool, CompareError> {
            self.calls.borrow_mut().push(*candidate);
            if self.unreadable.contains(candidate) {
                return Err(CompareError::Open {
                    path: (*candidate).to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "gone"),
                });
            }
            Ok(self.similar.contains(candidate))
        }
    }

    #[test]
    fn test_first_match_wins_and_short_circuits() {
        let selector = MatchSelector::new(Scripted::new(&["x", "y"], &[]), UnreadablePolicy::Abort);
        let candidates = ["x", "y", "z"];

        let chosen = selector.select_match("q", &candidates).unwrap();
        assert_eq!(chosen, Some(&"x"));
        assert_eq!(*selector.similarity().calls.borrow(), vec!["x"]);
    }

    #[test]
    fn test_later_match_found_after_misses() {
        let selector = MatchSelector::new(Scripted::new(&["z"], &[]), UnreadablePolicy::Abort);
        let candidates = ["x", "y", "z"];

        assert_eq!(selector.select_match("q", &candidates).unwrap(), Some(&"z"));
        assert_eq!(*selector.similarity().calls.borrow(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_no_match_exhausts_candidates() {
        let selector = MatchSelector::new(Scripted::new(&[], &[]), UnreadablePolicy::Abort);
        let candidates = ["x", "y", "z"];

        assert_eq!(selector.select_match("q", &candidates).unwrap(), None);
        assert_eq!(selector.similarity().calls.borrow().len(), 3);
    }

    #[test]
    fn test_empty_candidate_set() {
        let selector = MatchSelector::new(Scripted::new(&[], &[]), UnreadablePolicy::Abort);
        let candidates: [&'static str; 0] = [];
        assert_eq!(selector.select_match("q", &candidates).unwrap(), None);
    }

    #[test]
    fn test_abort_policy_propagates_error() {
        let selector = MatchSelector::new(Scripted::new(&["z"], &["y"]), UnreadablePolicy::Abort);
        let candidates = ["x", "y", "z"];

        let err = selector.select_match("q", &candidates).unwrap_err();
        assert!(matches!(err, CompareError::Open { ref path, .. } if path == "y"));
        assert_eq!(*selector.similarity().calls.borrow(), vec!["x", "y"]);
    }

    #[test]
    fn test_skip_policy_continues_past_error() {
        let selector = MatchSelector::new(Scripted::new(&["z"], &["y"]), UnreadablePolicy::Skip);
        let candidates = ["x", "y", "z"];

        assert_eq!(selector.select_match("q", &candidates).unwrap(), Some(&"z"));
        assert_eq!(*selector.similarity().calls.borrow(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_ineligible_candidates_not_compared() {
        let selector = MatchSelector::new(Scripted::new(&["x", "y"], &[]), UnreadablePolicy::Abort);
        let candidates = ["x", "y", "z"];

        let chosen = selector
            .select_match_where("q", &candidates, |c| *c != "x")
            .unwrap();
        assert_eq!(chosen, Some(&"y"));
        assert_eq!(*selector.similarity().calls.borrow(), vec!["y"]);
    }

    #[test]
    fn test_with_real_comparator() {
        let data: Vec<u8> = (0..5000).map(|i| (i % 200) as u8).collect();
        let mut near = data.clone();
        near[10] ^= 0xff;

        let query = MemSource::new("query", data.clone());
        let candidates = vec![
            MemSource::new("short", data[..1000].to_vec()),
            MemSource::new("near", near),
            MemSource::new("exact", data),
        ];

        let selector =
            MatchSelector::new(SimilarityComparator::default(), UnreadablePolicy::Abort);
        let chosen = selector.select_match(&query, &candidates).unwrap().unwrap();
        assert_eq!(chosen.name, "near");
        assert_eq!(candidates[2].reads.get(), 0);
    }
}
