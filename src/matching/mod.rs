//! Similarity comparison and match selection.
//!
//! - [`SimilarityComparator`]: decides whether two files are "the same" despite small
//!   differences
//! - [`MatchSelector`]: returns the first candidate similar to a query
//! - [`MatchingEngine`]: runs the selector over every query, producing one record each
//!
//! ## Comparison
//!
//! 1. **Size gate**: `min_size / max_size` below the size tolerance rejects the pair
//!    without reading either file
//! 2. **Content scan**: equal bytes over the overlapping region, divided by the larger
//!    file's size, must reach the content similarity threshold
//!
//! ## Example
//!
//! ```rust,no_run
//! use near_match::{FileRef, MatchConfig, MatchingEngine};
//! use near_match::scan::{discover_candidates, list_queries, ScanOptions};
//! use std::path::{Path, PathBuf};
//!
//! let options = ScanOptions::default();
//! let queries = list_queries(Path::new("main"), &options).unwrap();
//! let candidates = discover_candidates(&[PathBuf::from("pool")], &options).unwrap();
//!
//! let engine = MatchingEngine::new(&MatchConfig::default());
//! for record in engine.run(&queries, &candidates).unwrap() {
//!     println!("{} -> {:?}", record.query(), record.candidate().map(FileRef::path));
//! }
//! ```

pub mod comparator;
pub mod engine;
pub mod selector;

pub use comparator::{CompareError, Comparison, SimilarityComparator, Stage};
pub use engine::MatchingEngine;
pub use selector::{MatchSelector, Similarity};
