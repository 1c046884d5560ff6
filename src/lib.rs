//! # near-match
//!
//! Match files from an ordered "main" collection against a larger pool of candidate
//! files by approximate content, and produce an ordered manifest.
//!
//! Copies of the same file often drift apart slightly: re-tagged audio, a few corrupted
//! sectors, a truncated download. `near-match` treats two files as the same when their
//! sizes are close and almost all of their bytes agree, then picks the first such
//! candidate for every main file.
//!
//! ## Features
//!
//! - **Size gate**: pairs with very different sizes are rejected without being read
//! - **Byte-identity ratio**: equal bytes over the larger file's size, so truncation is
//!   penalized like corruption
//! - **First match wins**: candidates are scanned in a stable order and the scan stops at
//!   the first similar file
//! - **Natural ordering**: numerically named main files come out as `1, 2, 10`
//! - **Configurable policy** for unreadable candidates: abort the run or skip them
//!
//! ## Example
//!
//! ```rust,no_run
//! use near_match::{FileRef, SimilarityComparator};
//!
//! let comparator = SimilarityComparator::default();
//! let same = comparator
//!     .compare(&FileRef::new("a.mp3"), &FileRef::new("b.mp3"))
//!     .unwrap();
//! println!("similar: {same}");
//! ```
//!
//! ## Modules
//!
//! - [`core`]: file references, match records, query ordering
//! - [`matching`]: comparator, selector and engine
//! - [`scan`]: query listing and candidate discovery
//! - [`output`]: path normalization and manifest writing
//! - [`config`]: thresholds and policies
//! - [`cli`]: command-line interface implementation

pub mod cli;
pub mod config;
pub mod core;
pub mod matching;
pub mod output;
pub mod scan;

// Re-export commonly used types for convenience
pub use crate::config::{ComparatorConfig, MatchConfig, UnreadablePolicy};
pub use crate::core::file_ref::{ContentSource, FileRef};
pub use crate::core::record::{MatchRecord, MatchSummary};
pub use crate::matching::comparator::{CompareError, Comparison, SimilarityComparator};
pub use crate::matching::engine::MatchingEngine;
pub use crate::matching::selector::MatchSelector;
