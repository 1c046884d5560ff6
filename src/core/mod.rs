//! Core data types for file matching.
//!
//! - [`FileRef`](file_ref::FileRef): a file on disk, and the
//!   [`ContentSource`](file_ref::ContentSource) trait the comparator reads through
//! - [`MatchRecord`](record::MatchRecord): the per-query outcome
//! - [`ordering`]: the deterministic order of query files
//!
//! ## Query Ordering
//!
//! | Base names | Comparison |
//! |------------|------------|
//! | both integers | numeric (`2` before `10`) |
//! | both text | case-insensitive, then case-sensitive |
//! | one of each | the integer sorts first |

pub mod file_ref;
pub mod ordering;
pub mod record;
