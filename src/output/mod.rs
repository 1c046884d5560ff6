//! Manifest rendering and writing.
//!
//! Each [`MatchRecord`](crate::core::record::MatchRecord) becomes one line:
//!
//! | Record | Line |
//! |--------|------|
//! | matched | normalized candidate path |
//! | unmatched | `notfound:` + normalized query path |
//!
//! Lines are joined with `\n`; there is no trailing newline.

pub mod manifest;
pub mod paths;

pub use manifest::{render_line, render_manifest, write_manifest, OutputError, NOT_FOUND_PREFIX};
pub use paths::PathNormalizer;
