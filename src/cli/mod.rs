//! Command-line interface for near-match.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **match**: Match every file in a main directory against a candidate pool and write
//!   the manifest
//! - **compare**: Show the full similarity breakdown for two files
//!
//! ## Usage
//!
//! ```text
//! # Write a manifest for ./album against everything under /library
//! near-match match --main ./album --candidates /library -o manifest.txt
//!
//! # Skip unreadable candidates instead of aborting
//! near-match match --main ./album --candidates /library -o - --on-unreadable skip
//!
//! # Rewrite the library prefix in the manifest
//! near-match match --main ./album --candidates /library -o manifest.txt \
//!     --strip-prefix /library --replace-prefix D:/Music
//!
//! # Inspect one pair
//! near-match compare a.mp3 b.mp3 --format json
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::MatchConfig;

pub mod compare;
pub mod matching;

#[derive(Parser)]
#[command(name = "near-match")]
#[command(version)]
#[command(about = "Match files against a candidate pool by approximate content")]
#[command(
    long_about = "near-match pairs every file in a main directory with the first file in a candidate pool whose content is nearly identical.\n\nTwo files are similar when:\n- their sizes are within the size tolerance of each other, and\n- the bytes they share, divided by the larger file's size, reach the similarity threshold\n\nThe result is a manifest with one line per main file: the matched candidate's path, or notfound:<main file path>."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for summaries and comparison results
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match a main directory against a candidate pool and write a manifest
    #[command(
        long_about = "Match a main directory against a candidate pool and write a manifest.\n\nMain files are listed in numeric-aware order and each is paired with the first similar candidate.\n\nIf the main directory lies under a candidate root, a main file is never matched to itself; pass --keep-self to allow it."
    )]
    Match(matching::MatchArgs),

    /// Compare two files and show the similarity breakdown
    Compare(compare::CompareArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Comparator settings shared by every subcommand
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ComparatorArgs {
    /// Path to a JSON config file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum smaller/larger size ratio before content is compared (default 0.90)
    #[arg(long)]
    pub size_tolerance: Option<f64>,

    /// Minimum fraction of equal bytes, relative to the larger file (default 0.95)
    #[arg(long)]
    pub similarity_threshold: Option<f64>,

    /// Bytes read from each file per step (default 8192)
    #[arg(long)]
    pub chunk_bytes: Option<usize>,
}

impl ComparatorArgs {
    /// Load the config file if given, then apply flag overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or a value is out of range.
    pub fn resolve(&self) -> anyhow::Result<MatchConfig> {
        let mut config = match &self.config {
            Some(path) => MatchConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => MatchConfig::default(),
        };

        if let Some(value) = self.size_tolerance {
            config.comparator.size_tolerance = value;
        }
        if let Some(value) = self.similarity_threshold {
            config.comparator.content_similarity_threshold = value;
        }
        if let Some(value) = self.chunk_bytes {
            config.comparator.chunk_bytes = value;
        }

        config.validate()?;
        Ok(config)
    }
}
