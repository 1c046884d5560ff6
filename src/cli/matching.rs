use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::cli::{ComparatorArgs, OutputFormat};
use crate::config::UnreadablePolicy;
use crate::core::record::{MatchRecord, MatchSummary};
use crate::matching::engine::MatchingEngine;
use crate::output::{render_line, render_manifest, write_manifest, PathNormalizer};
use crate::scan::{discover_candidates, list_queries, ScanOptions};

#[derive(Args)]
pub struct MatchArgs {
    /// Directory holding the main files; listed without recursion
    #[arg(long, required = true)]
    pub main: PathBuf,

    /// Candidate root directories, searched recursively in the order given
    #[arg(long, required = true, num_args = 1..)]
    pub candidates: Vec<PathBuf>,

    /// Manifest destination ('-' for stdout)
    #[arg(short, long, required = true)]
    pub output: PathBuf,

    #[command(flatten)]
    pub comparator: ComparatorArgs,

    /// What to do when a file cannot be read during comparison
    #[arg(long, value_enum)]
    pub on_unreadable: Option<UnreadablePolicy>,

    /// Only consider files with this extension (repeatable)
    #[arg(short, long = "extension")]
    pub extensions: Vec<String>,

    /// Skip this path while searching candidates (repeatable)
    #[arg(long)]
    pub exclude: Vec<PathBuf>,

    /// Follow symbolic links
    #[arg(long)]
    pub follow_links: bool,

    /// Prefix to rewrite in manifest paths
    #[arg(long)]
    pub strip_prefix: Option<String>,

    /// Replacement for --strip-prefix (default: remove the prefix)
    #[arg(long, requires = "strip_prefix")]
    pub replace_prefix: Option<String>,

    /// Allow a main file to match itself when it also lies under a candidate root
    #[arg(long)]
    pub keep_self: bool,
}

/// Execute match subcommand
///
/// # Errors
///
/// Returns an error if configuration is invalid, a directory cannot be scanned, a
/// comparison fails under the abort policy, or the manifest cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: MatchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let mut config = args.comparator.resolve()?;
    if let Some(policy) = args.on_unreadable {
        config.on_unreadable = policy;
    }
    if args.keep_self {
        config.exclude_self = false;
    }

    if verbose {
        eprintln!(
            "Size tolerance {:.2}, similarity threshold {:.2}, chunk {} bytes, on unreadable: {:?}",
            config.comparator.size_tolerance,
            config.comparator.content_similarity_threshold,
            config.comparator.chunk_bytes,
            config.on_unreadable,
        );
    }

    let options = ScanOptions {
        exclude: args.exclude.clone(),
        follow_links: args.follow_links,
        ..ScanOptions::default()
    }
    .with_extensions(&args.extensions);

    let queries = list_queries(&args.main, &options)
        .with_context(|| format!("Failed to list main directory {}", args.main.display()))?;
    let candidates =
        discover_candidates(&args.candidates, &options).context("Failed to search candidates")?;

    info!(
        "Matching {} main files against {} candidates",
        queries.len(),
        candidates.len()
    );

    let engine = MatchingEngine::new(&config);
    let records = engine
        .run(&queries, &candidates)
        .context("Matching aborted")?;

    let normalizer = match &args.strip_prefix {
        Some(strip) => PathNormalizer::new()
            .with_prefix_rewrite(strip, args.replace_prefix.as_deref().unwrap_or("")),
        None => PathNormalizer::new(),
    };

    let manifest = render_manifest(&records, &normalizer);
    write_manifest(&args.output, &manifest)?;

    let summary = MatchSummary::from_records(&records);
    info!(
        "{} matched, {} not found",
        summary.matched, summary.unmatched
    );

    // The manifest already owns stdout
    if is_stdout(&args.output) {
        return Ok(());
    }

    match format {
        OutputFormat::Text => print_text_summary(&args.output, &records, &summary),
        OutputFormat::Json => print_json_summary(&args.output, &records, &summary, &normalizer)?,
        OutputFormat::Tsv => print_tsv_records(&records),
    }

    Ok(())
}

fn is_stdout(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn print_text_summary(output: &Path, records: &[MatchRecord], summary: &MatchSummary) {
    println!("Match Results");
    println!("{}", "=".repeat(60));
    println!("\nMain files: {}", summary.total);
    println!("  Matched: {}", summary.matched);
    println!("  Not found: {}", summary.unmatched);

    let unmatched: Vec<&MatchRecord> = records.iter().filter(|r| !r.is_matched()).collect();
    if !unmatched.is_empty() {
        println!("\nNot found:");
        for record in unmatched {
            println!("  - {}", record.query());
        }
    }

    println!("\nManifest written to {}", output.display());
}

fn print_json_summary(
    output: &Path,
    records: &[MatchRecord],
    summary: &MatchSummary,
    normalizer: &PathNormalizer,
) -> anyhow::Result<()> {
    let entries: Vec<serde_json::Value> = records
        .iter()
        .map(|r| {
            let mut json = serde_json::to_value(r)?;
            json["line"] = serde_json::json!(render_line(r, normalizer));
            Ok(json)
        })
        .collect::<Result<_, serde_json::Error>>()?;

    let out = serde_json::json!({
        "manifest": output.display().to_string(),
        "summary": summary,
        "records": entries,
    });

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn print_tsv_records(records: &[MatchRecord]) {
    println!("query\tstatus\tcandidate");
    for record in records {
        match record {
            MatchRecord::Matched { query, candidate } => {
                println!("{query}\tmatched\t{candidate}");
            }
            MatchRecord::Unmatched { query } => println!("{query}\tunmatched\t"),
        }
    }
}
