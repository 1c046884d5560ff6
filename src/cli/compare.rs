use std::path::PathBuf;

use clap::Args;

use crate::cli::{ComparatorArgs, OutputFormat};
use crate::config::ComparatorConfig;
use crate::core::file_ref::FileRef;
use crate::matching::comparator::{Comparison, SimilarityComparator, Stage};

#[derive(Args)]
pub struct CompareArgs {
    /// First file
    #[arg(required = true)]
    pub input_a: PathBuf,

    /// Second file
    #[arg(required = true)]
    pub input_b: PathBuf,

    #[command(flatten)]
    pub comparator: ComparatorArgs,
}

/// Execute compare subcommand
///
/// # Errors
///
/// Returns an error if configuration is invalid or either file cannot be read.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CompareArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.comparator.resolve()?.comparator;

    if verbose {
        eprintln!(
            "Size tolerance {:.2}, similarity threshold {:.2}, chunk {} bytes",
            config.size_tolerance, config.content_similarity_threshold, config.chunk_bytes
        );
    }

    let a = FileRef::new(&args.input_a);
    let b = FileRef::new(&args.input_b);
    let result = SimilarityComparator::new(config).compare_detailed(&a, &b)?;

    match format {
        OutputFormat::Text => print_text_comparison(&args, &config, &result),
        OutputFormat::Json => print_json_comparison(&args, &config, &result)?,
        OutputFormat::Tsv => print_tsv_comparison(&result),
    }

    Ok(())
}

fn percent(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "-".to_string(), |r| format!("{:.2}%", r * 100.0))
}

fn print_text_comparison(args: &CompareArgs, config: &ComparatorConfig, result: &Comparison) {
    println!("Comparison Results");
    println!("{}", "=".repeat(60));

    println!("\nInput A: {}", args.input_a.display());
    println!("  Size: {} bytes", result.size_a);

    println!("\nInput B: {}", args.input_b.display());
    println!("  Size: {} bytes", result.size_b);

    println!("\nSimilarity:");
    println!(
        "  Size ratio: {:.2}% (gate {:.0}%)",
        result.size_ratio * 100.0,
        config.size_tolerance * 100.0
    );
    match result.matching_bytes {
        Some(bytes) => println!("  Matching bytes: {bytes} of {}", result.max_size()),
        None => println!("  Matching bytes: not scanned"),
    }
    println!(
        "  Similarity ratio: {} (threshold {:.0}%)",
        percent(result.similarity_ratio),
        config.content_similarity_threshold * 100.0
    );

    let reason = match result.decided_by {
        Stage::Empty => "empty file",
        Stage::SizeGate => "size gate",
        Stage::Content => "content scan",
    };
    println!(
        "  Verdict: {} ({reason})",
        if result.similar { "SIMILAR" } else { "DIFFERENT" }
    );
}

fn print_json_comparison(
    args: &CompareArgs,
    config: &ComparatorConfig,
    result: &Comparison,
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "input_a": {
            "path": args.input_a.display().to_string(),
            "size": result.size_a,
        },
        "input_b": {
            "path": args.input_b.display().to_string(),
            "size": result.size_b,
        },
        "config": config,
        "result": result,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_comparison(result: &Comparison) {
    println!("size_a\tsize_b\tsize_ratio\tmatching_bytes\tsimilarity_ratio\tdecided_by\tsimilar");
    println!(
        "{}\t{}\t{:.4}\t{}\t{}\t{:?}\t{}",
        result.size_a,
        result.size_b,
        result.size_ratio,
        result
            .matching_bytes
            .map_or_else(String::new, |b| b.to_string()),
        result
            .similarity_ratio
            .map_or_else(String::new, |r| format!("{r:.4}")),
        result.decided_by,
        result.similar,
    );
}
