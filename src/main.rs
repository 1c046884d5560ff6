use clap::Parser;
use tracing_subscriber::EnvFilter;

use near_match::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Progress lines go to stderr at info; --verbose adds per-step detail
    let filter = if cli.verbose {
        EnvFilter::new("near_match=debug,info")
    } else {
        EnvFilter::new("near_match=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Match(args) => {
            cli::matching::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Compare(args) => {
            cli::compare::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
