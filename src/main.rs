//! CLI entry point for the photomosaic renderer

use clap::Parser;
use tracing_subscriber::EnvFilter;
use weaver::io::cli::{Cli, MosaicProcessor};

fn main() -> weaver::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.common().verbose);

    let mut processor = MosaicProcessor::new(cli);
    processor.process()?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
