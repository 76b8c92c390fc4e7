use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use zipper::Compression;

#[derive(Parser)]
#[command(version, about = "Generate random binary fixtures and a zip archive holding them", long_about = None)]
struct Cli {
    /// Directory to write `small`, `large` and `test.zip` into
    #[arg(value_name = "DEST", default_value = assets::DEFAULT_DEST)]
    dest: PathBuf,

    /// Deflate archive entries instead of storing them
    #[arg(long)]
    deflate: bool,

    /// Re-read the generated files and check sizes, entries and contents
    #[arg(long)]
    verify: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .init();

    let compression = if cli.deflate {
        Compression::Deflated
    } else {
        Compression::Stored
    };

    let report = assets::generate(&cli.dest, compression)
        .with_context(|| format!("Failed to generate fixtures in {}", cli.dest.display()))?;

    if cli.verify {
        assets::verify(&cli.dest)
            .with_context(|| format!("Fixtures in {} did not verify", cli.dest.display()))?;
        tracing::info!(dest = %cli.dest.display(), "fixtures verified");
    }

    print!("{}", report);
    Ok(())
}
