//! eppline: registry normalization and workflow tooling.
//!
//! # Usage
//!
//! ```text
//! eppline providers [--config PATH] [--json]
//! eppline normalize <kind> <file> [--provider ID] [--privileged] [--public]
//! eppline check <label> --fixtures <file> [--config PATH] [--json]
//! ```
//!
//! Logs go to stderr; set `EPPLINE_LOG` (e.g. `debug`, `eppline_workflow=trace`)
//! to change the filter.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check::CheckArgs, normalize::NormalizeArgs, providers::ProvidersArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "eppline",
    version,
    about = "Normalize registry responses and run registry workflows",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List configured registry providers and the zones they serve.
    Providers(ProvidersArgs),

    /// Normalize a recorded registry response into its canonical record.
    Normalize(NormalizeArgs),

    /// Check a label's availability in every zone of every active provider.
    Check(CheckArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Providers(args) => args.run(),
        Commands::Normalize(args) => args.run(),
        Commands::Check(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_env("EPPLINE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
