// Desktop/tooling crate: unwrap/expect/panic and unchecked arithmetic
// acceptable in non-embedded code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::arithmetic_side_effects
)]
#![allow(missing_docs)]

mod check;
mod image;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "PIC32MZ DA DDR2 bring-up development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the register writes DRAM boot performs for a board profile
    Image {
        /// Board profile JSON (e.g. boards/pic32mzda-starter-kit.json).
        /// Defaults to the built-in starter kit profile.
        #[arg(long)]
        profile: Option<PathBuf>,
        /// Output layout
        #[arg(long, value_enum, default_value_t = image::Format::Table)]
        format: image::Format,
    },
    /// Check builds with and without host features, clippy and formatting
    Check,
    /// Run all tests (unit and integration)
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
}

fn main() -> Result<()> {
    // RUST_LOG=debug shows every converted delay and register image.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Image { profile, format } => image::run(profile.as_deref(), format),
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
    }
}
