//! SmfKit CLI - Command-line interface for SMF mesh files

pub mod commands;

use clap::Parser;
use commands::Commands;
use tracing::Level;

#[derive(Parser)]
#[command(name = "smfkit")]
#[command(about = "SmfKit: Simple Mesh Format tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Log section-level parser activity
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Run the SmfKit CLI
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    cli.command.execute()?;

    Ok(())
}
