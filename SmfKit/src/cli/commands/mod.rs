use clap::Subcommand;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;

pub mod check;
pub mod dump;
pub mod info;
pub mod probe;

#[derive(Subcommand)]
pub enum Commands {
    /// Print the format version of an SMF file
    Probe {
        /// SMF file
        file: PathBuf,
    },

    /// Summarize the header of an SMF file
    Info {
        /// SMF file
        file: PathBuf,

        /// Print the header as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a whole SMF file and report every warning and error
    Check {
        /// SMF file
        file: PathBuf,
    },

    /// Print vertex values and triangles as text
    Dump {
        /// SMF file
        file: PathBuf,

        /// Only print this attribute (triangles are skipped)
        #[arg(short, long)]
        attribute: Option<String>,
    },
}

impl Commands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Probe { file } => probe::execute(file),
            Commands::Info { file, json } => info::execute(file, *json),
            Commands::Check { file } => check::execute(file),
            Commands::Dump { file, attribute } => dump::execute(file, attribute.as_deref()),
        }
    }
}

/// Open `path` for buffered reading.
pub(crate) fn open(path: &Path) -> anyhow::Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

/// Join parse errors into one report.
pub(crate) fn describe_errors(errors: &[crate::ParseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
