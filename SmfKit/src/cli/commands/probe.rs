//! CLI command for reading the format version

use std::path::Path;

use anyhow::Context;

use crate::binary;
use crate::binary::HeaderCodec;

pub fn execute(file: &Path) -> anyhow::Result<()> {
    let version = binary::probe(super::open(file)?)
        .with_context(|| format!("{} is not an SMF file", file.display()))?;
    let support = if HeaderCodec::for_reading(version).is_some() {
        "supported"
    } else {
        "unsupported"
    };
    println!("SMF {version} ({support})");
    Ok(())
}
