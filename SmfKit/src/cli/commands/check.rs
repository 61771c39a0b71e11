//! CLI command for validating a whole file

use std::path::Path;

use anyhow::bail;
use tracing::info;

use crate::binary::{BinaryParser, ParserState};
use crate::mesh::MemoryMeshProducer;

pub fn execute(file: &Path) -> anyhow::Result<()> {
    let mut producer = MemoryMeshProducer::default();
    let state = BinaryParser::new(super::open(file)?).parse(&mut producer);

    for warning in producer.warnings() {
        println!("warning: {warning}");
    }
    for error in producer.errors() {
        println!("error: {error}");
    }

    if state == ParserState::Failed {
        bail!(
            "{} is invalid ({} errors)",
            file.display(),
            producer.errors().len()
        );
    }
    info!(
        "{} is valid ({} warnings)",
        file.display(),
        producer.warnings().len()
    );
    println!("OK");
    Ok(())
}
