//! CLI command for summarizing a mesh header

use std::path::Path;

use anyhow::{Context, bail};
use serde::Serialize;

use crate::binary::BinaryParser;
use crate::error::ParseError;
use crate::events::{BodyEvents, ErrorEvents, HeaderEvents, ParserEvents, Receive};
use crate::layout::PackingLayout;
use crate::model::{FormatVersion, Header};

/// Stops the parse as soon as the header is known.
#[derive(Default)]
struct HeaderOnly {
    version: Option<FormatVersion>,
    header: Option<Header>,
    errors: Vec<ParseError>,
}

impl ErrorEvents for HeaderOnly {
    fn on_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }
}

impl ParserEvents for HeaderOnly {
    fn on_version_received(&mut self, version: FormatVersion) -> Receive<&mut dyn HeaderEvents> {
        self.version = Some(version);
        Receive::Accepted(self)
    }
}

impl HeaderEvents for HeaderOnly {
    fn on_header_parsed(&mut self, header: &Header) -> Receive<&mut dyn BodyEvents> {
        self.header = Some(header.clone());
        Receive::Declined
    }
}

#[derive(Serialize)]
struct InfoReport<'a> {
    version: FormatVersion,
    vertex_stride_octets: usize,
    header: &'a Header,
}

pub fn execute(file: &Path, json: bool) -> anyhow::Result<()> {
    let mut receiver = HeaderOnly::default();
    BinaryParser::new(super::open(file)?).parse(&mut receiver);
    if !receiver.errors.is_empty() {
        bail!(
            "Failed to read header of {}:\n{}",
            file.display(),
            super::describe_errors(&receiver.errors)
        );
    }
    let (Some(version), Some(header)) = (receiver.version, receiver.header) else {
        bail!("{} has no header", file.display());
    };
    let layout = PackingLayout::from_header(&header).context("Failed to lay out attributes")?;

    if json {
        let report = InfoReport {
            version,
            vertex_stride_octets: layout.vertex_stride_octets(),
            header: &header,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Version:     {version}");
    match header.schema_identifier() {
        Some(schema) => println!("Schema:      {schema}"),
        None => println!("Schema:      (none)"),
    }
    println!("Coordinates: {}", header.coordinate_system());
    println!("Byte order:  {:?}", header.data_byte_order());
    println!("Vertices:    {}", header.vertex_count());
    println!(
        "Triangles:   {} ({}-bit indices)",
        header.triangles().count(),
        header.triangles().index_size_bits()
    );
    println!(
        "Attributes:  {} ({} octets per vertex)",
        header.attribute_count(),
        layout.vertex_stride_octets()
    );
    for packed in layout.packed_attributes() {
        let attribute = packed.attribute();
        println!(
            "  {:<24} {:<12} offset {}",
            attribute.name(),
            attribute.shape(),
            packed.offset_octets()
        );
    }
    Ok(())
}
