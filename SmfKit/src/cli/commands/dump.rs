//! CLI command for printing mesh contents as text

use std::fmt::Display;
use std::path::Path;

use anyhow::bail;

use crate::mesh::{AttributeValues, MemoryMesh};

fn print_rows<T: Display>(values: &[T], count: usize) {
    for (vertex, chunk) in values.chunks(count).enumerate() {
        let row = chunk
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        println!("  {vertex}: {row}");
    }
}

pub fn execute(file: &Path, attribute: Option<&str>) -> anyhow::Result<()> {
    let mesh = match MemoryMesh::read(super::open(file)?) {
        Ok(mesh) => mesh,
        Err(errors) => bail!(
            "Failed to read {}:\n{}",
            file.display(),
            super::describe_errors(&errors)
        ),
    };
    let header = mesh.header();
    if let Some(name) = attribute {
        if header.attribute(name).is_none() {
            bail!("{} has no attribute named '{name}'", file.display());
        }
    }

    for descriptor in header.attributes() {
        let name = descriptor.name().as_str();
        if attribute.is_some_and(|wanted| wanted != name) {
            continue;
        }
        let Some(values) = mesh.attribute_values(name) else {
            continue;
        };
        println!("{name} ({})", descriptor.shape());
        let count = descriptor.component_count() as usize;
        match values {
            AttributeValues::Floating(v) => print_rows(v, count),
            AttributeValues::Signed(v) => print_rows(v, count),
            AttributeValues::Unsigned(v) => print_rows(v, count),
        }
    }

    if attribute.is_some() {
        return Ok(());
    }
    if !mesh.triangles().is_empty() {
        println!("triangles ({}-bit indices)", header.triangles().index_size_bits());
        for (index, [v0, v1, v2]) in mesh.triangles().iter().enumerate() {
            println!("  {index}: {v0} {v1} {v2}");
        }
    }
    for (schema, data) in mesh.metadata() {
        println!("metadata {schema}: {} octets", data.len());
    }
    Ok(())
}
