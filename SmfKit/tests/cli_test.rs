#![cfg(feature = "cli")]

use smfkit::binary::BinarySerializer;
use smfkit::cli::commands::{check, dump, info, probe};
use smfkit::mesh::{AttributeValues, MemoryMesh};
use smfkit::model::{Attribute, Header};
use tempfile::tempdir;

fn write_mesh(path: &std::path::Path) {
    let header = Header::builder()
        .with_vertex_count(3)
        .with_triangles(1, 32)
        .with_attribute(Attribute::float("POSITION", 3, 32).unwrap())
        .build()
        .unwrap();
    let mut mesh = MemoryMesh::new(header);
    mesh.set_attribute(
        "POSITION",
        AttributeValues::Floating(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
    )
    .unwrap();
    mesh.set_triangles(vec![[0, 1, 2]]).unwrap();
    let bytes = mesh.write_to(BinarySerializer::new(Vec::new())).unwrap();
    std::fs::write(path, bytes).unwrap();
}

#[test]
fn test_commands_accept_valid_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("triangle.smf");
    write_mesh(&path);

    probe::execute(&path).unwrap();
    info::execute(&path, false).unwrap();
    info::execute(&path, true).unwrap();
    check::execute(&path).unwrap();
    dump::execute(&path, None).unwrap();
    dump::execute(&path, Some("POSITION")).unwrap();
    assert!(dump::execute(&path, Some("NORMAL")).is_err());
}

#[test]
fn test_check_rejects_truncated_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("truncated.smf");
    write_mesh(&path);
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 40]).unwrap();

    assert!(check::execute(&path).is_err());
    assert!(dump::execute(&path, None).is_err());
}

#[test]
fn test_missing_file_is_reported() {
    let dir = tempdir().unwrap();
    let err = probe::execute(&dir.path().join("absent.smf")).unwrap_err();
    assert!(err.to_string().contains("Failed to open"));
}
