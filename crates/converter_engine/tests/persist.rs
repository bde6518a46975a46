use std::fs;

use converter_engine::{ensure_output_dir, AtomicFileWriter, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("logo_converted.png", b"hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "logo_converted.png");
    assert_eq!(fs::read(&first).unwrap(), b"hello");

    let second = writer.write("logo_converted.png", b"world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"world");
}

#[test]
fn nested_names_create_directories() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let path = writer.write("photos/vacation/img1_converted.jpeg", b"x").unwrap();
    assert!(path.starts_with(temp.path().join("photos").join("vacation")));
    assert_eq!(fs::read(path).unwrap(), b"x");
}

#[test]
fn escaping_names_are_rejected() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().join("out"));

    for name in ["../outside.png", "", "/etc/passwd"] {
        let err = writer.write(name, b"x").unwrap_err();
        assert!(matches!(err, PersistError::InvalidName(_)), "{name}: {err}");
    }
    assert!(!temp.path().join("outside.png").exists());
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("doc.png", b"data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("doc.png").exists());
}
