//! Tests for the file byte source.

use std::io::{ErrorKind, Read, Write};

use crate::io::{ByteSource, FileSource};

#[test]
fn reads_file_contents() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"id,name\n1,ann\n").unwrap();

    let source = FileSource::new(file.path());
    assert_eq!(source.path(), file.path());
    assert_eq!(source.id(), file.path().to_string_lossy());

    let mut text = String::new();
    source.open().unwrap().read_to_string(&mut text).unwrap();
    assert_eq!(text, "id,name\n1,ann\n");
}

#[test]
fn missing_file_fails_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let source = FileSource::new(dir.path().join("absent.csv"));
    let err = source.open().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
