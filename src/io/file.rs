use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use super::ByteSource;

/// A CSV file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    id: String,
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = path.to_string_lossy().into_owned();
        Self { id, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        // The line reader pulls fixed 4 KiB chunks, so a larger OS read
        // buffer cuts syscalls on big files.
        let file = File::open(&self.path)?;
        Ok(Box::new(BufReader::with_capacity(64 * 1024, file)))
    }
}
