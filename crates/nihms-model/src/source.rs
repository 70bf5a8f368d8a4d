//! Byte sources backing custodial files.
//!
//! A package build reads every custodial file through a [`ByteSource`].
//! Sources are opened when the package stream reaches their entry, and each
//! full package open reopens them, so a source that can only be read once
//! supports exactly one package build.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Something that can produce the bytes of one custodial file.
pub trait ByteSource: Send + Sync + fmt::Debug {
    /// Open a fresh reader over the source bytes.
    fn open(&self) -> io::Result<Box<dyn Read + Send>>;

    /// Exact length in bytes, when known without reading the source.
    fn size_hint(&self) -> Option<u64> {
        None
    }
}

/// A file on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(file))
    }

    fn size_hint(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|meta| meta.len())
    }
}

/// Bytes held in memory.
#[derive(Clone)]
pub struct MemorySource {
    bytes: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySource")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ByteSource for MemorySource {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(SharedBytes(Arc::clone(&self.bytes)))))
    }

    fn size_hint(&self) -> Option<u64> {
        Some(self.bytes.len() as u64)
    }
}

struct SharedBytes(Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A reader that can be handed out exactly once.
///
/// Useful for sources fetched from the network, where the caller owns the
/// retry policy and a second read would mean a second fetch.
pub struct OnceSource {
    label: String,
    size: Option<u64>,
    reader: Mutex<Option<Box<dyn Read + Send>>>,
}

impl OnceSource {
    pub fn new(label: impl Into<String>, reader: impl Read + Send + 'static) -> Self {
        Self {
            label: label.into(),
            size: None,
            reader: Mutex::new(Some(Box::new(reader))),
        }
    }

    /// Declare the exact length of the wrapped reader.
    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

impl fmt::Debug for OnceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnceSource")
            .field("label", &self.label)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl ByteSource for OnceSource {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        let mut guard = self
            .reader
            .lock()
            .map_err(|_| io::Error::other("source lock poisoned"))?;
        guard.take().ok_or_else(|| {
            io::Error::other(format!("source '{}' was already consumed", self.label))
        })
    }

    fn size_hint(&self) -> Option<u64> {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn read_all(source: &dyn ByteSource) -> Vec<u8> {
        let mut out = Vec::new();
        source.open().unwrap().read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_memory_source_reopens() {
        let source = MemorySource::new(b"hello".to_vec());
        assert_eq!(source.size_hint(), Some(5));
        assert_eq!(read_all(&source), b"hello");
        assert_eq!(read_all(&source), b"hello");
    }

    #[test]
    fn test_file_source_reports_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"manuscript bytes").unwrap();
        let source = FileSource::new(file.path());
        assert_eq!(source.size_hint(), Some(16));
        assert_eq!(read_all(&source), b"manuscript bytes");
    }

    #[test]
    fn test_file_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("absent.pdf"));
        assert_eq!(source.size_hint(), None);
        assert!(source.open().is_err());
    }

    #[test]
    fn test_once_source_single_use() {
        let source = OnceSource::new("upload", Cursor::new(b"abc".to_vec())).with_size(3);
        assert_eq!(source.size_hint(), Some(3));
        assert_eq!(read_all(&source), b"abc");

        let err = source.open().err().expect("second open must fail");
        assert!(err.to_string().contains("already consumed"));
    }
}
