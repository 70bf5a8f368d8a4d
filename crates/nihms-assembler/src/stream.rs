//! The assembled package.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{Span, debug, info_span};

use crate::compress::compress;
use crate::entry::PackageEntry;
use crate::error::{AssembleError, Result};
use crate::format::{ArchiveFormat, CompressionFormat};
use crate::metadata::PackageMetadata;
use crate::resource::PackageResource;
use crate::tar_stream::TarReader;
use crate::zip_stream::ZipReader;

/// A package ready to be streamed.
///
/// Nothing is read from any source and no document is rendered until a
/// reader returned by [`open`](Self::open) or
/// [`open_resource`](Self::open_resource) is consumed. Every `open` starts
/// over: documents are rendered again and every custodial source is opened
/// again.
#[derive(Clone)]
pub struct PackageStream {
    metadata: PackageMetadata,
    entries: Arc<[PackageEntry]>,
    assembled_at: DateTime<Utc>,
    spool_threshold: usize,
}

impl PackageStream {
    pub(crate) fn new(
        metadata: PackageMetadata,
        entries: Vec<PackageEntry>,
        assembled_at: DateTime<Utc>,
        spool_threshold: usize,
    ) -> Self {
        Self {
            metadata,
            entries: entries.into(),
            assembled_at,
            spool_threshold,
        }
    }

    pub fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    /// Descriptors of every entry, in archive order: the metadata document,
    /// the manifest, then the custodial files in submission order.
    pub fn resources(&self) -> impl Iterator<Item = &PackageResource> + '_ {
        self.entries.iter().map(PackageEntry::resource)
    }

    /// Number of archive entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reader over the complete archived and compressed package.
    pub fn open(&self) -> PackageReader {
        let entries = Arc::clone(&self.entries);
        let archive: Box<dyn Read + Send> = match self.metadata.archive() {
            ArchiveFormat::Zip => Box::new(ZipReader::new(
                entries,
                self.metadata.compression() == CompressionFormat::Zip,
                self.assembled_at,
                self.spool_threshold,
            )),
            // Assembly rejects packages without an archive format.
            ArchiveFormat::Tar | ArchiveFormat::None => Box::new(TarReader::new(
                entries,
                u64::try_from(self.assembled_at.timestamp()).unwrap_or(0),
                self.spool_threshold,
            )),
        };
        let name = self.metadata.name().unwrap_or_default();
        PackageReader {
            inner: compress(archive, self.metadata.compression()),
            span: info_span!("package", name),
            produced: 0,
            state: ReaderState::Streaming,
        }
    }

    /// Reader over the bytes of one entry, without archive framing.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` for an unknown name and `SourceUnavailable` when a
    /// custodial source cannot be opened.
    pub fn open_resource(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.name() == name)
            .ok_or_else(|| AssembleError::ResourceNotFound {
                name: name.to_string(),
            })?;
        entry.open()
    }

    /// Stream the whole package into `writer`, returning the byte count.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<u64> {
        let mut reader = self.open();
        io::copy(&mut reader, writer).map_err(AssembleError::from_stream_error)
    }
}

impl fmt::Debug for PackageStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageStream")
            .field("name", &self.metadata.name())
            .field("archive", &self.metadata.archive())
            .field("compression", &self.metadata.compression())
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    Streaming,
    Finished,
    Failed,
}

/// Single-pass reader over a package.
///
/// Errors from any layer arrive as `io::Error`s wrapping an
/// [`AssembleError`]; once one has been returned every later read fails.
/// Dropping the reader closes whatever source is currently open.
pub struct PackageReader {
    inner: Box<dyn Read + Send>,
    span: Span,
    produced: u64,
    state: ReaderState,
}

impl PackageReader {
    /// Bytes produced so far.
    pub fn bytes_read(&self) -> u64 {
        self.produced
    }
}

impl Read for PackageReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.state {
            ReaderState::Failed => return Err(AssembleError::StreamFailed.into_io()),
            ReaderState::Finished => return Ok(0),
            ReaderState::Streaming => {}
        }
        let _enter = self.span.enter();
        match self.inner.read(buf) {
            Ok(0) if !buf.is_empty() => {
                self.state = ReaderState::Finished;
                debug!(bytes = self.produced, "Package stream complete");
                Ok(0)
            }
            Ok(n) => {
                self.produced += n as u64;
                Ok(n)
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => Err(error),
            Err(error) => {
                self.state = ReaderState::Failed;
                debug!(bytes = self.produced, %error, "Package stream failed");
                Err(error)
            }
        }
    }
}

impl fmt::Debug for PackageReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageReader")
            .field("produced", &self.produced)
            .field("state", &self.state)
            .finish()
    }
}
