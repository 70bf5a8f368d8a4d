//! Package entries: the generated documents and the custodial files, in the
//! order they are archived.

use std::io::{self, Cursor, Read, Seek, SeekFrom};

use tempfile::SpooledTempFile;
use tracing::trace;

use nihms_model::DepositFile;

use crate::bulk_meta::MetadataSerializer;
use crate::document::DocumentSerializer;
use crate::error::{AssembleError, Result};
use crate::manifest::ManifestSerializer;
use crate::resource::PackageResource;

/// Where an entry's bytes come from.
#[derive(Debug, Clone)]
pub(crate) enum EntrySource {
    Metadata(MetadataSerializer),
    Manifest(ManifestSerializer),
    Custodial(DepositFile),
}

/// One entry of a package, with the descriptor exposed to consumers.
#[derive(Debug, Clone)]
pub(crate) struct PackageEntry {
    resource: PackageResource,
    source: EntrySource,
}

/// An entry opened for archiving: its exact length and a reader that yields
/// exactly that many bytes or fails.
pub(crate) struct Materialized {
    pub size: u64,
    pub reader: Box<dyn Read + Send>,
}

impl PackageEntry {
    pub fn metadata(serializer: MetadataSerializer) -> Self {
        let resource = PackageResource::new(serializer.name(), serializer.mime_type());
        Self {
            resource,
            source: EntrySource::Metadata(serializer),
        }
    }

    pub fn manifest(serializer: ManifestSerializer) -> Self {
        let resource = PackageResource::new(serializer.name(), serializer.mime_type());
        Self {
            resource,
            source: EntrySource::Manifest(serializer),
        }
    }

    pub fn custodial(resource: PackageResource, file: DepositFile) -> Self {
        Self {
            resource,
            source: EntrySource::Custodial(file),
        }
    }

    pub fn name(&self) -> &str {
        &self.resource.name
    }

    pub fn resource(&self) -> &PackageResource {
        &self.resource
    }

    /// Reader over the entry's own bytes, without archive framing.
    ///
    /// Documents render on the first read; custodial sources are opened now.
    pub fn open(&self) -> Result<Box<dyn Read + Send>> {
        match &self.source {
            EntrySource::Metadata(serializer) => Ok(Box::new(serializer.open())),
            EntrySource::Manifest(serializer) => Ok(Box::new(serializer.open())),
            EntrySource::Custodial(file) => {
                let inner = self.open_source(file)?;
                Ok(Box::new(CheckedReader::new(self.name(), inner, None)))
            }
        }
    }

    /// Open the entry for archiving.
    ///
    /// Archive headers need the length up front. Documents are rendered,
    /// custodial sources with a size hint are checked against it while they
    /// stream, and sources of unknown size are spooled first.
    pub fn materialize(&self, spool_threshold: usize) -> Result<Materialized> {
        let (size, reader): (u64, Box<dyn Read + Send>) = match &self.source {
            EntrySource::Metadata(serializer) => render(serializer)?,
            EntrySource::Manifest(serializer) => render(serializer)?,
            EntrySource::Custodial(file) => {
                let inner = self.open_source(file)?;
                match file.source.size_hint() {
                    Some(size) => (size, inner),
                    None => self.spool(inner, spool_threshold)?,
                }
            }
        };
        Ok(Materialized {
            size,
            reader: Box::new(CheckedReader::new(self.name(), reader, Some(size))),
        })
    }

    fn open_source(&self, file: &DepositFile) -> Result<Box<dyn Read + Send>> {
        file.source
            .open()
            .map_err(|source| AssembleError::SourceUnavailable {
                name: self.name().to_string(),
                source,
            })
    }

    fn spool(
        &self,
        inner: Box<dyn Read + Send>,
        spool_threshold: usize,
    ) -> Result<(u64, Box<dyn Read + Send>)> {
        let mut spool = SpooledTempFile::new(spool_threshold);
        let mut reader = CheckedReader::new(self.name(), inner, None);
        let size = io::copy(&mut reader, &mut spool).map_err(AssembleError::from_stream_error)?;
        spool.seek(SeekFrom::Start(0))?;
        trace!(
            resource = self.name(),
            size,
            on_disk = spool.is_rolled(),
            "Spooled resource of unknown size"
        );
        Ok((size, Box::new(spool)))
    }
}

fn render(serializer: &dyn DocumentSerializer) -> Result<(u64, Box<dyn Read + Send>)> {
    let bytes = serializer.render()?;
    Ok((bytes.len() as u64, Box::new(Cursor::new(bytes))))
}

/// Reader that names its source in errors and, when a length is given,
/// enforces it.
pub(crate) struct CheckedReader {
    name: String,
    inner: Box<dyn Read + Send>,
    expected: Option<u64>,
    consumed: u64,
    verified: bool,
}

impl CheckedReader {
    pub fn new(name: &str, inner: Box<dyn Read + Send>, expected: Option<u64>) -> Self {
        Self {
            name: name.to_string(),
            inner,
            expected,
            consumed: 0,
            verified: false,
        }
    }

    fn read_inner(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.inner.read(buf) {
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(AssembleError::SourceRead {
                        name: self.name.clone(),
                        source,
                    }
                    .into_io());
                }
                Ok(n) => return Ok(n),
            }
        }
    }

    fn mismatch(&self, expected: u64, actual: u64) -> io::Error {
        AssembleError::SizeMismatch {
            name: self.name.clone(),
            expected,
            actual,
        }
        .into_io()
    }
}

impl Read for CheckedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let Some(expected) = self.expected else {
            let n = self.read_inner(buf)?;
            self.consumed += n as u64;
            return Ok(n);
        };

        let remaining = expected - self.consumed;
        if remaining == 0 {
            if !self.verified {
                // One more byte from the source means it ran long.
                let mut probe = [0u8; 1];
                if self.read_inner(&mut probe)? > 0 {
                    return Err(self.mismatch(expected, expected + 1));
                }
                self.verified = true;
            }
            return Ok(0);
        }

        let limit = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let n = self.read_inner(&mut buf[..limit])?;
        if n == 0 {
            return Err(self.mismatch(expected, self.consumed));
        }
        self.consumed += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nihms_model::{FileType, MemorySource, OnceSource};

    fn checked(bytes: &'static [u8], expected: Option<u64>) -> CheckedReader {
        CheckedReader::new("data.bin", Box::new(Cursor::new(bytes)), expected)
    }

    fn read_all(reader: &mut impl Read) -> std::result::Result<Vec<u8>, AssembleError> {
        let mut out = Vec::new();
        reader
            .read_to_end(&mut out)
            .map_err(AssembleError::from_stream_error)?;
        Ok(out)
    }

    #[test]
    fn exact_length_passes() {
        assert_eq!(read_all(&mut checked(b"hello", Some(5))).unwrap(), b"hello");
        assert_eq!(read_all(&mut checked(b"", Some(0))).unwrap(), b"");
        assert_eq!(read_all(&mut checked(b"free", None)).unwrap(), b"free");
    }

    #[test]
    fn short_source_is_a_size_mismatch() {
        let err = read_all(&mut checked(b"abc", Some(5))).unwrap_err();
        assert!(matches!(
            err,
            AssembleError::SizeMismatch {
                expected: 5,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn long_source_is_a_size_mismatch() {
        let err = read_all(&mut checked(b"abcdefg", Some(5))).unwrap_err();
        assert!(matches!(
            err,
            AssembleError::SizeMismatch {
                expected: 5,
                actual: 6,
                ..
            }
        ));
    }

    #[test]
    fn unknown_size_is_spooled() {
        let file = DepositFile::new(
            "stream.bin",
            FileType::Supplement,
            OnceSource::new("stream", Cursor::new(vec![7u8; 300])),
        )
        .with_label("Data");
        let entry = PackageEntry::custodial(
            PackageResource::new("stream.bin", "application/octet-stream"),
            file,
        );

        let mut materialized = entry.materialize(64).unwrap();
        assert_eq!(materialized.size, 300);
        assert_eq!(read_all(&mut materialized.reader).unwrap(), vec![7u8; 300]);

        let err = entry.materialize(64).err().unwrap();
        assert!(matches!(err, AssembleError::SourceUnavailable { .. }));
    }

    #[test]
    fn documents_render_when_materialized() {
        let manifest = nihms_model::Manifest::from_files(&[DepositFile::new(
            "manuscript.pdf",
            FileType::Manuscript,
            MemorySource::new(vec![1, 2, 3]),
        )]);
        let entry = PackageEntry::manifest(ManifestSerializer::new(manifest));
        assert_eq!(entry.name(), "manifest.txt");
        assert_eq!(entry.resource().size_bytes, None);

        let mut materialized = entry.materialize(1024).unwrap();
        let expected = b"manuscript\t\tmanuscript.pdf\n";
        assert_eq!(materialized.size, expected.len() as u64);
        assert_eq!(read_all(&mut materialized.reader).unwrap(), expected);
    }
}
