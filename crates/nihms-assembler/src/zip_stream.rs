//! Zip packages.
//!
//! The zip central directory is written after every entry and refers back to
//! entry offsets, so the archive is built into a spooled temp file on the
//! first read and then streamed from there.

use std::io::{self, Read, Seek, SeekFrom};
use std::mem;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Timelike, Utc};
use tempfile::SpooledTempFile;
use tracing::debug;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::entry::PackageEntry;
use crate::error::{AssembleError, Result};

enum ZipState {
    Pending,
    Ready(SpooledTempFile),
    Failed,
}

pub(crate) struct ZipReader {
    entries: Arc<[PackageEntry]>,
    method: CompressionMethod,
    modified: DateTime<Utc>,
    spool_threshold: usize,
    state: ZipState,
}

impl ZipReader {
    /// `deflate` selects per-entry deflate compression; otherwise entries are
    /// stored.
    pub fn new(
        entries: Arc<[PackageEntry]>,
        deflate: bool,
        modified: DateTime<Utc>,
        spool_threshold: usize,
    ) -> Self {
        let method = if deflate {
            CompressionMethod::Deflated
        } else {
            CompressionMethod::Stored
        };
        Self {
            entries,
            method,
            modified,
            spool_threshold,
            state: ZipState::Pending,
        }
    }

    fn build(&self) -> Result<SpooledTempFile> {
        let mut options = SimpleFileOptions::default()
            .compression_method(self.method)
            .unix_permissions(0o644);
        if let Some(modified) = zip_date_time(self.modified) {
            options = options.last_modified_time(modified);
        }

        let mut zip = ZipWriter::new(SpooledTempFile::new(self.spool_threshold));
        for entry in self.entries.iter() {
            let mut materialized = entry.materialize(self.spool_threshold)?;
            debug!(entry = entry.name(), size = materialized.size, "Archiving zip entry");
            let entry_options = options.large_file(materialized.size >= u64::from(u32::MAX));
            zip.start_file(entry.name(), entry_options)?;
            io::copy(&mut materialized.reader, &mut zip).map_err(AssembleError::from_stream_error)?;
        }
        let mut spool = zip.finish()?;
        spool.seek(SeekFrom::Start(0))?;
        Ok(spool)
    }
}

impl Read for ZipReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match mem::replace(&mut self.state, ZipState::Failed) {
            ZipState::Pending => {
                let spool = self.build().map_err(AssembleError::into_io)?;
                self.state = ZipState::Ready(spool);
            }
            state => self.state = state,
        }
        match &mut self.state {
            ZipState::Ready(spool) => spool.read(buf),
            ZipState::Pending | ZipState::Failed => Err(AssembleError::StreamFailed.into_io()),
        }
    }
}

/// Zip timestamps are MS-DOS date-times and cannot represent years before 1980.
fn zip_date_time(timestamp: DateTime<Utc>) -> Option<zip::DateTime> {
    let year = u16::try_from(timestamp.year()).ok()?;
    zip::DateTime::from_date_and_time(
        year,
        timestamp.month() as u8,
        timestamp.day() as u8,
        timestamp.hour() as u8,
        timestamp.minute() as u8,
        timestamp.second() as u8,
    )
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::PackageResource;
    use chrono::TimeZone;
    use nihms_model::{DepositFile, FileType, MemorySource};
    use std::io::Cursor;

    fn entries() -> Arc<[PackageEntry]> {
        ["a.txt", "b.txt"]
            .into_iter()
            .map(|name| {
                let file = DepositFile::new(
                    name,
                    FileType::Supplement,
                    MemorySource::new(name.repeat(50).into_bytes()),
                )
                .with_label(name);
                PackageEntry::custodial(PackageResource::new(name, "text/plain"), file)
            })
            .collect()
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 7, 14, 9, 30, 6).unwrap()
    }

    #[test]
    fn builds_readable_archive() {
        for deflate in [true, false] {
            let mut bytes = Vec::new();
            ZipReader::new(entries(), deflate, timestamp(), 64)
                .read_to_end(&mut bytes)
                .unwrap();

            let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
            assert_eq!(archive.len(), 2);
            let mut first = archive.by_index(0).unwrap();
            assert_eq!(first.name(), "a.txt");
            let expected = if deflate {
                CompressionMethod::Deflated
            } else {
                CompressionMethod::Stored
            };
            assert_eq!(first.compression(), expected);
            let mut text = String::new();
            first.read_to_string(&mut text).unwrap();
            assert_eq!(text, "a.txt".repeat(50));
        }
    }

    #[test]
    fn dos_timestamps_before_1980_are_skipped() {
        assert!(zip_date_time(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap()).is_none());
        assert!(zip_date_time(timestamp()).is_some());
    }
}
