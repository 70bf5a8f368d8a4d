//! Pull-based tar framing.
//!
//! [`TarReader`] emits a GNU tar archive one block at a time as the consumer
//! reads. Only the entry currently being archived is open.

use std::io::{self, Cursor, Read};
use std::sync::Arc;

use tar::{EntryType, Header};
use tracing::debug;

use crate::entry::PackageEntry;
use crate::error::{AssembleError, Result};

const BLOCK_SIZE: u64 = 512;
const NAME_FIELD_LEN: usize = 100;
const LONG_LINK_NAME: &[u8] = b"././@LongLink";

pub(crate) struct TarReader {
    entries: Arc<[PackageEntry]>,
    next: usize,
    mtime: u64,
    spool_threshold: usize,
    /// Header, padding and trailer bytes waiting to be read.
    staged: Cursor<Vec<u8>>,
    body: Option<Body>,
    finished: bool,
    failed: bool,
}

struct Body {
    reader: Box<dyn Read + Send>,
    size: u64,
}

impl TarReader {
    pub fn new(entries: Arc<[PackageEntry]>, mtime: u64, spool_threshold: usize) -> Self {
        Self {
            entries,
            next: 0,
            mtime,
            spool_threshold,
            staged: Cursor::new(Vec::new()),
            body: None,
            finished: false,
            failed: false,
        }
    }

    fn start_entry(&mut self, entry: &PackageEntry) -> Result<()> {
        let materialized = entry.materialize(self.spool_threshold)?;
        debug!(entry = entry.name(), size = materialized.size, "Archiving tar entry");
        self.staged = Cursor::new(header_blocks(entry.name(), materialized.size, self.mtime));
        self.body = Some(Body {
            reader: materialized.reader,
            size: materialized.size,
        });
        Ok(())
    }

    fn read_inner(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let n = self.staged.read(buf)?;
            if n > 0 {
                return Ok(n);
            }

            if let Some(body) = self.body.as_mut() {
                let n = body.reader.read(buf)?;
                if n > 0 {
                    return Ok(n);
                }
                let padding = padding_len(body.size);
                self.body = None;
                self.staged = Cursor::new(vec![0; padding]);
                continue;
            }

            if self.finished {
                return Ok(0);
            }

            let entries = Arc::clone(&self.entries);
            match entries.get(self.next) {
                Some(entry) => {
                    self.next += 1;
                    self.start_entry(entry).map_err(AssembleError::into_io)?;
                }
                None => {
                    self.staged = Cursor::new(vec![0; 2 * BLOCK_SIZE as usize]);
                    self.finished = true;
                }
            }
        }
    }
}

impl Read for TarReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.failed {
            return Err(AssembleError::StreamFailed.into_io());
        }
        if buf.is_empty() {
            return Ok(0);
        }
        let result = self.read_inner(buf);
        if result.is_err() {
            self.failed = true;
            self.body = None;
        }
        result
    }
}

fn padding_len(size: u64) -> usize {
    ((BLOCK_SIZE - size % BLOCK_SIZE) % BLOCK_SIZE) as usize
}

/// Header blocks for one regular file, preceded by a GNU long-name record
/// when the name does not fit the 100-byte name field.
fn header_blocks(name: &str, size: u64, mtime: u64) -> Vec<u8> {
    let name = name.as_bytes();
    let mut out = Vec::with_capacity(3 * BLOCK_SIZE as usize);

    if name.len() >= NAME_FIELD_LEN {
        let mut long = Header::new_gnu();
        long.as_old_mut().name[..LONG_LINK_NAME.len()].copy_from_slice(LONG_LINK_NAME);
        long.set_mode(0o644);
        long.set_uid(0);
        long.set_gid(0);
        long.set_mtime(0);
        long.set_size(name.len() as u64 + 1);
        long.set_entry_type(EntryType::GNULongName);
        long.set_cksum();
        out.extend_from_slice(long.as_bytes());
        out.extend_from_slice(name);
        out.push(0);
        out.resize(out.len() + padding_len(name.len() as u64 + 1), 0);
    }

    let mut header = Header::new_gnu();
    let field_len = name.len().min(NAME_FIELD_LEN - 1);
    header.as_old_mut().name[..field_len].copy_from_slice(&name[..field_len]);
    header.set_mode(0o644);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(mtime);
    header.set_size(size);
    header.set_entry_type(EntryType::Regular);
    header.set_cksum();
    out.extend_from_slice(header.as_bytes());
    out
}
