//! Assemble submissions into package files.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{info, info_span};

use nihms_assembler::{Assembler, NihmsAssembler, PackageOptions, PackageStream};
use nihms_model::{Submission, SubmissionDocument};

/// A package written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPackage {
    pub path: PathBuf,
    pub name: String,
    pub spec: String,
    pub mime_type: String,
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the package bytes.
    pub sha256: String,
}

/// Load a submission document and resolve its file references.
pub fn load_submission(path: &Path) -> Result<Submission> {
    let document = SubmissionDocument::from_path(path)
        .with_context(|| format!("load submission {}", path.display()))?;
    document
        .into_submission()
        .with_context(|| format!("resolve submission {}", path.display()))
}

pub fn assemble(submission: &Submission, options: PackageOptions) -> Result<PackageStream> {
    NihmsAssembler::new(options)
        .assemble(submission)
        .with_context(|| format!("assemble submission {}", submission.id))
}

/// Stream the package into `output_dir` under its derived name.
///
/// Bytes go to a temporary file in the same directory, which is renamed into
/// place only once the whole package has been produced.
pub fn write_package(stream: &PackageStream, output_dir: &Path) -> Result<WrittenPackage> {
    let metadata = stream.metadata();
    let name = metadata
        .name()
        .ok_or_else(|| anyhow!("package has no derived name"))?
        .to_string();
    let span = info_span!("write_package", package = %name);
    let _guard = span.enter();

    fs::create_dir_all(output_dir)
        .with_context(|| format!("create {}", output_dir.display()))?;
    let temp = NamedTempFile::new_in(output_dir)
        .with_context(|| format!("create temporary file in {}", output_dir.display()))?;
    let mut writer = HashingWriter::new(BufWriter::new(temp));
    let bytes = stream
        .write_to(&mut writer)
        .with_context(|| format!("write package {name}"))?;
    let (temp, digest) = writer.finish()?;
    let temp = temp
        .into_inner()
        .map_err(|error| anyhow!("flush package {name}: {}", error.error()))?;

    let path = output_dir.join(&name);
    temp.persist(&path)
        .with_context(|| format!("move package into {}", path.display()))?;
    info!(path = %path.display(), bytes, sha256 = %digest, "Wrote package");

    Ok(WrittenPackage {
        path,
        name,
        spec: metadata.spec().to_string(),
        mime_type: metadata.mime_type().to_string(),
        bytes,
        sha256: digest,
    })
}

/// Stream one package entry into `out`.
pub fn write_resource(stream: &PackageStream, name: &str, out: &mut dyn Write) -> Result<u64> {
    let mut reader = stream
        .open_resource(name)
        .with_context(|| format!("open resource {name}"))?;
    io::copy(&mut reader, out)
        .map_err(nihms_assembler::AssembleError::from_stream_error)
        .with_context(|| format!("read resource {name}"))
}

/// Writer that hashes everything written through it.
pub struct HashingWriter<W: Write> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    /// Flush and return the inner writer with the hex digest.
    pub fn finish(mut self) -> io::Result<(W, String)> {
        self.inner.flush()?;
        Ok((self.inner, hex::encode(self.hasher.finalize())))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_writer_digest() {
        let mut writer = HashingWriter::new(Vec::new());
        writer.write_all(b"abc").unwrap();
        let (bytes, digest) = writer.finish().unwrap();
        assert_eq!(bytes, b"abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
