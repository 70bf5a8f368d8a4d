//! Package assembly.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use nihms_model::{DepositFile, Submission};

use crate::bulk_meta::{BULK_META_NAME, MetadataSerializer};
use crate::entry::PackageEntry;
use crate::error::{AssembleError, Result};
use crate::format::{ArchiveFormat, CompressionFormat};
use crate::manifest::{MANIFEST_NAME, ManifestSerializer};
use crate::metadata::MetadataBuilder;
use crate::naming::{SPEC_NIHMS_NATIVE_2017_07, TimestampPattern, name_package};
use crate::resource::{DefaultResourceBuilder, ResourceBuilder};
use crate::stream::PackageStream;

/// Default in-memory limit for spooled entries before they move to disk.
pub const DEFAULT_SPOOL_THRESHOLD: usize = 8 * 1024 * 1024;

/// Builds a package stream from a submission.
pub trait Assembler {
    /// Validate `submission` and return its package stream.
    ///
    /// # Errors
    ///
    /// Only build-time errors are returned here; anything that depends on
    /// source content surfaces when the stream is read.
    fn assemble(&self, submission: &Submission) -> Result<PackageStream>;
}

/// Container and naming settings for assembled packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageOptions {
    pub archive: ArchiveFormat,
    pub compression: CompressionFormat,
    pub timestamp_pattern: TimestampPattern,
    /// Bytes kept in memory when an entry has to be spooled.
    pub spool_threshold: usize,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            archive: ArchiveFormat::Tar,
            compression: CompressionFormat::Gzip,
            timestamp_pattern: TimestampPattern::default(),
            spool_threshold: DEFAULT_SPOOL_THRESHOLD,
        }
    }
}

/// Assembler for the `nihms-native-2017-07` package layout.
pub struct NihmsAssembler {
    options: PackageOptions,
    resource_builder: Arc<dyn ResourceBuilder>,
}

impl NihmsAssembler {
    pub fn new(options: PackageOptions) -> Self {
        Self {
            options,
            resource_builder: Arc::new(DefaultResourceBuilder),
        }
    }

    #[must_use]
    pub fn with_resource_builder(mut self, resource_builder: Arc<dyn ResourceBuilder>) -> Self {
        self.resource_builder = resource_builder;
        self
    }

    pub fn options(&self) -> &PackageOptions {
        &self.options
    }

    /// Assemble with an explicit assembly time, used for the package name and
    /// the archive entry timestamps.
    pub fn assemble_at(
        &self,
        submission: &Submission,
        timestamp: DateTime<Utc>,
    ) -> Result<PackageStream> {
        let options = &self.options;
        if options.archive == ArchiveFormat::None {
            return Err(AssembleError::invalid_format(
                "a package holds several entries and needs an archive format",
            ));
        }
        validate_files(&submission.files)?;
        validate_manifest(submission)?;

        let builder = MetadataBuilder::new()
            .spec(SPEC_NIHMS_NATIVE_2017_07)
            .archive(options.archive)
            .archived(true)
            .compression(options.compression)
            .compressed(options.compression != CompressionFormat::None);
        let metadata = name_package(submission, builder, timestamp, options.timestamp_pattern)?
            .build()?;

        let mut entries = Vec::with_capacity(submission.files.len() + 2);
        entries.push(PackageEntry::metadata(MetadataSerializer::new(
            submission.metadata.clone(),
        )));
        entries.push(PackageEntry::manifest(ManifestSerializer::new(
            submission.manifest.clone(),
        )));
        for file in &submission.files {
            let resource = self.resource_builder.build(file);
            entries.push(PackageEntry::custodial(resource, file.clone()));
        }

        info!(
            submission = %submission.id,
            package = metadata.name().unwrap_or_default(),
            archive = %metadata.archive(),
            compression = %metadata.compression(),
            entries = entries.len(),
            "Assembled package"
        );
        Ok(PackageStream::new(
            metadata,
            entries,
            timestamp,
            options.spool_threshold,
        ))
    }
}

impl Default for NihmsAssembler {
    fn default() -> Self {
        Self::new(PackageOptions::default())
    }
}

impl Assembler for NihmsAssembler {
    fn assemble(&self, submission: &Submission) -> Result<PackageStream> {
        self.assemble_at(submission, Utc::now())
    }
}

fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.contains(['/', '\\']) {
        "name contains a path separator"
    } else if name.contains('\0') {
        "name contains a NUL byte"
    } else if name == "." || name == ".." {
        "name is a relative path component"
    } else {
        return Ok(());
    };
    Err(AssembleError::InvalidResourceName {
        name: name.to_string(),
        reason,
    })
}

fn validate_files(files: &[DepositFile]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::from([BULK_META_NAME, MANIFEST_NAME]);
    for file in files {
        validate_name(&file.name)?;
        if !seen.insert(file.name.as_str()) {
            return Err(AssembleError::NameCollision {
                name: file.name.clone(),
            });
        }
    }
    Ok(())
}

fn validate_manifest(submission: &Submission) -> Result<()> {
    let files: HashSet<&str> = submission.files.iter().map(|f| f.name.as_str()).collect();
    let mut listed = HashSet::new();
    for entry in &submission.manifest.entries {
        if !files.contains(entry.name.as_str()) {
            return Err(AssembleError::ManifestMismatch {
                message: format!("'{}' is listed but is not a custodial file", entry.name),
            });
        }
        if !listed.insert(entry.name.as_str()) {
            return Err(AssembleError::ManifestMismatch {
                message: format!("'{}' is listed more than once", entry.name),
            });
        }
    }
    if let Some(file) = submission
        .files
        .iter()
        .find(|file| !listed.contains(file.name.as_str()))
    {
        return Err(AssembleError::ManifestMismatch {
            message: format!("custodial file '{}' is not listed", file.name),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nihms_model::{FileType, Manifest, MemorySource, Metadata};

    fn file(name: &str) -> DepositFile {
        DepositFile::new(name, FileType::Manuscript, MemorySource::new(vec![1, 2, 3]))
    }

    #[test]
    fn rejects_unusable_names() {
        for name in ["", "dir/file.pdf", "dir\\file.pdf", "nul\0.pdf", ".", ".."] {
            let err = validate_name(name).unwrap_err();
            assert!(matches!(err, AssembleError::InvalidResourceName { .. }), "{name:?}");
        }
        assert!(validate_name("manuscript v2.pdf").is_ok());
    }

    #[test]
    fn rejects_duplicate_and_reserved_names() {
        let err = validate_files(&[file("a.pdf"), file("a.pdf")]).unwrap_err();
        assert!(matches!(err, AssembleError::NameCollision { ref name } if name == "a.pdf"));

        for reserved in [BULK_META_NAME, MANIFEST_NAME] {
            let err = validate_files(&[file(reserved)]).unwrap_err();
            assert!(matches!(err, AssembleError::NameCollision { .. }));
        }
    }

    #[test]
    fn manifest_must_cover_every_file_once() {
        let files = vec![file("a.pdf"), file("b.pdf")];
        let base = Submission::new("urn:s:1", files.clone(), Metadata::default());
        assert!(validate_manifest(&base).is_ok());

        let missing = base
            .clone()
            .with_manifest(Manifest::from_files(&files[..1]));
        assert!(matches!(
            validate_manifest(&missing).unwrap_err(),
            AssembleError::ManifestMismatch { .. }
        ));

        let extra = base
            .clone()
            .with_manifest(Manifest::from_files(&[file("a.pdf"), file("b.pdf"), file("c.pdf")]));
        assert!(matches!(
            validate_manifest(&extra).unwrap_err(),
            AssembleError::ManifestMismatch { .. }
        ));

        let twice = base.with_manifest(Manifest::from_files(&[
            file("a.pdf"),
            file("b.pdf"),
            file("a.pdf"),
        ]));
        assert!(
            validate_manifest(&twice)
                .unwrap_err()
                .to_string()
                .contains("more than once")
        );
    }

    #[test]
    fn archive_none_is_rejected() {
        let assembler = NihmsAssembler::new(PackageOptions {
            archive: ArchiveFormat::None,
            ..PackageOptions::default()
        });
        let submission = Submission::new("urn:s:1", vec![file("a.pdf")], Metadata::default());
        let err = assembler.assemble(&submission).unwrap_err();
        assert!(matches!(err, AssembleError::InvalidFormat { .. }));
        assert!(err.is_build_time());
    }

    #[test]
    fn tar_with_zip_compression_is_rejected() {
        let assembler = NihmsAssembler::new(PackageOptions {
            compression: CompressionFormat::Zip,
            ..PackageOptions::default()
        });
        let submission = Submission::new("urn:s:1", vec![file("a.pdf")], Metadata::default());
        assert!(matches!(
            assembler.assemble(&submission).unwrap_err(),
            AssembleError::InvalidFormat { .. }
        ));
    }

    #[test]
    fn default_options() {
        let options = PackageOptions::default();
        assert_eq!(options.archive, ArchiveFormat::Tar);
        assert_eq!(options.compression, CompressionFormat::Gzip);
        assert_eq!(options.timestamp_pattern, TimestampPattern::Standard);
        assert_eq!(options.spool_threshold, 8 * 1024 * 1024);
    }
}
