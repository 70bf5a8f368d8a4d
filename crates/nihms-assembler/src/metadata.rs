//! Package-level metadata.
//!
//! [`MetadataBuilder`] accumulates the descriptive facts of a package through
//! consuming setters; [`MetadataBuilder::build`] checks them and produces an
//! immutable [`PackageMetadata`] snapshot. The builder is a plain value, so a
//! snapshot never observes later changes to the builder it came from.

use crate::error::{AssembleError, Result};
use crate::format::{ArchiveFormat, CompressionFormat};

/// Mime type of gzip-compressed packages.
pub const APPLICATION_GZIP: &str = "application/gzip";
const APPLICATION_BZIP2: &str = "application/x-bzip2";
const APPLICATION_ZIP: &str = "application/zip";
const APPLICATION_TAR: &str = "application/x-tar";
const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

/// Accumulates package metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataBuilder {
    spec: Option<String>,
    archive: Option<ArchiveFormat>,
    archived: Option<bool>,
    compression: Option<CompressionFormat>,
    compressed: Option<bool>,
    mime_type: Option<String>,
    name: Option<String>,
    size_bytes: Option<u64>,
}

impl MetadataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Packaging specification the serialization adheres to.
    #[must_use]
    pub fn spec(mut self, spec: impl Into<String>) -> Self {
        self.spec = Some(spec.into());
        self
    }

    #[must_use]
    pub fn archive(mut self, archive: ArchiveFormat) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Override the archived flag. Must agree with the archive format.
    #[must_use]
    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = Some(archived);
        self
    }

    #[must_use]
    pub fn compression(mut self, compression: CompressionFormat) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Override the compressed flag. Must agree with the compression format.
    #[must_use]
    pub fn compressed(mut self, compressed: bool) -> Self {
        self.compressed = Some(compressed);
        self
    }

    #[must_use]
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// File name of the package.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Total package size, when known ahead of streaming.
    #[must_use]
    pub fn size_bytes(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    /// Snapshot the current state.
    ///
    /// # Errors
    ///
    /// `MissingField` when spec, archive or compression is unset, and
    /// `InvalidFormat` when the flags or formats contradict each other.
    pub fn build(&self) -> Result<PackageMetadata> {
        let spec = self
            .spec
            .clone()
            .ok_or(AssembleError::MissingField { field: "spec" })?;
        let archive = self
            .archive
            .ok_or(AssembleError::MissingField { field: "archive" })?;
        let compression = self
            .compression
            .ok_or(AssembleError::MissingField {
                field: "compression",
            })?;

        let archived = archive != ArchiveFormat::None;
        if let Some(flag) = self.archived
            && flag != archived
        {
            return Err(AssembleError::invalid_format(format!(
                "archived flag is {flag} but archive format is {archive}"
            )));
        }
        let compressed = compression != CompressionFormat::None;
        if let Some(flag) = self.compressed
            && flag != compressed
        {
            return Err(AssembleError::invalid_format(format!(
                "compressed flag is {flag} but compression format is {compression}"
            )));
        }
        if compression == CompressionFormat::Zip && archive != ArchiveFormat::Zip {
            return Err(AssembleError::invalid_format(format!(
                "zip compression requires a zip archive, not {archive}"
            )));
        }

        let mime_type = self
            .mime_type
            .clone()
            .unwrap_or_else(|| default_mime_type(archive, compression).to_string());

        Ok(PackageMetadata {
            spec,
            mime_type,
            archive,
            archived,
            compression,
            compressed,
            name: self.name.clone(),
            size_bytes: self.size_bytes,
        })
    }
}

fn default_mime_type(archive: ArchiveFormat, compression: CompressionFormat) -> &'static str {
    match (archive, compression) {
        (_, CompressionFormat::Gzip) => APPLICATION_GZIP,
        (_, CompressionFormat::Bzip2) => APPLICATION_BZIP2,
        (ArchiveFormat::Zip, _) => APPLICATION_ZIP,
        (ArchiveFormat::Tar, _) => APPLICATION_TAR,
        (ArchiveFormat::None, _) => APPLICATION_OCTET_STREAM,
    }
}

/// Immutable description of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    spec: String,
    mime_type: String,
    archive: ArchiveFormat,
    archived: bool,
    compression: CompressionFormat,
    compressed: bool,
    name: Option<String>,
    size_bytes: Option<u64>,
}

impl PackageMetadata {
    /// Packaging specification, e.g. `nihms-native-2017-07`.
    pub fn spec(&self) -> &str {
        &self.spec
    }

    /// Mime type of the full package stream.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn archive(&self) -> ArchiveFormat {
        self.archive
    }

    pub fn archived(&self) -> bool {
        self.archived
    }

    pub fn compression(&self) -> CompressionFormat {
        self.compression
    }

    pub fn compressed(&self) -> bool {
        self.compressed
    }

    /// Derived package file name, once the package has been named.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Total size of the package stream; `None` when it is only known after
    /// the stream has been consumed.
    pub fn size_bytes(&self) -> Option<u64> {
        self.size_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tar_gz() -> MetadataBuilder {
        MetadataBuilder::new()
            .spec("nihms-native-2017-07")
            .archive(ArchiveFormat::Tar)
            .archived(true)
            .compression(CompressionFormat::Gzip)
            .compressed(true)
    }

    #[test]
    fn build_tar_gz() {
        let metadata = tar_gz().build().unwrap();
        assert_eq!(metadata.spec(), "nihms-native-2017-07");
        assert_eq!(metadata.mime_type(), APPLICATION_GZIP);
        assert!(metadata.archived());
        assert!(metadata.compressed());
        assert_eq!(metadata.name(), None);
        assert_eq!(metadata.size_bytes(), None);
    }

    #[test]
    fn snapshot_is_independent_of_builder() {
        let builder = tar_gz();
        let snapshot = builder.build().unwrap();
        let renamed = builder.name("later.tar.gz").build().unwrap();
        assert_eq!(snapshot.name(), None);
        assert_eq!(renamed.name(), Some("later.tar.gz"));
    }

    #[test]
    fn missing_required_fields() {
        let err = MetadataBuilder::new().build().unwrap_err();
        assert!(matches!(err, AssembleError::MissingField { field: "spec" }));

        let err = MetadataBuilder::new().spec("s").build().unwrap_err();
        assert!(matches!(err, AssembleError::MissingField { field: "archive" }));

        let err = MetadataBuilder::new()
            .spec("s")
            .archive(ArchiveFormat::Tar)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            AssembleError::MissingField {
                field: "compression"
            }
        ));
    }

    #[test]
    fn contradictory_flags_are_rejected() {
        let err = tar_gz().compressed(false).build().unwrap_err();
        assert!(matches!(err, AssembleError::InvalidFormat { .. }));

        let err = tar_gz()
            .archive(ArchiveFormat::None)
            .build()
            .unwrap_err();
        assert!(matches!(err, AssembleError::InvalidFormat { .. }));
    }

    #[test]
    fn zip_compression_needs_zip_archive() {
        let err = tar_gz()
            .compression(CompressionFormat::Zip)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("zip compression requires"));

        let metadata = MetadataBuilder::new()
            .spec("s")
            .archive(ArchiveFormat::Zip)
            .compression(CompressionFormat::Zip)
            .build()
            .unwrap();
        assert_eq!(metadata.mime_type(), "application/zip");
        assert!(metadata.compressed());
    }

    #[test]
    fn default_mime_types() {
        let plain_tar = MetadataBuilder::new()
            .spec("s")
            .archive(ArchiveFormat::Tar)
            .compression(CompressionFormat::None)
            .build()
            .unwrap();
        assert_eq!(plain_tar.mime_type(), "application/x-tar");
        assert!(!plain_tar.compressed());

        let bz2 = plain_tar_builder()
            .compression(CompressionFormat::Bzip2)
            .build()
            .unwrap();
        assert_eq!(bz2.mime_type(), "application/x-bzip2");

        let explicit = plain_tar_builder()
            .mime_type("application/x-custom")
            .build()
            .unwrap();
        assert_eq!(explicit.mime_type(), "application/x-custom");
    }

    fn plain_tar_builder() -> MetadataBuilder {
        MetadataBuilder::new()
            .spec("s")
            .archive(ArchiveFormat::Tar)
            .compression(CompressionFormat::None)
    }
}
