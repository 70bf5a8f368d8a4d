//! NIHMS native package assembly.
//!
//! Turns a [`Submission`](nihms_model::Submission) into a single package
//! byte stream for bulk deposit:
//!
//! - **bulk_meta.xml**: descriptive metadata, always the first entry
//! - **manifest.txt**: type, label and name of every custodial file
//! - **custodial files**: in submission order
//!
//! Entries are archived as tar (or zip) and optionally compressed with gzip
//! or bzip2. Assembly only validates; bytes are produced as the caller reads
//! from [`PackageStream::open`], one entry at a time.

mod assembler;
mod bulk_meta;
mod compress;
mod document;
mod entry;
mod error;
mod format;
mod manifest;
mod metadata;
mod naming;
mod resource;
mod stream;
mod tar_stream;
mod zip_stream;

// Re-export public types and functions
pub use assembler::{Assembler, DEFAULT_SPOOL_THRESHOLD, NihmsAssembler, PackageOptions};
pub use bulk_meta::{BULK_META_MIME_TYPE, BULK_META_NAME, MetadataSerializer};
pub use document::{DocumentSerializer, LazyDocument};
pub use error::{AssembleError, Result};
pub use format::{ArchiveFormat, CompressionFormat};
pub use manifest::{MANIFEST_MIME_TYPE, MANIFEST_NAME, ManifestSerializer};
pub use metadata::{APPLICATION_GZIP, MetadataBuilder, PackageMetadata};
pub use naming::{
    SPEC_NIHMS_NATIVE_2017_07, TimestampPattern, name_package, package_file_name,
    sanitize_file_name, submission_local_id,
};
pub use resource::{DefaultResourceBuilder, PackageResource, ResourceBuilder, mime_type_for_name};
pub use stream::{PackageReader, PackageStream};
