//! NIHMS deposit submission model.
//!
//! A [`Submission`] bundles the custodial files of one deposit request with
//! the [`Manifest`] that accounts for them and the descriptive [`Metadata`]
//! rendered into the package. File bytes are reached through [`ByteSource`]
//! implementations so that package assembly can stream them.

pub mod catalog;
pub mod document;
pub mod error;
pub mod file_type;
pub mod metadata;
pub mod source;
pub mod submission;

pub use catalog::SubmissionCatalog;
pub use document::{FileDocument, SubmissionDocument};
pub use error::{ModelError, Result};
pub use file_type::FileType;
pub use metadata::{Grant, Issn, IssnPubType, Journal, Manuscript, Metadata, Person, PersonRole};
pub use source::{ByteSource, FileSource, MemorySource, OnceSource};
pub use submission::{DepositFile, Manifest, ManifestEntry, Submission};
