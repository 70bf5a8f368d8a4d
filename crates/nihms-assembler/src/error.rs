//! Error types for package assembly.
//!
//! Errors fall in two groups. Build-time errors (bad configuration, name
//! collisions, a manifest that does not account for the custodial files) are
//! returned by [`Assembler::assemble`](crate::Assembler::assemble) before any
//! byte is produced. Everything else is raised while the package is streamed,
//! and therefore reaches the caller from a `read` call as an [`std::io::Error`]
//! wrapping an [`AssembleError`]; [`AssembleError::from_stream_error`] recovers
//! the typed error.

use std::io;

use thiserror::Error;

/// Unified error type for package assembly.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AssembleError {
    // =========================================================================
    // BUILD-TIME ERRORS
    // =========================================================================
    /// A required package metadata field was never set.
    #[error("package metadata field '{field}' is required")]
    MissingField {
        /// Builder field name.
        field: &'static str,
    },

    /// Archive and compression settings do not describe a valid package.
    #[error("invalid package format: {message}")]
    InvalidFormat {
        /// Description of the inconsistency.
        message: String,
    },

    /// A custodial file name cannot be used as an archive entry name.
    #[error("invalid resource name '{name}': {reason}")]
    InvalidResourceName {
        /// The offending name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },

    /// Two package entries would share a name.
    #[error("resource name '{name}' is used more than once in the package")]
    NameCollision {
        /// The colliding name.
        name: String,
    },

    /// The manifest and the custodial files disagree.
    #[error("manifest does not match custodial files: {message}")]
    ManifestMismatch {
        /// Description of the mismatch.
        message: String,
    },

    // =========================================================================
    // RENDER ERRORS
    // =========================================================================
    /// A manifest entry of a type that needs a label has none.
    #[error("manifest entry '{name}' of type {file_type} requires a label")]
    MissingLabel {
        /// File name of the entry.
        name: String,
        /// Semantic type of the entry.
        file_type: nihms_model::FileType,
    },

    /// A manifest value cannot be represented in the manifest format.
    #[error("manifest entry '{name}' is malformed: {message}")]
    MalformedManifest {
        /// File name of the entry.
        name: String,
        /// Description of the problem.
        message: String,
    },

    /// Required descriptive metadata is absent.
    #[error("metadata document is missing required field '{field}'")]
    MissingMetadata {
        /// Dotted path of the missing field.
        field: String,
    },

    // =========================================================================
    // STREAMING ERRORS
    // =========================================================================
    /// No package entry carries the requested name.
    #[error("resource not found in package: {name}")]
    ResourceNotFound {
        /// The requested name.
        name: String,
    },

    /// A custodial byte source could not be opened.
    #[error("custodial resource '{name}' could not be opened: {source}")]
    SourceUnavailable {
        /// Resource name.
        name: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Reading a custodial byte source failed part-way.
    #[error("custodial resource '{name}' could not be read: {source}")]
    SourceRead {
        /// Resource name.
        name: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A source produced a different number of bytes than it declared.
    #[error("custodial resource '{name}' declared {expected} bytes but produced {actual}")]
    SizeMismatch {
        /// Resource name.
        name: String,
        /// Declared size.
        expected: u64,
        /// Bytes observed (a lower bound when the source ran long).
        actual: u64,
    },

    /// The package stream already failed and cannot continue.
    #[error("package stream aborted after an earlier error")]
    StreamFailed,

    // =========================================================================
    // WRAPPED ERRORS
    // =========================================================================
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// XML writing error.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Zip archive error.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Result type alias for assembly operations.
pub type Result<T> = std::result::Result<T, AssembleError>;

impl AssembleError {
    pub(crate) fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// True for errors raised while assembling, before any package byte exists.
    pub fn is_build_time(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::InvalidFormat { .. }
                | Self::InvalidResourceName { .. }
                | Self::NameCollision { .. }
                | Self::ManifestMismatch { .. }
        )
    }

    /// Wrap this error for return from a `Read` implementation.
    pub(crate) fn into_io(self) -> io::Error {
        match self {
            // Plain OS errors keep their kind.
            Self::Io(error) => error,
            other => io::Error::other(other),
        }
    }

    /// Recover the typed error carried by an `io::Error` from a package read.
    pub fn from_stream_error(error: io::Error) -> Self {
        if !error
            .get_ref()
            .is_some_and(|inner| inner.is::<AssembleError>())
        {
            return Self::Io(error);
        }
        let kind = error.kind();
        match error.into_inner().map(|inner| inner.downcast::<AssembleError>()) {
            Some(Ok(assemble)) => *assemble,
            Some(Err(other)) => Self::Io(io::Error::new(kind, other)),
            None => Self::Io(io::Error::from(kind)),
        }
    }
}
