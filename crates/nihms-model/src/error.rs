use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid submission document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid submission document: {message}")]
    InvalidDocument { message: String },

    #[error("duplicate submission '{id}' in {first} and {second}")]
    DuplicateSubmission {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("submission not found: {id}")]
    SubmissionNotFound { id: String },

    #[error("no submission documents found in {dir}")]
    EmptyCatalog { dir: PathBuf },
}

impl ModelError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
