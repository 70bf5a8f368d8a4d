//! Submission, custodial file and manifest types.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::file_type::FileType;
use crate::metadata::Metadata;
use crate::source::ByteSource;

/// A file belonging to the submission, as opposed to the generated documents
/// that accompany it in a package.
#[derive(Debug, Clone)]
pub struct DepositFile {
    /// Name of the file inside the package.
    pub name: String,
    pub file_type: FileType,
    /// Human-readable label; required for figures, tables and supplements.
    pub label: Option<String>,
    /// Explicit mime type, overriding detection from the file name.
    pub mime_type: Option<String>,
    pub source: Arc<dyn ByteSource>,
}

impl DepositFile {
    pub fn new(
        name: impl Into<String>,
        file_type: FileType,
        source: impl ByteSource + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            file_type,
            label: None,
            mime_type: None,
            source: Arc::new(source),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// One line of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    #[serde(default)]
    pub label: Option<String>,
}

/// Ordered account of every custodial file in a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    /// Derive one entry per file, preserving file order.
    pub fn from_files(files: &[DepositFile]) -> Self {
        let entries = files
            .iter()
            .map(|file| ManifestEntry {
                name: file.name.clone(),
                file_type: file.file_type,
                label: file.label.clone(),
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

/// One deposit request.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Opaque identifier, usually a URI.
    pub id: String,
    /// Custodial files in submission order.
    pub files: Vec<DepositFile>,
    pub manifest: Manifest,
    pub metadata: Metadata,
}

impl Submission {
    /// Create a submission whose manifest is derived from its files.
    pub fn new(id: impl Into<String>, files: Vec<DepositFile>, metadata: Metadata) -> Self {
        let manifest = Manifest::from_files(&files);
        Self {
            id: id.into(),
            files,
            manifest,
            metadata,
        }
    }

    #[must_use]
    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn file(&self, name: &str) -> Option<&DepositFile> {
        self.files.iter().find(|file| file.name == name)
    }
}
