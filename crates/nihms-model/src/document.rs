//! JSON submission documents.
//!
//! A submission document describes a submission on disk: its identifier,
//! custodial files (by path relative to the document, or inline text), an
//! optional explicit manifest, and the descriptive metadata.
//!
//! ```json
//! {
//!   "id": "http://example.org/submissions/1234",
//!   "files": [
//!     { "type": "manuscript", "path": "files/manuscript.pdf" },
//!     { "name": "fig1.png", "type": "figure", "label": "Figure 1", "path": "files/fig1.png" }
//!   ],
//!   "metadata": { "manuscript": { "title": "Effects of X on Y" } }
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::file_type::FileType;
use crate::metadata::Metadata;
use crate::source::{FileSource, MemorySource};
use crate::submission::{DepositFile, Manifest, ManifestEntry, Submission};

/// Serialized form of a [`Submission`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionDocument {
    pub id: String,
    #[serde(default)]
    pub files: Vec<FileDocument>,
    #[serde(default)]
    pub manifest: Option<Vec<ManifestEntry>>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Directory that relative file paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Serialized form of a [`DepositFile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub file_type: FileType,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Inline UTF-8 content, used instead of `path`.
    #[serde(default)]
    pub content: Option<String>,
}

impl SubmissionDocument {
    /// Read a document from disk; relative paths resolve against its directory.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::from_reader(BufReader::new(file), base_dir).map_err(|error| match error {
            ModelError::Json { source, .. } => ModelError::Json {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Read a document from any reader.
    pub fn from_reader(reader: impl Read, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut document: SubmissionDocument =
            serde_json::from_reader(reader).map_err(|source| ModelError::Json {
                path: PathBuf::from("<reader>"),
                source,
            })?;
        document.base_dir = base_dir.into();
        Ok(document)
    }

    /// Resolve the document into a submission.
    pub fn into_submission(self) -> Result<Submission> {
        if self.id.trim().is_empty() {
            return Err(ModelError::invalid("submission id must not be empty"));
        }
        let files = self
            .files
            .into_iter()
            .enumerate()
            .map(|(index, file)| file.into_deposit_file(index, &self.base_dir))
            .collect::<Result<Vec<_>>>()?;
        let manifest = match self.manifest {
            Some(entries) => Manifest::new(entries),
            None => Manifest::from_files(&files),
        };
        Ok(Submission {
            id: self.id,
            files,
            manifest,
            metadata: self.metadata,
        })
    }
}

impl FileDocument {
    fn into_deposit_file(self, index: usize, base_dir: &Path) -> Result<DepositFile> {
        let name = match (&self.name, &self.path) {
            (Some(name), _) => name.clone(),
            (None, Some(path)) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    ModelError::invalid(format!("file #{index} path has no file name"))
                })?,
            (None, None) => {
                return Err(ModelError::invalid(format!(
                    "file #{index} needs a name or a path"
                )));
            }
        };

        let mut file = match (self.path, self.content) {
            (Some(path), None) => {
                let resolved = if path.is_absolute() {
                    path
                } else {
                    base_dir.join(path)
                };
                DepositFile::new(name, self.file_type, FileSource::new(resolved))
            }
            (None, Some(content)) => DepositFile::new(
                name,
                self.file_type,
                MemorySource::new(content.into_bytes()),
            ),
            (Some(_), Some(_)) => {
                return Err(ModelError::invalid(format!(
                    "file '{name}' declares both a path and inline content"
                )));
            }
            (None, None) => {
                return Err(ModelError::invalid(format!(
                    "file '{name}' declares neither a path nor inline content"
                )));
            }
        };
        file.label = self.label;
        file.mime_type = self.mime_type;
        Ok(file)
    }
}
