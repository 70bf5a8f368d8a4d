//! Directory-backed index of submission documents.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::document::SubmissionDocument;
use crate::error::{ModelError, Result};
use crate::submission::Submission;

/// Index of the submission documents found in one directory, keyed by
/// submission id.
#[derive(Debug, Clone)]
pub struct SubmissionCatalog {
    dir: PathBuf,
    documents: BTreeMap<String, PathBuf>,
}

impl SubmissionCatalog {
    /// Scan `dir` for `*.json` submission documents.
    ///
    /// Every document must carry a distinct submission id.
    pub fn scan(dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            })
            .collect();
        paths.sort();

        let mut documents: BTreeMap<String, PathBuf> = BTreeMap::new();
        for path in paths {
            trace!(path = %path.display(), "reading submission document");
            let document = SubmissionDocument::from_path(&path)?;
            if let Some(first) = documents.get(&document.id) {
                return Err(ModelError::DuplicateSubmission {
                    id: document.id,
                    first: first.clone(),
                    second: path,
                });
            }
            documents.insert(document.id, path);
        }

        if documents.is_empty() {
            return Err(ModelError::EmptyCatalog {
                dir: dir.to_path_buf(),
            });
        }
        debug!(dir = %dir.display(), count = documents.len(), "submission catalog scanned");
        Ok(Self {
            dir: dir.to_path_buf(),
            documents,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Submission ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Path of the document holding `id`.
    pub fn lookup(&self, id: &str) -> Option<&Path> {
        self.documents.get(id).map(PathBuf::as_path)
    }

    /// Load the submission identified by `id`.
    pub fn load(&self, id: &str) -> Result<Submission> {
        let path = self
            .lookup(id)
            .ok_or_else(|| ModelError::SubmissionNotFound { id: id.to_string() })?;
        SubmissionDocument::from_path(path)?.into_submission()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, file: &str, id: &str) {
        let json = format!(
            r#"{{ "id": "{id}", "files": [ {{ "name": "m.pdf", "type": "manuscript", "content": "pdf" }} ] }}"#
        );
        fs::write(dir.join(file), json).unwrap();
    }

    #[test]
    fn scan_indexes_documents() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "sample1.json", "fake:submission1");
        write(dir.path(), "sample2.json", "fake:submission2");
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = SubmissionCatalog::scan(dir.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.ids().collect::<Vec<_>>(),
            vec!["fake:submission1", "fake:submission2"]
        );
        assert!(catalog.lookup("fake:submission2").unwrap().ends_with("sample2.json"));

        let submission = catalog.load("fake:submission1").unwrap();
        assert_eq!(submission.files[0].name, "m.pdf");
    }

    #[test]
    fn scan_rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", "fake:dup");
        write(dir.path(), "b.json", "fake:dup");

        let error = SubmissionCatalog::scan(dir.path()).unwrap_err();
        match error {
            ModelError::DuplicateSubmission { id, first, second } => {
                assert_eq!(id, "fake:dup");
                assert!(first.ends_with("a.json"));
                assert!(second.ends_with("b.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn scan_rejects_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let error = SubmissionCatalog::scan(dir.path()).unwrap_err();
        assert!(matches!(error, ModelError::EmptyCatalog { .. }));
    }

    #[test]
    fn load_unknown_id() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", "fake:one");
        let catalog = SubmissionCatalog::scan(dir.path()).unwrap();
        assert!(matches!(
            catalog.load("fake:two"),
            Err(ModelError::SubmissionNotFound { .. })
        ));
    }
}
