//! NIHMS manifest serialization.
//!
//! The manifest is a plain-text file with one tab-separated line per
//! custodial file, in manifest order:
//!
//! ```text
//! manuscript		manuscript.pdf
//! figure	Figure 1	fig1.png
//! ```
//!
//! Columns are the file type token, the label (empty when absent) and the
//! file name.

use std::sync::Arc;

use nihms_model::{Manifest, ManifestEntry};

use crate::document::DocumentSerializer;
use crate::error::{AssembleError, Result};

/// Entry name of the manifest inside the package.
pub const MANIFEST_NAME: &str = "manifest.txt";

/// Mime type of the manifest.
pub const MANIFEST_MIME_TYPE: &str = "text/plain";

/// Renders a [`Manifest`] into `manifest.txt`.
#[derive(Debug, Clone)]
pub struct ManifestSerializer {
    manifest: Arc<Manifest>,
}

impl ManifestSerializer {
    pub fn new(manifest: Manifest) -> Self {
        Self {
            manifest: Arc::new(manifest),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

impl DocumentSerializer for ManifestSerializer {
    fn name(&self) -> &str {
        MANIFEST_NAME
    }

    fn mime_type(&self) -> &str {
        MANIFEST_MIME_TYPE
    }

    fn render(&self) -> Result<Vec<u8>> {
        let mut out = String::new();
        for entry in &self.manifest.entries {
            write_line(&mut out, entry)?;
        }
        Ok(out.into_bytes())
    }
}

fn write_line(out: &mut String, entry: &ManifestEntry) -> Result<()> {
    let label = entry.label.as_deref().map(str::trim).unwrap_or_default();
    if entry.file_type.requires_label() && label.is_empty() {
        return Err(AssembleError::MissingLabel {
            name: entry.name.clone(),
            file_type: entry.file_type,
        });
    }
    check_field(&entry.name, "name", &entry.name)?;
    check_field(&entry.name, "label", label)?;

    out.push_str(entry.file_type.as_str());
    out.push('\t');
    out.push_str(label);
    out.push('\t');
    out.push_str(&entry.name);
    out.push('\n');
    Ok(())
}

fn check_field(name: &str, field: &str, value: &str) -> Result<()> {
    if value.contains(['\t', '\r', '\n']) {
        return Err(AssembleError::MalformedManifest {
            name: name.to_string(),
            message: format!("{field} contains a tab or line break"),
        });
    }
    Ok(())
}
