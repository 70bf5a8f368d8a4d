//! Package resource descriptors.

use nihms_model::DepositFile;

/// Metadata describing one entry inside a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageResource {
    /// Unambiguous name of the entry within the package.
    pub name: String,
    pub mime_type: String,
    /// Uncompressed size, when known before the entry is streamed.
    pub size_bytes: Option<u64>,
}

impl PackageResource {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes: None,
        }
    }

    #[must_use]
    pub fn with_size(mut self, size_bytes: Option<u64>) -> Self {
        self.size_bytes = size_bytes;
        self
    }
}

/// Classifies custodial files into package resources.
pub trait ResourceBuilder: Send + Sync {
    fn build(&self, file: &DepositFile) -> PackageResource;
}

/// Resource builder that derives the mime type from the file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResourceBuilder;

impl ResourceBuilder for DefaultResourceBuilder {
    fn build(&self, file: &DepositFile) -> PackageResource {
        let mime_type = file
            .mime_type
            .clone()
            .unwrap_or_else(|| mime_type_for_name(&file.name).to_string());
        PackageResource::new(file.name.clone(), mime_type).with_size(file.source.size_hint())
    }
}

/// Mime type for a file name, by extension.
pub fn mime_type_for_name(name: &str) -> &'static str {
    let Some((_, extension)) = name.rsplit_once('.') else {
        return "application/octet-stream";
    };
    match extension.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "htm" | "html" => "text/html",
        "xml" => "application/xml",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "eps" => "application/postscript",
        "svg" => "image/svg+xml",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nihms_model::{FileType, MemorySource};

    #[test]
    fn test_mime_type_for_name() {
        assert_eq!(mime_type_for_name("manuscript.pdf"), "application/pdf");
        assert_eq!(mime_type_for_name("FIG1.PNG"), "image/png");
        assert_eq!(mime_type_for_name("data.tar.gz"), "application/gzip");
        assert_eq!(mime_type_for_name("README"), "application/octet-stream");
        assert_eq!(mime_type_for_name("raw.dat"), "application/octet-stream");
    }

    #[test]
    fn test_default_builder_uses_source_size() {
        let file = DepositFile::new("fig1.png", FileType::Figure, MemorySource::new(vec![0u8; 42]));
        let resource = DefaultResourceBuilder.build(&file);
        assert_eq!(resource.name, "fig1.png");
        assert_eq!(resource.mime_type, "image/png");
        assert_eq!(resource.size_bytes, Some(42));
    }

    #[test]
    fn test_explicit_mime_type_wins() {
        let file = DepositFile::new("figure.bin", FileType::Figure, MemorySource::new(vec![1]))
            .with_mime_type("image/x-custom");
        assert_eq!(DefaultResourceBuilder.build(&file).mime_type, "image/x-custom");
    }
}
