//! Archive and compression formats a package can be serialized with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Container format used to sequence package entries into one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    None,
    Tar,
    Zip,
}

impl ArchiveFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFormat::None => "none",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::Zip => "zip",
        }
    }

    /// File extension appended to the package name, without the dot.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ArchiveFormat::None => None,
            ArchiveFormat::Tar => Some("tar"),
            ArchiveFormat::Zip => Some("zip"),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ArchiveFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(ArchiveFormat::None),
            "tar" => Ok(ArchiveFormat::Tar),
            "zip" => Ok(ArchiveFormat::Zip),
            _ => Err(format!("Unknown archive format: {s}")),
        }
    }
}

/// Byte-level compression applied to the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionFormat {
    None,
    Gzip,
    Bzip2,
    /// Per-entry deflate inside a zip archive.
    Zip,
}

impl CompressionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionFormat::None => "none",
            CompressionFormat::Gzip => "gzip",
            CompressionFormat::Bzip2 => "bzip2",
            CompressionFormat::Zip => "zip",
        }
    }

    /// File extension appended after the archive extension, without the dot.
    ///
    /// Zip compresses its own entries and adds nothing.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            CompressionFormat::None | CompressionFormat::Zip => None,
            CompressionFormat::Gzip => Some("gz"),
            CompressionFormat::Bzip2 => Some("bz2"),
        }
    }
}

impl fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CompressionFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(CompressionFormat::None),
            "gzip" | "gz" => Ok(CompressionFormat::Gzip),
            "bzip2" | "bz2" => Ok(CompressionFormat::Bzip2),
            "zip" => Ok(CompressionFormat::Zip),
            _ => Err(format!("Unknown compression format: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions() {
        assert_eq!(ArchiveFormat::Tar.extension(), Some("tar"));
        assert_eq!(ArchiveFormat::Zip.extension(), Some("zip"));
        assert_eq!(ArchiveFormat::None.extension(), None);
        assert_eq!(CompressionFormat::Gzip.extension(), Some("gz"));
        assert_eq!(CompressionFormat::Bzip2.extension(), Some("bz2"));
        assert_eq!(CompressionFormat::Zip.extension(), None);
        assert_eq!(CompressionFormat::None.extension(), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("TAR".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Tar);
        assert_eq!(
            "gz".parse::<CompressionFormat>().unwrap(),
            CompressionFormat::Gzip
        );
        assert_eq!(
            "bzip2".parse::<CompressionFormat>().unwrap(),
            CompressionFormat::Bzip2
        );
        assert!("rar".parse::<ArchiveFormat>().is_err());
        assert!("lzma".parse::<CompressionFormat>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&CompressionFormat::Bzip2).unwrap();
        assert_eq!(json, "\"bzip2\"");
        let archive: ArchiveFormat = serde_json::from_str("\"zip\"").unwrap();
        assert_eq!(archive, ArchiveFormat::Zip);
    }
}
