//! Semantic file types recognised by the NIHMS bulk submission format.
//!
//! Every custodial file in a package is classified as one of these types.
//! The type token is written verbatim into the package manifest.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic type of a custodial file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// The author manuscript itself.
    Manuscript,
    /// A figure referenced by the manuscript.
    Figure,
    /// A table referenced by the manuscript.
    Table,
    /// Supplementary material.
    Supplement,
}

impl FileType {
    /// Returns the token used in the manifest.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Manuscript => "manuscript",
            FileType::Figure => "figure",
            FileType::Table => "table",
            FileType::Supplement => "supplement",
        }
    }

    /// Returns true if manifest entries of this type must carry a label.
    pub fn requires_label(&self) -> bool {
        matches!(
            self,
            FileType::Figure | FileType::Table | FileType::Supplement
        )
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manuscript" => Ok(FileType::Manuscript),
            "figure" => Ok(FileType::Figure),
            "table" => Ok(FileType::Table),
            "supplement" => Ok(FileType::Supplement),
            _ => Err(format!("Unknown file type: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_str() {
        assert_eq!("figure".parse::<FileType>().unwrap(), FileType::Figure);
        assert_eq!(" Table ".parse::<FileType>().unwrap(), FileType::Table);
        assert_eq!(
            "MANUSCRIPT".parse::<FileType>().unwrap(),
            FileType::Manuscript
        );
        assert!("chart".parse::<FileType>().is_err());
    }

    #[test]
    fn test_label_requirement() {
        assert!(!FileType::Manuscript.requires_label());
        assert!(FileType::Figure.requires_label());
        assert!(FileType::Table.requires_label());
        assert!(FileType::Supplement.requires_label());
    }

    #[test]
    fn test_serde_uses_manifest_token() {
        let json = serde_json::to_string(&FileType::Supplement).unwrap();
        assert_eq!(json, "\"supplement\"");
        let parsed: FileType = serde_json::from_str("\"figure\"").unwrap();
        assert_eq!(parsed, FileType::Figure);
    }
}
