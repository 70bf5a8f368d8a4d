//! Bibliographic and administrative metadata for a submission.
//!
//! This is the content of the package metadata document. Field presence is
//! not validated here; the serializer reports missing required values when
//! the document is rendered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Descriptive metadata accompanying a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub manuscript: Manuscript,
    #[serde(default)]
    pub journal: Option<Journal>,
    #[serde(default)]
    pub persons: Vec<Person>,
    #[serde(default)]
    pub grants: Vec<Grant>,
}

/// The manuscript being deposited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manuscript {
    pub title: String,
    /// NIHMS manuscript identifier, when the manuscript was previously deposited.
    #[serde(default)]
    pub nihms_id: Option<String>,
    #[serde(default)]
    pub manuscript_url: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    /// Whether the publisher's PDF is included in the deposit.
    #[serde(default)]
    pub publisher_pdf: bool,
    /// Whether the publisher's PDF may be shown to readers.
    #[serde(default)]
    pub show_publisher_pdf: bool,
    /// Embargo period relative to publication, in months.
    #[serde(default)]
    pub embargo_months: Option<u32>,
}

/// The journal the manuscript was accepted by.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    pub title: String,
    /// NLM title abbreviation.
    #[serde(default)]
    pub nlm_ta: Option<String>,
    #[serde(default)]
    pub issns: Vec<Issn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issn {
    pub value: String,
    pub pub_type: IssnPubType,
}

/// Publication medium an ISSN applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssnPubType {
    /// Print publication.
    Ppub,
    /// Electronic publication.
    Epub,
}

impl IssnPubType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssnPubType::Ppub => "ppub",
            IssnPubType::Epub => "epub",
        }
    }
}

/// A person associated with the submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: PersonRole,
    /// Whether this person is the corresponding contact.
    #[serde(default)]
    pub corresponding: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonRole {
    #[default]
    Author,
    /// Principal investigator.
    Pi,
    /// Co-principal investigator.
    Copi,
    Submitter,
}

impl PersonRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonRole::Author => "author",
            PersonRole::Pi => "pi",
            PersonRole::Copi => "copi",
            PersonRole::Submitter => "submitter",
        }
    }
}

impl fmt::Display for PersonRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A funding award the manuscript reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub funder: String,
    pub grant_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_defaults_optional_sections() {
        let json = r#"{ "manuscript": { "title": "Effects of X on Y" } }"#;
        let metadata: Metadata = serde_json::from_str(json).expect("parse metadata");
        assert_eq!(metadata.manuscript.title, "Effects of X on Y");
        assert!(metadata.journal.is_none());
        assert!(metadata.persons.is_empty());
        assert!(!metadata.manuscript.publisher_pdf);
    }

    #[test]
    fn person_role_parses_lowercase() {
        let json = r#"{ "first_name": "Ada", "last_name": "Lovelace", "role": "copi" }"#;
        let person: Person = serde_json::from_str(json).expect("parse person");
        assert_eq!(person.role, PersonRole::Copi);
        assert_eq!(person.role.to_string(), "copi");
    }
}
