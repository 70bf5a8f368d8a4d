//! Package file naming.
//!
//! A package is named `{spec}_{timestamp}_{localId}` followed by the archive
//! and compression extensions, e.g.
//! `nihms-native-2017-07_2017-07-14_09-30-05_1234.tar.gz`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::{ParseError, Url};
use uuid::Uuid;

use nihms_model::Submission;

use crate::error::Result;
use crate::metadata::{MetadataBuilder, PackageMetadata};

/// Packaging specification of the NIHMS native bulk submission format (07/2017).
pub const SPEC_NIHMS_NATIVE_2017_07: &str = "nihms-native-2017-07";

const RELATIVE_ID_BASE: &str = "http://localhost/";

/// Date-time layout used in package names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampPattern {
    /// `2017-07-14_09-30-05`.
    #[default]
    Standard,
    /// Month digits in the minute position (`2017-07-14_09-07-05`), matching
    /// names produced by earlier deployments.
    AsDeployed,
}

impl TimestampPattern {
    /// chrono format string for this pattern.
    pub fn format_str(&self) -> &'static str {
        match self {
            TimestampPattern::Standard => "%Y-%m-%d_%H-%M-%S",
            TimestampPattern::AsDeployed => "%Y-%m-%d_%H-%m-%S",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampPattern::Standard => "standard",
            TimestampPattern::AsDeployed => "as_deployed",
        }
    }

    pub fn format(&self, timestamp: DateTime<Utc>) -> String {
        timestamp.format(self.format_str()).to_string()
    }
}

impl fmt::Display for TimestampPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimestampPattern {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "standard" => Ok(TimestampPattern::Standard),
            "as_deployed" => Ok(TimestampPattern::AsDeployed),
            _ => Err(format!("Unknown timestamp pattern: {s}")),
        }
    }
}

/// Local part of a submission identifier: the last non-empty path segment of
/// the identifier URI.
///
/// Relative references such as `submissions/1234` are resolved against a
/// fixed base first. Identifiers that are not URIs at all, opaque URIs, and
/// URIs whose path has no usable segment get a random UUID instead, so naming
/// never fails.
pub fn submission_local_id(id: &str) -> String {
    let segment = parse_identifier(id).and_then(|url| {
        url.path_segments()
            .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()))
            .map(str::to_string)
    });
    match segment {
        Some(segment) => segment,
        None => {
            let fallback = Uuid::new_v4().to_string();
            warn!(
                submission = id,
                local_id = %fallback,
                "Submission id has no path segment, using a random local id"
            );
            fallback
        }
    }
}

fn parse_identifier(id: &str) -> Option<Url> {
    match Url::parse(id) {
        Ok(url) => Some(url),
        Err(ParseError::RelativeUrlWithoutBase) if is_uri_reference(id) => {
            Url::parse(RELATIVE_ID_BASE).ok()?.join(id).ok()
        }
        Err(_) => None,
    }
}

/// Every character is one a URI reference may carry unescaped.
fn is_uri_reference(id: &str) -> bool {
    id.chars().all(|c| {
        c.is_ascii_graphic() && !matches!(c, '"' | '<' | '>' | '\\' | '^' | '`' | '{' | '|' | '}')
    })
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Full package file name for a metadata snapshot.
pub fn package_file_name(
    spec: &str,
    local_id: &str,
    timestamp: DateTime<Utc>,
    metadata: &PackageMetadata,
    pattern: TimestampPattern,
) -> String {
    let mut name = format!("{spec}_{}_{local_id}", pattern.format(timestamp));
    if metadata.archived()
        && let Some(extension) = metadata.archive().extension()
    {
        name.push('.');
        name.push_str(extension);
    }
    if metadata.compressed()
        && let Some(extension) = metadata.compression().extension()
    {
        name.push('.');
        name.push_str(extension);
    }
    sanitize_file_name(&name)
}

/// Name the package for `submission` and record the name on the builder.
///
/// # Errors
///
/// Fails when the builder does not yet describe a valid package format.
pub fn name_package(
    submission: &Submission,
    builder: MetadataBuilder,
    timestamp: DateTime<Utc>,
    pattern: TimestampPattern,
) -> Result<MetadataBuilder> {
    let metadata = builder.build()?;
    let local_id = submission_local_id(&submission.id);
    let name = package_file_name(metadata.spec(), &local_id, timestamp, &metadata, pattern);
    Ok(builder.name(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{ArchiveFormat, CompressionFormat};
    use chrono::TimeZone;
    use nihms_model::Metadata;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 7, 14, 9, 30, 5).unwrap()
    }

    fn builder(archive: ArchiveFormat, compression: CompressionFormat) -> MetadataBuilder {
        MetadataBuilder::new()
            .spec(SPEC_NIHMS_NATIVE_2017_07)
            .archive(archive)
            .compression(compression)
    }

    #[test]
    fn local_id_is_last_path_segment() {
        assert_eq!(submission_local_id("http://example.org/submissions/1234"), "1234");
        assert_eq!(submission_local_id("http://example.org/submissions/1234/"), "1234");
        assert_eq!(
            submission_local_id("https://pass.example.org/fcrepo/rest/submissions/ab/cd-ef"),
            "cd-ef"
        );
        for id in ["1234", "submissions/1234", "/submissions/1234", "../submissions/1234?v=2"] {
            assert_eq!(submission_local_id(id), "1234", "{id}");
        }
    }

    #[test]
    fn malformed_ids_fall_back_to_random_uuid() {
        for id in ["not a uri", "fake:submission2", "http://example.org/", "", "/", "a{b}"] {
            let first = submission_local_id(id);
            let second = submission_local_id(id);
            assert!(Uuid::parse_str(&first).is_ok(), "{id} -> {first}");
            assert_ne!(first, second);
        }
    }

    #[test]
    fn timestamp_patterns() {
        assert_eq!(TimestampPattern::Standard.format(timestamp()), "2017-07-14_09-30-05");
        assert_eq!(TimestampPattern::AsDeployed.format(timestamp()), "2017-07-14_09-07-05");
        assert_eq!(
            "as-deployed".parse::<TimestampPattern>().unwrap(),
            TimestampPattern::AsDeployed
        );
    }

    #[test]
    fn file_name_extensions() {
        let cases = [
            (ArchiveFormat::Tar, CompressionFormat::Gzip, ".tar.gz"),
            (ArchiveFormat::Tar, CompressionFormat::Bzip2, ".tar.bz2"),
            (ArchiveFormat::Tar, CompressionFormat::None, ".tar"),
            (ArchiveFormat::Zip, CompressionFormat::Zip, ".zip"),
            (ArchiveFormat::Zip, CompressionFormat::None, ".zip"),
            (ArchiveFormat::None, CompressionFormat::Gzip, ".gz"),
        ];
        for (archive, compression, suffix) in cases {
            let metadata = builder(archive, compression).build().unwrap();
            let name = package_file_name(
                SPEC_NIHMS_NATIVE_2017_07,
                "1234",
                timestamp(),
                &metadata,
                TimestampPattern::Standard,
            );
            assert_eq!(
                name,
                format!("nihms-native-2017-07_2017-07-14_09-30-05_1234{suffix}")
            );
        }
    }

    #[test]
    fn sanitizes_unsafe_characters() {
        assert_eq!(sanitize_file_name("a b/c:d?.tar"), "a_b_c_d_.tar");
        assert_eq!(sanitize_file_name("ok-name_1.tar.gz"), "ok-name_1.tar.gz");
        assert_eq!(sanitize_file_name("é"), "_");
    }

    #[test]
    fn name_package_sets_builder_name() {
        let submission = Submission::new(
            "http://example.org/submissions/1234",
            Vec::new(),
            Metadata::default(),
        );
        let named = name_package(
            &submission,
            builder(ArchiveFormat::Tar, CompressionFormat::Gzip),
            timestamp(),
            TimestampPattern::Standard,
        )
        .unwrap();
        assert_eq!(
            named.build().unwrap().name(),
            Some("nihms-native-2017-07_2017-07-14_09-30-05_1234.tar.gz")
        );
    }

    #[test]
    fn name_package_requires_format() {
        let submission = Submission::new("http://example.org/s/1", Vec::new(), Metadata::default());
        assert!(
            name_package(
                &submission,
                MetadataBuilder::new(),
                timestamp(),
                TimestampPattern::Standard
            )
            .is_err()
        );
    }
}
