//! TOML configuration for package assembly.
//!
//! ```toml
//! [package]
//! archive = "tar"
//! compression = "gzip"
//! timestamp_pattern = "standard"
//! spool_threshold_bytes = 8388608
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use nihms_assembler::{ArchiveFormat, CompressionFormat, PackageOptions, TimestampPattern};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssemblyConfig {
    pub package: PackageConfig,
}

/// `[package]` table; unset keys keep the assembler defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageConfig {
    pub archive: Option<ArchiveFormat>,
    pub compression: Option<CompressionFormat>,
    pub timestamp_pattern: Option<TimestampPattern>,
    pub spool_threshold_bytes: Option<usize>,
}

impl AssemblyConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Assembler options with config values applied over the defaults.
    pub fn package_options(&self) -> PackageOptions {
        let defaults = PackageOptions::default();
        let package = &self.package;
        PackageOptions {
            archive: package.archive.unwrap_or(defaults.archive),
            compression: package.compression.unwrap_or(defaults.compression),
            timestamp_pattern: package
                .timestamp_pattern
                .unwrap_or(defaults.timestamp_pattern),
            spool_threshold: package
                .spool_threshold_bytes
                .unwrap_or(defaults.spool_threshold),
        }
    }
}
