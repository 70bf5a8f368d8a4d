//! CLI argument definitions for the NIHMS packager.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use nihms_assembler::{ArchiveFormat, CompressionFormat};

#[derive(Parser)]
#[command(
    name = "nihms-package",
    version,
    about = "Assemble NIHMS native bulk-submission packages",
    long_about = "Assemble NIHMS native (nihms-native-2017-07) deposit packages.\n\n\
                  A package holds bulk_meta.xml, manifest.txt and the custodial files\n\
                  of one submission, archived as tar or zip and optionally compressed."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Assembly configuration file (TOML).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Assemble a submission and write the package file.
    Assemble(AssembleArgs),

    /// List the entries a submission's package would contain.
    Resources(SubmissionArgs),

    /// Write one package entry to stdout.
    Show(ShowArgs),

    /// List the submissions found in a directory.
    Catalog(CatalogArgs),
}

#[derive(Parser)]
pub struct SubmissionArgs {
    /// Submission document (JSON).
    #[arg(value_name = "SUBMISSION_JSON")]
    pub submission: PathBuf,
}

#[derive(Parser)]
pub struct AssembleArgs {
    /// Submission document (JSON).
    #[arg(value_name = "SUBMISSION_JSON")]
    pub submission: PathBuf,

    /// Directory the package is written to (default: current directory).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Archive format (overrides the config file).
    #[arg(long = "archive", value_enum)]
    pub archive: Option<ArchiveArg>,

    /// Compression format (overrides the config file).
    #[arg(long = "compression", value_enum)]
    pub compression: Option<CompressionArg>,
}

#[derive(Parser)]
pub struct ShowArgs {
    /// Submission document (JSON).
    #[arg(value_name = "SUBMISSION_JSON")]
    pub submission: PathBuf,

    /// Entry name, e.g. manifest.txt or bulk_meta.xml.
    #[arg(value_name = "RESOURCE")]
    pub resource: String,
}

#[derive(Parser)]
pub struct CatalogArgs {
    /// Directory of submission documents.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ArchiveArg {
    Tar,
    Zip,
}

impl From<ArchiveArg> for ArchiveFormat {
    fn from(arg: ArchiveArg) -> Self {
        match arg {
            ArchiveArg::Tar => ArchiveFormat::Tar,
            ArchiveArg::Zip => ArchiveFormat::Zip,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CompressionArg {
    None,
    Gzip,
    Bzip2,
    Zip,
}

impl From<CompressionArg> for CompressionFormat {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => CompressionFormat::None,
            CompressionArg::Gzip => CompressionFormat::Gzip,
            CompressionArg::Bzip2 => CompressionFormat::Bzip2,
            CompressionArg::Zip => CompressionFormat::Zip,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
