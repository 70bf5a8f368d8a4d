//! CLI library components for NIHMS package assembly.

pub mod config;
pub mod logging;
pub mod package;
