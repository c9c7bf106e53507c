//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;
use super::{FORMAT_DEFAULT, MODE_DEFAULT};
use crate::rename::RenameMode;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for one reorganization run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory tree being reorganized
    pub root: PathBuf,
    /// Directory name template
    pub format: String,
    /// Replace the file's directory or create below it
    pub mode: RenameMode,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// If true, print the plan but do not modify the filesystem
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            format: FORMAT_DEFAULT.to_string(),
            mode: MODE_DEFAULT,
            log_level: LogLevel::Normal,
            log_file: paths::default_log_path(),
            dry_run: false,
        }
    }
}

impl Config {
    /// Construct a Config for `root` and `format`; other fields use defaults.
    pub fn new(root: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            format: format.into(),
            ..Default::default()
        }
    }
}
