//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - The manifest defaults to `<ROOT>/tracks.xml`.

use clap::{Parser, ValueHint};
use std::path::{Path, PathBuf};

use crate::config::types::{Config, LogLevel};
use crate::rename::RenameMode;

/// File name of the track manifest looked up in ROOT when --manifest is absent.
pub const MANIFEST_FILE_NAME: &str = "tracks.xml";

/// CLI wrapper for the tagdir library.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Reorganize audio directories from their tag metadata"
)]
pub struct Args {
    /// Directory tree to reorganize.
    #[arg(value_name = "ROOT", value_hint = ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// XML track manifest with the tags of every track.
    #[arg(
        long,
        short = 'm',
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        help = "Track manifest (default: <ROOT>/tracks.xml)"
    )]
    pub manifest: Option<PathBuf>,

    /// Directory name template, e.g. "%{artist}/%{album}".
    #[arg(long, short = 'f', value_name = "TEMPLATE", help = "Directory name template")]
    pub format: Option<String>,

    /// Rename the track's directory, or create the new directory below it.
    #[arg(long, value_name = "MODE", help = "rename | create")]
    pub mode: Option<RenameMode>,

    /// Dry-run: print the plan but do not modify the filesystem.
    #[arg(
        long,
        help = "Show what would be done, but do not modify files/directories"
    )]
    pub dry_run: bool,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(
        short = 'd',
        long,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Print where tagdir will look for the config file (or TAGDIR_CONFIG if set), then exit.
    #[arg(long, help = "Print the config file location used by tagdir and exit")]
    pub print_config: bool,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Manifest path: --manifest if given, else `<root>/tracks.xml`.
    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        self.manifest
            .clone()
            .unwrap_or_else(|| root.join(MANIFEST_FILE_NAME))
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(root) = &self.root {
            cfg.root = root.clone();
        }
        if let Some(format) = &self.format {
            cfg.format = format.clone();
        }
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if self.dry_run {
            cfg.dry_run = true;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
