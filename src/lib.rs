//! Core library for `tagdir`.
//!
//! Plans and applies the reorganization of audio directories from track
//! metadata: `rename` holds the planner and executor, `fs_ops` the
//! filesystem port, `template` and `manifest` the minimal tag collaborators
//! used by the binary.

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod manifest;
pub mod output;
pub mod platform;
pub mod rename;
pub mod shutdown;
pub mod template;

pub use config::{default_config_path, default_log_path, Config, LogLevel};
pub use errors::RenameError;
pub use fs_ops::{DirectoryOps, StdDirectoryOps};
pub use rename::{
    describe, ActionExecutor, ActionLog, ActionPlanner, ExecutionReport, RenameAction, RenameMode, TrackFile,
};
pub use shutdown::AbortFlag;
