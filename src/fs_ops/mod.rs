//! Filesystem port used by the planner and executor.
//!
//! `DirectoryOps` is the narrow surface the rename subsystem needs; tests and
//! GUI front-ends can supply their own. `StdDirectoryOps` is the `std::fs`
//! implementation and hosts the case-insensitive rename workaround.

mod case_rename;
mod helpers;

pub use case_rename::{is_case_only_rename, rename_via_temp};
pub use helpers::{io_error_with_help, rename_failed};

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, trace};

use crate::platform::same_file;

pub trait DirectoryOps {
    fn create_directory(&self, path: &Path) -> io::Result<()>;
    fn rename_directory(&self, old: &Path, new: &Path) -> io::Result<()>;
    fn rename_file(&self, old: &Path, new: &Path) -> io::Result<()>;
    fn path_is_directory(&self, path: &Path) -> bool;
    fn path_is_file(&self, path: &Path) -> bool;
    fn path_exists(&self, path: &Path) -> bool;
    /// True if both paths refer to the same filesystem entry (device + inode).
    fn same_entry(&self, a: &Path, b: &Path) -> bool;
    /// Release open handles below `path` before it is renamed.
    fn close_open_handles_under(&self, path: &Path);
}

/// `std::fs` backed directory operations.
#[derive(Debug, Clone)]
pub struct StdDirectoryOps {
    case_insensitive: bool,
}

impl Default for StdDirectoryOps {
    fn default() -> Self {
        Self {
            case_insensitive: cfg!(any(windows, target_os = "macos")),
        }
    }
}

impl StdDirectoryOps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the temporary-name hop for case-only renames on or off.
    pub fn with_case_insensitive(mut self, on: bool) -> Self {
        self.case_insensitive = on;
        self
    }

    fn rename(&self, old: &Path, new: &Path) -> io::Result<()> {
        if self.case_insensitive && is_case_only_rename(old, new) {
            return rename_via_temp(old, new);
        }
        fs::rename(old, new)
    }
}

impl DirectoryOps for StdDirectoryOps {
    fn create_directory(&self, path: &Path) -> io::Result<()> {
        match fs::create_dir(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => {
                debug!(path = %path.display(), "directory already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn rename_directory(&self, old: &Path, new: &Path) -> io::Result<()> {
        self.rename(old, new)
    }

    fn rename_file(&self, old: &Path, new: &Path) -> io::Result<()> {
        self.rename(old, new)
    }

    fn path_is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn path_is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn path_exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn same_entry(&self, a: &Path, b: &Path) -> bool {
        same_file(a, b).unwrap_or(false)
    }

    fn close_open_handles_under(&self, path: &Path) {
        // std holds no handles of its own; file models hook in via FileHandle.
        trace!(path = %path.display(), "no open handles to release");
    }
}
