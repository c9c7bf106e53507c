//! Executes a finalized action log through `DirectoryOps`.
//! Failures are collected per action; the remaining actions still run.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::errors::RenameError;
use crate::fs_ops::{is_case_only_rename, rename_failed, DirectoryOps};
use crate::shutdown::AbortFlag;

use super::action::{describe, ActionLog, RenameAction};
use super::track::FileHandle;

/// One failed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFailure {
    /// Position of the action in the log.
    pub index: usize,
    pub error: RenameError,
}

/// Outcome of running an action log.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub applied: usize,
    pub failures: Vec<ActionFailure>,
    /// Set when the run stopped early because of an abort request.
    pub aborted: bool,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.aborted
    }

    /// All error messages, one per line.
    pub fn error_report(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for failure in &self.failures {
            writeln!(f, "{}", failure.error)?;
        }
        if self.aborted {
            writeln!(f, "{}", RenameError::Interrupted)?;
        }
        Ok(())
    }
}

pub struct ActionExecutor<'a> {
    ops: &'a dyn DirectoryOps,
    abort: AbortFlag,
    current_dir: Option<PathBuf>,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(ops: &'a dyn DirectoryOps) -> Self {
        Self {
            ops,
            abort: AbortFlag::new(),
            current_dir: None,
        }
    }

    pub fn with_abort_flag(mut self, abort: AbortFlag) -> Self {
        self.abort = abort;
        self
    }

    /// Directory the caller has open; follows a rename of exactly that directory.
    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    pub fn abort(&self) {
        self.abort.request();
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_requested()
    }

    /// Perform every action in order, collecting failures.
    pub fn run(&mut self, log: ActionLog) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let total = log.len();
        for (index, action) in log.into_iter().enumerate() {
            if self.is_aborted() {
                error!(done = index, total, "aborted; remaining actions not executed");
                report.aborted = true;
                break;
            }
            let description = describe(&action);
            match self.perform(&action) {
                Ok(()) => {
                    if !matches!(action, RenameAction::ReportError { .. }) {
                        info!(action = %description, "applied");
                        report.applied += 1;
                    }
                }
                Err(error) => {
                    warn!(code = error.code(), kind = error.kind(), index, "{error}");
                    report.failures.push(ActionFailure { index, error });
                }
            }
        }
        report
    }

    fn perform(&mut self, action: &RenameAction) -> Result<(), RenameError> {
        match action {
            RenameAction::CreateDirectory { destination } => self.create_directory(destination),
            RenameAction::RenameDirectory {
                source,
                destination,
                handle,
            } => {
                self.rename_directory(source, destination, handle.as_ref())?;
                if self.current_dir.as_deref() == Some(source.as_path()) {
                    self.current_dir = Some(destination.clone());
                }
                Ok(())
            }
            RenameAction::RenameFile {
                source,
                destination,
                handle,
            } => self.rename_file(source, destination, handle.as_ref()),
            RenameAction::ReportError { error } => Err(error.clone()),
        }
    }

    fn create_directory(&self, dir: &Path) -> Result<(), RenameError> {
        if self.ops.path_is_directory(dir) {
            return Ok(());
        }
        self.ops
            .create_directory(dir)
            .map_err(|e| RenameError::OperationFailed {
                op: format!("Create directory {}", dir.display()),
                detail: e.to_string(),
            })?;
        if self.ops.path_is_directory(dir) {
            Ok(())
        } else {
            Err(RenameError::OperationFailed {
                op: format!("Create directory {}", dir.display()),
                detail: "directory missing after create".into(),
            })
        }
    }

    fn rename_directory(
        &self,
        old: &Path,
        new: &Path,
        handle: Option<&Arc<dyn FileHandle>>,
    ) -> Result<(), RenameError> {
        self.check_destination_free(old, new)?;
        if !self.ops.path_is_directory(old) {
            return Err(RenameError::NotADirectory(old.to_path_buf()));
        }
        self.ops.close_open_handles_under(old);
        if let Some(h) = handle {
            h.close();
        }
        self.ops
            .rename_directory(old, new)
            .map_err(rename_failed("Rename", old, new))?;
        if self.ops.path_is_directory(new) {
            Ok(())
        } else {
            Err(RenameError::OperationFailed {
                op: format!("Rename {} to {}", old.display(), new.display()),
                detail: "directory missing after rename".into(),
            })
        }
    }

    fn rename_file(
        &self,
        old: &Path,
        new: &Path,
        handle: Option<&Arc<dyn FileHandle>>,
    ) -> Result<(), RenameError> {
        if !is_case_only_rename(old, new) && self.ops.path_is_file(new) {
            // Already moved by an earlier run, or the same entry under another name.
            if !self.ops.path_exists(old) || self.ops.same_entry(old, new) {
                return Ok(());
            }
            return Err(RenameError::AlreadyExists(new.to_path_buf()));
        }
        self.check_destination_free(old, new)?;
        if !self.ops.path_is_file(old) {
            return Err(RenameError::NotAFile(old.to_path_buf()));
        }
        if let Some(h) = handle {
            h.close();
        }
        let routed = handle.and_then(|h| h.rename(old, new));
        match routed {
            Some(result) => result.map_err(rename_failed("Rename", old, new))?,
            None => self
                .ops
                .rename_file(old, new)
                .map_err(rename_failed("Rename", old, new))?,
        }
        if self.ops.path_is_file(new) {
            Ok(())
        } else {
            Err(RenameError::OperationFailed {
                op: format!("Rename {} to {}", old.display(), new.display()),
                detail: "file missing after rename".into(),
            })
        }
    }

    /// A destination that exists is only acceptable for a case-only rename
    /// onto the very same entry (case-insensitive filesystems).
    fn check_destination_free(&self, old: &Path, new: &Path) -> Result<(), RenameError> {
        if !self.ops.path_exists(new) {
            return Ok(());
        }
        if is_case_only_rename(old, new) {
            if self.ops.same_entry(old, new) {
                return Ok(());
            }
            return Err(RenameError::Unsafe {
                from: old.to_path_buf(),
                to: new.to_path_buf(),
            });
        }
        Err(RenameError::AlreadyExists(new.to_path_buf()))
    }
}

impl fmt::Debug for ActionExecutor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionExecutor")
            .field("current_dir", &self.current_dir)
            .field("aborted", &self.is_aborted())
            .finish()
    }
}
