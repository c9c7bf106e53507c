//! Directory reorganization planner.
//!
//! For each file the desired directory is derived from its current directory
//! and the expanded format, then the minimal actions to get it there are
//! appended to the log:
//! - desired below current: create the new levels, then move the file in.
//! - desired next to current: rename the whole directory, or move just the
//!   file when the target already exists (or is already planned).
//! - anything else: a deferred error report.
//!
//! Aggregate codes in the format are resolved in `finalize()`, after every
//! file has been scheduled.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::errors::RenameError;
use crate::fs_ops::DirectoryOps;
use crate::shutdown::AbortFlag;

use super::action::{describe, ActionDescription, ActionLog, RenameAction};
use super::aggregate::{keeps_directory_shape, rewrite_placeholder_path, AggregationContext};
use super::track::{FileHandle, MetadataSource, TrackFile};

/// Chained directory renames followed when resolving a file's current directory.
pub const MAX_RENAME_HOPS: usize = 5;
/// Refinement rounds per file (one directory rename plus one level of nesting).
pub const MAX_ROUNDS: usize = 2;
/// New directory levels created below a file's directory in one go.
pub const MAX_NEW_LEVELS: usize = 5;

/// Where the expanded format is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenameMode {
    /// Replace the file's directory: `parent(dir)/<format>`.
    #[default]
    Rename,
    /// Create below the file's directory: `dir/<format>`.
    Create,
}

impl RenameMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rename" => Some(RenameMode::Rename),
            "create" => Some(RenameMode::Create),
            _ => None,
        }
    }
}

impl fmt::Display for RenameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RenameMode::Rename => "rename",
            RenameMode::Create => "create",
        })
    }
}

impl FromStr for RenameMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid mode: '{s}' (expected rename or create)"))
    }
}

/// Current and desired directory of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDirname {
    pub current: PathBuf,
    /// May still contain aggregate placeholders.
    pub desired: PathBuf,
    pub aggregates: Vec<(String, String)>,
}

type ScheduledCallback<'a> = Box<dyn FnMut(&ActionDescription) + 'a>;

pub struct ActionPlanner<'a> {
    ops: &'a dyn DirectoryOps,
    format: String,
    mode: RenameMode,
    log: ActionLog,
    aggregation: AggregationContext,
    abort: AbortFlag,
    on_scheduled: Option<ScheduledCallback<'a>>,
}

impl<'a> ActionPlanner<'a> {
    pub fn new(ops: &'a dyn DirectoryOps, format: impl Into<String>, mode: RenameMode) -> Self {
        Self {
            ops,
            format: format.into(),
            mode,
            log: ActionLog::new(),
            aggregation: AggregationContext::new(),
            abort: AbortFlag::new(),
            on_scheduled: None,
        }
    }

    /// Share an abort flag with the caller (e.g. a Ctrl-C handler).
    pub fn with_abort_flag(mut self, abort: AbortFlag) -> Self {
        self.abort = abort;
        self
    }

    /// Called with a description of every action as it becomes final.
    pub fn on_scheduled(mut self, callback: impl FnMut(&ActionDescription) + 'a) -> Self {
        self.on_scheduled = Some(Box::new(callback));
        self
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn mode(&self) -> RenameMode {
        self.mode
    }

    pub fn abort(&self) {
        self.abort.request();
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_requested()
    }

    /// Drop planned actions and aggregation state before a new run.
    pub fn clear(&mut self) {
        self.log.clear();
        self.aggregation.clear();
        self.abort.reset();
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    /// Hand the planned actions to the caller, leaving an empty log behind.
    pub fn take_log(&mut self) -> ActionLog {
        std::mem::take(&mut self.log)
    }

    /// Compute the current and desired directory of `file`.
    /// `None` if the file has no metadata for the format.
    pub fn generate_new_dirname(&self, file: &TrackFile, metadata: &dyn MetadataSource) -> Option<NewDirname> {
        let current = file.directory().to_path_buf();
        let expansion = metadata.expand(file, &self.format)?;
        let text = expansion.text.trim_end_matches(['/', '\\']);
        if text.is_empty() {
            return None;
        }
        let base = match self.mode {
            RenameMode::Rename => current.parent().map(Path::to_path_buf).unwrap_or_default(),
            RenameMode::Create => current.clone(),
        };
        let desired = base.join(text);
        Some(NewDirname {
            current,
            desired,
            aggregates: expansion.aggregates,
        })
    }

    /// Follow already planned directory renames so `dir` is evaluated at its
    /// future location. Renames of an ancestor carry `dir` along.
    pub fn replace_if_already_renamed(&self, dir: &Path) -> PathBuf {
        let mut current = dir.to_path_buf();
        for _ in 0..MAX_RENAME_HOPS {
            match self.renamed_location(&current) {
                Some(next) => {
                    trace!(from = %current.display(), to = %next.display(), "following planned rename");
                    current = next;
                }
                None => return current,
            }
        }
        debug!(dir = %dir.display(), hops = MAX_RENAME_HOPS, "rename chain not fully resolved");
        current
    }

    fn renamed_location(&self, path: &Path) -> Option<PathBuf> {
        if let Some(dest) = self.log.renamed_directory(path) {
            return Some(dest.to_path_buf());
        }
        let (src, dest) = self
            .log
            .directory_renames()
            .filter(|(src, _)| *src != path && path.starts_with(src))
            .max_by_key(|(src, _)| src.components().count())?;
        let rest = path.strip_prefix(src).ok()?;
        Some(dest.join(rest))
    }

    /// Plan the actions for one file. Returns false once aborted.
    pub fn schedule(&mut self, file: &TrackFile, metadata: &dyn MetadataSource) -> bool {
        if self.is_aborted() {
            return false;
        }
        let Some(target) = self.generate_new_dirname(file, metadata) else {
            trace!(file = %file.path().display(), "no metadata for format; skipped");
            return true;
        };
        if target.desired.components().any(|c| c == Component::ParentDir) {
            self.report(RenameError::TemplateMismatch {
                current: target.current,
                desired: target.desired,
                reason: "directory name contains '..'".into(),
            });
            return true;
        }
        for (code, value) in &target.aggregates {
            self.aggregation.add_value(code, value);
        }
        self.aggregation
            .put_directory(&target.desired.to_string_lossy());
        self.plan_file(file, target.current, &target.desired);
        true
    }

    fn plan_file(&mut self, file: &TrackFile, mut current: PathBuf, desired: &Path) {
        let name = file.file_name();
        let handle = file.handle().cloned();

        for round in 0..MAX_ROUNDS {
            current = self.replace_if_already_renamed(&current);
            if self.renamed_location(&current).is_some() {
                self.report(RenameError::TemplateMismatch {
                    current,
                    desired: desired.to_path_buf(),
                    reason: format!("rename chain longer than {MAX_RENAME_HOPS} hops"),
                });
                return;
            }
            if current == desired {
                return;
            }

            if let Ok(rest) = desired.strip_prefix(&current) {
                self.schedule_descendant(&current, rest, desired, name, handle);
                return;
            }

            let parent = current.parent().map(Path::to_path_buf).unwrap_or_default();
            let Ok(rest) = desired.strip_prefix(&parent) else {
                self.report(RenameError::TemplateMismatch {
                    current,
                    desired: desired.to_path_buf(),
                    reason: "not below the parent directory".into(),
                });
                return;
            };
            let mut parts = rest.components();
            let first = parts.next();
            let nested = parts.next().is_some();
            let target = match first {
                Some(part) => parent.join(part),
                None => parent.clone(),
            };

            let already_there = first.is_none()
                || (self.ops.path_is_directory(&target) && !self.log.has_source(&target))
                || self.log.has_destination(&target);
            if already_there {
                self.add(
                    RenameAction::rename_file(current.join(name), target.join(name)).with_handle(handle.clone()),
                );
            } else {
                self.add(RenameAction::rename_directory(&current, &target).with_handle(handle.clone()));
            }
            current = target;

            if !nested {
                return;
            }
            if round + 1 == MAX_ROUNDS {
                self.report(RenameError::TemplateMismatch {
                    current,
                    desired: desired.to_path_buf(),
                    reason: format!("needs more than {MAX_ROUNDS} refinement rounds"),
                });
                return;
            }
        }
    }

    fn schedule_descendant(
        &mut self,
        current: &Path,
        rest: &Path,
        desired: &Path,
        name: &OsStr,
        handle: Option<Arc<dyn FileHandle>>,
    ) {
        let levels = rest.components().count();
        if levels > MAX_NEW_LEVELS {
            self.report(RenameError::TemplateMismatch {
                current: current.to_path_buf(),
                desired: desired.to_path_buf(),
                reason: format!("more than {MAX_NEW_LEVELS} new directory levels"),
            });
            return;
        }
        let mut dir = current.to_path_buf();
        for part in rest.components() {
            dir.push(part);
            self.add(RenameAction::create_directory(&dir));
        }
        self.add(RenameAction::rename_file(current.join(name), dir.join(name)).with_handle(handle));
    }

    fn report(&mut self, error: RenameError) {
        warn!(code = error.code(), kind = error.kind(), "{error}");
        self.add(RenameAction::report_error(error));
    }

    fn add(&mut self, action: RenameAction) -> bool {
        let description = describe(&action);
        if !self.log.push(action) {
            return false;
        }
        debug!(action = %description, "scheduled");
        if !self.aggregation.has_aggregated_codes() {
            if let Some(callback) = self.on_scheduled.as_mut() {
                callback(&description);
            }
        }
        true
    }

    /// Resolve aggregate placeholders in every planned path. When aggregates
    /// were used, progress for the whole run is reported here instead of
    /// while scheduling.
    pub fn finalize(&mut self) {
        let (replacements, unusable): (Vec<_>, Vec<_>) = self
            .aggregation
            .take_replacements()
            .into_iter()
            .partition(|(placeholder, resolved)| keeps_directory_shape(placeholder, resolved));
        for (placeholder, resolved) in unusable {
            let removed = self.log.remove_below(Path::new(&placeholder));
            let current = removed
                .iter()
                .find_map(RenameAction::source)
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(&placeholder));
            self.report(RenameError::TemplateMismatch {
                current,
                desired: PathBuf::from(resolved),
                reason: "aggregate resolved to an empty directory name".into(),
            });
        }
        if !replacements.is_empty() {
            let dropped = self.log.rewrite_paths(|path| {
                replacements
                    .iter()
                    .find_map(|(placeholder, resolved)| rewrite_placeholder_path(path, placeholder, resolved))
            });
            debug!(
                directories = replacements.len(),
                dropped, "resolved aggregate directory names"
            );
        }
        if self.aggregation.has_aggregated_codes() {
            if let Some(callback) = self.on_scheduled.as_mut() {
                for action in self.log.iter() {
                    callback(&describe(action));
                }
            }
        }
    }
}

impl fmt::Debug for ActionPlanner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionPlanner")
            .field("format", &self.format)
            .field("mode", &self.mode)
            .field("actions", &self.log.len())
            .field("aborted", &self.is_aborted())
            .finish()
    }
}
