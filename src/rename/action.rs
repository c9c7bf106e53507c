//! Planned filesystem operations and the ordered log that holds them.
//!
//! The log keeps insertion order (later actions may depend on directories
//! created or renamed by earlier ones) and rejects an action whose non-empty
//! source or destination is already claimed by another action.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::track::FileHandle;
use crate::errors::RenameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionKind {
    CreateDirectory,
    RenameDirectory,
    RenameFile,
    ReportError,
}

impl ActionKind {
    /// Human readable verb, independent of locale.
    pub fn verb(self) -> &'static str {
        match self {
            ActionKind::CreateDirectory => "Create directory",
            ActionKind::RenameDirectory => "Rename directory",
            ActionKind::RenameFile => "Rename file",
            ActionKind::ReportError => "Error",
        }
    }
}

/// One planned filesystem operation.
#[derive(Debug, Clone)]
pub enum RenameAction {
    CreateDirectory {
        destination: PathBuf,
    },
    RenameDirectory {
        source: PathBuf,
        destination: PathBuf,
        handle: Option<Arc<dyn FileHandle>>,
    },
    RenameFile {
        source: PathBuf,
        destination: PathBuf,
        handle: Option<Arc<dyn FileHandle>>,
    },
    /// Deferred planning error; reported when the log is executed.
    ReportError { error: RenameError },
}

impl RenameAction {
    pub fn create_directory(destination: impl Into<PathBuf>) -> Self {
        RenameAction::CreateDirectory {
            destination: destination.into(),
        }
    }

    pub fn rename_directory(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        RenameAction::RenameDirectory {
            source: source.into(),
            destination: destination.into(),
            handle: None,
        }
    }

    pub fn rename_file(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        RenameAction::RenameFile {
            source: source.into(),
            destination: destination.into(),
            handle: None,
        }
    }

    pub fn report_error(error: RenameError) -> Self {
        RenameAction::ReportError { error }
    }

    /// Attach the originating file's handle (ignored for create/error actions).
    pub fn with_handle(mut self, file_handle: Option<Arc<dyn FileHandle>>) -> Self {
        match &mut self {
            RenameAction::RenameDirectory { handle, .. } | RenameAction::RenameFile { handle, .. } => {
                *handle = file_handle;
            }
            _ => {}
        }
        self
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            RenameAction::CreateDirectory { .. } => ActionKind::CreateDirectory,
            RenameAction::RenameDirectory { .. } => ActionKind::RenameDirectory,
            RenameAction::RenameFile { .. } => ActionKind::RenameFile,
            RenameAction::ReportError { .. } => ActionKind::ReportError,
        }
    }

    pub fn source(&self) -> Option<&Path> {
        match self {
            RenameAction::RenameDirectory { source, .. } | RenameAction::RenameFile { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }

    pub fn destination(&self) -> Option<&Path> {
        match self {
            RenameAction::CreateDirectory { destination }
            | RenameAction::RenameDirectory { destination, .. }
            | RenameAction::RenameFile { destination, .. } => Some(destination),
            RenameAction::ReportError { .. } => None,
        }
    }

    pub fn handle(&self) -> Option<&Arc<dyn FileHandle>> {
        match self {
            RenameAction::RenameDirectory { handle, .. } | RenameAction::RenameFile { handle, .. } => {
                handle.as_ref()
            }
            _ => None,
        }
    }

    /// A directory or file rename whose source is its destination.
    pub fn is_self_rename(&self) -> bool {
        matches!(
            self,
            RenameAction::RenameDirectory { source, destination, .. }
                | RenameAction::RenameFile { source, destination, .. } if source == destination
        )
    }

    /// Apply `f` to every path; `None` from `f` keeps the path as is.
    fn map_paths(self, mut f: impl FnMut(&Path) -> Option<PathBuf>) -> Self {
        let mut map = |p: PathBuf| f(&p).unwrap_or(p);
        match self {
            RenameAction::CreateDirectory { destination } => RenameAction::CreateDirectory {
                destination: map(destination),
            },
            RenameAction::RenameDirectory {
                source,
                destination,
                handle,
            } => RenameAction::RenameDirectory {
                source: map(source),
                destination: map(destination),
                handle,
            },
            RenameAction::RenameFile {
                source,
                destination,
                handle,
            } => RenameAction::RenameFile {
                source: map(source),
                destination: map(destination),
                handle,
            },
            error @ RenameAction::ReportError { .. } => error,
        }
    }
}

/// Equality ignores the file handle.
impl PartialEq for RenameAction {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RenameAction::ReportError { error: a }, RenameAction::ReportError { error: b }) => a == b,
            _ => {
                self.kind() == other.kind()
                    && self.source() == other.source()
                    && self.destination() == other.destination()
            }
        }
    }
}

impl Eq for RenameAction {}

/// `(verb, [source], destination)` view of an action for progress output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDescription {
    pub verb: &'static str,
    pub source: Option<String>,
    pub destination: String,
}

impl fmt::Display for ActionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "{}: {} -> {}", self.verb, src, self.destination),
            None => write!(f, "{}: {}", self.verb, self.destination),
        }
    }
}

pub fn describe(action: &RenameAction) -> ActionDescription {
    let destination = match action {
        RenameAction::ReportError { error } => error.to_string(),
        other => other
            .destination()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
    };
    ActionDescription {
        verb: action.kind().verb(),
        source: action.source().map(|p| p.display().to_string()),
        destination,
    }
}

#[inline]
fn non_empty(p: Option<&Path>) -> Option<&Path> {
    p.filter(|p| !p.as_os_str().is_empty())
}

/// Ordered list of planned actions with lookup by source and destination.
#[derive(Debug, Default)]
pub struct ActionLog {
    actions: Vec<RenameAction>,
    by_source: HashMap<PathBuf, usize>,
    by_destination: HashMap<PathBuf, usize>,
    messages: HashSet<String>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> &[RenameAction] {
        &self.actions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RenameAction> {
        self.actions.iter()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.by_source.clear();
        self.by_destination.clear();
        self.messages.clear();
    }

    pub fn describe_all(&self) -> Vec<ActionDescription> {
        self.actions.iter().map(describe).collect()
    }

    /// True if an action already uses `src` as its source. Empty paths never match.
    pub fn has_source(&self, src: &Path) -> bool {
        !src.as_os_str().is_empty() && self.by_source.contains_key(src)
    }

    /// True if an action already targets `dest`. Empty paths never match.
    pub fn has_destination(&self, dest: &Path) -> bool {
        !dest.as_os_str().is_empty() && self.by_destination.contains_key(dest)
    }

    /// Destination of the planned `RenameDirectory` whose source is exactly `src`.
    pub fn renamed_directory(&self, src: &Path) -> Option<&Path> {
        let idx = *self.by_source.get(src)?;
        match &self.actions[idx] {
            RenameAction::RenameDirectory { destination, .. } => Some(destination),
            _ => None,
        }
    }

    /// All planned directory renames as `(source, destination)`, in order.
    pub fn directory_renames(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.actions.iter().filter_map(|a| match a {
            RenameAction::RenameDirectory {
                source,
                destination,
                ..
            } => Some((source.as_path(), destination.as_path())),
            _ => None,
        })
    }

    /// Append `action` unless it conflicts with an existing one.
    /// Returns false when the action was rejected as a duplicate.
    pub fn push(&mut self, action: RenameAction) -> bool {
        if let RenameAction::ReportError { error } = &action {
            let message = error.to_string();
            if !self.messages.insert(message.clone()) {
                debug!(%message, "duplicate error report dropped");
                return false;
            }
            self.actions.push(action);
            return true;
        }

        let src = non_empty(action.source());
        let dest = non_empty(action.destination());
        if let Some(s) = src {
            if self.by_source.contains_key(s) {
                debug!(src = %s.display(), kind = ?action.kind(), "action with same source already planned");
                return false;
            }
        }
        if let Some(d) = dest {
            if self.by_destination.contains_key(d) {
                debug!(dest = %d.display(), kind = ?action.kind(), "action with same destination already planned");
                return false;
            }
        }

        let idx = self.actions.len();
        if let Some(s) = src {
            self.by_source.insert(s.to_path_buf(), idx);
        }
        if let Some(d) = dest {
            self.by_destination.insert(d.to_path_buf(), idx);
        }
        self.actions.push(action);
        true
    }

    /// Rewrite every path through `f` and rebuild the indices.
    /// Renames that end up onto themselves are dropped silently; actions
    /// that collide after the rewrite are dropped with a warning. Returns
    /// how many collided.
    pub fn rewrite_paths(&mut self, mut f: impl FnMut(&Path) -> Option<PathBuf>) -> usize {
        let old = std::mem::take(&mut self.actions);
        self.clear();
        let mut dropped = 0;
        for action in old {
            let action = action.map_paths(&mut f);
            let description = describe(&action);
            if action.is_self_rename() {
                debug!(action = %description, "source and destination coincide; nothing to do");
                continue;
            }
            if !self.push(action) {
                warn!(action = %description, "dropped: conflicts with another action once directory names are resolved");
                dropped += 1;
            }
        }
        dropped
    }

    /// Take out every action that reads or writes at or below `dir`.
    pub fn remove_below(&mut self, dir: &Path) -> Vec<RenameAction> {
        let old = std::mem::take(&mut self.actions);
        self.clear();
        let mut removed = Vec::new();
        for action in old {
            let touches = action.source().is_some_and(|p| p.starts_with(dir))
                || action.destination().is_some_and(|p| p.starts_with(dir));
            if touches {
                removed.push(action);
            } else {
                self.push(action);
            }
        }
        removed
    }
}

impl IntoIterator for ActionLog {
    type Item = RenameAction;
    type IntoIter = std::vec::IntoIter<RenameAction>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}

impl<'a> IntoIterator for &'a ActionLog {
    type Item = &'a RenameAction;
    type IntoIter = std::slice::Iter<'a, RenameAction>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_source_and_destination() {
        let mut log = ActionLog::new();
        assert!(log.push(RenameAction::rename_directory("/m/a", "/m/b")));
        assert!(!log.push(RenameAction::rename_directory("/m/a", "/m/c")));
        assert!(!log.push(RenameAction::rename_file("/m/x/1.mp3", "/m/b")));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn create_directories_only_conflict_on_destination() {
        let mut log = ActionLog::new();
        assert!(log.push(RenameAction::create_directory("/m/a/live")));
        assert!(log.push(RenameAction::create_directory("/m/a/studio")));
        assert!(!log.push(RenameAction::create_directory("/m/a/live")));
        assert!(!log.has_source(Path::new("")));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn identical_error_messages_are_reported_once() {
        let mut log = ActionLog::new();
        assert!(log.push(RenameAction::report_error(RenameError::NotAFile("/boom".into()))));
        assert!(!log.push(RenameAction::report_error(RenameError::NotAFile("/boom".into()))));
        assert!(log.push(RenameAction::report_error(RenameError::NotAFile("/other".into()))));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn renamed_directory_ignores_file_renames() {
        let mut log = ActionLog::new();
        log.push(RenameAction::rename_file("/m/a/1.mp3", "/m/b/1.mp3"));
        log.push(RenameAction::rename_directory("/m/c", "/m/d"));
        assert_eq!(log.renamed_directory(Path::new("/m/a/1.mp3")), None);
        assert_eq!(log.renamed_directory(Path::new("/m/c")), Some(Path::new("/m/d")));
    }

    #[test]
    fn describe_formats_verb_source_destination() {
        let d = describe(&RenameAction::rename_directory("/m/a", "/m/b"));
        assert_eq!(d.verb, "Rename directory");
        assert_eq!(d.source.as_deref(), Some("/m/a"));
        assert_eq!(d.to_string(), "Rename directory: /m/a -> /m/b");

        let e = describe(&RenameAction::report_error(RenameError::NotADirectory("/m/x".into())));
        assert_eq!(e.to_string(), "Error: /m/x is not a directory");
        assert!(e.source.is_none());
    }

    #[test]
    fn rewrite_drops_actions_that_collide() {
        let mut log = ActionLog::new();
        log.push(RenameAction::rename_directory("/m/x", "/m/%{max-year}"));
        log.push(RenameAction::rename_directory("/m/y", "/m/2001"));
        let dropped = log.rewrite_paths(|p| {
            (p == Path::new("/m/%{max-year}")).then(|| PathBuf::from("/m/2001"))
        });
        assert_eq!(dropped, 1);
        assert_eq!(log.actions(), &[RenameAction::rename_directory("/m/x", "/m/2001")]);
        assert!(log.has_destination(Path::new("/m/2001")));
    }

    #[test]
    fn rewrite_drops_renames_onto_themselves() {
        let mut log = ActionLog::new();
        log.push(RenameAction::rename_directory("/m/Queen (2001)", "/m/Queen (%{max-year})"));
        log.push(RenameAction::rename_file("/m/x/1.mp3", "/m/y/1.mp3"));
        let dropped = log.rewrite_paths(|p| {
            (p == Path::new("/m/Queen (%{max-year})")).then(|| PathBuf::from("/m/Queen (2001)"))
        });
        assert_eq!(dropped, 0, "not a collision");
        assert_eq!(log.actions(), &[RenameAction::rename_file("/m/x/1.mp3", "/m/y/1.mp3")]);
        assert!(!log.has_source(Path::new("/m/Queen (2001)")));
    }

    #[test]
    fn remove_below_takes_actions_touching_the_directory() {
        let mut log = ActionLog::new();
        log.push(RenameAction::create_directory("/m/a/%{unq-x}"));
        log.push(RenameAction::rename_file("/m/a/1.mp3", "/m/a/%{unq-x}/1.mp3"));
        log.push(RenameAction::rename_directory("/m/b", "/m/c"));
        let removed = log.remove_below(Path::new("/m/a/%{unq-x}"));
        assert_eq!(removed.len(), 2);
        assert_eq!(log.actions(), &[RenameAction::rename_directory("/m/b", "/m/c")]);
        assert!(!log.has_source(Path::new("/m/a/1.mp3")));
    }
}
