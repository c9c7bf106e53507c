//! Ports between the planner and the rest of the application.
//! - `TrackFile`: one audio file of the batch (location + optional handle).
//! - `FileHandle`: the only operations the planner/executor need from a file model.
//! - `MetadataSource`: expands a format template against one file's metadata.

use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-file token owned by the caller's file model (e.g. a tree view node).
///
/// Both methods have defaults so plain path-based callers need no model at all.
pub trait FileHandle: fmt::Debug + Send + Sync {
    /// Release any open handles to this file before it is moved.
    fn close(&self) {}

    /// Rename through the model instead of the raw filesystem.
    /// `None` means "not handled here", so the executor falls back to `DirectoryOps`.
    fn rename(&self, _from: &Path, _to: &Path) -> Option<io::Result<()>> {
        None
    }
}

/// One file of a reorganization batch.
#[derive(Debug, Clone)]
pub struct TrackFile {
    path: PathBuf,
    handle: Option<Arc<dyn FileHandle>>,
}

impl TrackFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            handle: None,
        }
    }

    pub fn with_handle(mut self, handle: Arc<dyn FileHandle>) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the file (no trailing separator).
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn file_name(&self) -> &OsStr {
        self.path.file_name().unwrap_or_else(|| OsStr::new(""))
    }

    pub fn handle(&self) -> Option<&Arc<dyn FileHandle>> {
        self.handle.as_ref()
    }
}

/// Result of expanding a template for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Expanded text; aggregate codes are still present as placeholders.
    pub text: String,
    /// `(aggregate code, per-file base value)` for every aggregate referenced.
    pub aggregates: Vec<(String, String)>,
}

impl Expansion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            aggregates: Vec::new(),
        }
    }

    pub fn with_aggregate(mut self, code: impl Into<String>, value: impl Into<String>) -> Self {
        self.aggregates.push((code.into(), value.into()));
        self
    }
}

/// Template expansion for one file.
pub trait MetadataSource {
    /// Expand `template` against the metadata of `file`.
    /// Returns `None` when the metadata the template uses is empty or inactive.
    fn expand(&self, file: &TrackFile, template: &str) -> Option<Expansion>;
}

impl<F> MetadataSource for F
where
    F: Fn(&TrackFile, &str) -> Option<Expansion>,
{
    fn expand(&self, file: &TrackFile, template: &str) -> Option<Expansion> {
        self(file, template)
    }
}
