//! Aggregate directory-name codes (`max-year`, `min-year`, `unq-artist`, ...).
//!
//! A directory whose name depends on an aggregate can only be named once every
//! file that ends up in it has been seen. The template layer leaves such codes
//! in the expanded text as placeholders (`%{max-year}`) and reports each
//! file's base value here. Consecutive files mapping to the same raw directory
//! string form one session; when a different directory (or the end of the
//! batch) arrives, the session is closed and a
//! `(placeholder_dir, resolved_dir)` pair is produced.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// How the collected values of one aggregate code are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    /// Lexicographic maximum.
    Max,
    /// Lexicographic minimum.
    Min,
    /// Common value if all are equal, otherwise empty.
    Unique,
}

impl AggregateKind {
    /// Split an aggregate code into its kind and base code, e.g.
    /// `"max-year"` -> `(Max, "year")`. Non-aggregate codes yield `None`.
    pub fn parse(code: &str) -> Option<(Self, &str)> {
        let (prefix, base) = code.split_once('-')?;
        if base.is_empty() {
            return None;
        }
        let kind = match prefix {
            "max" => AggregateKind::Max,
            "min" => AggregateKind::Min,
            "unq" => AggregateKind::Unique,
            _ => return None,
        };
        Some((kind, base))
    }

    /// Combine collected values. Comparison is on strings, not numbers, so
    /// multi-field values such as dates order naturally.
    pub fn resolve(self, values: &[String]) -> String {
        match self {
            AggregateKind::Max => values.iter().max().cloned().unwrap_or_default(),
            AggregateKind::Min => values.iter().min().cloned().unwrap_or_default(),
            AggregateKind::Unique => match values.split_first() {
                Some((first, rest)) if rest.iter().all(|v| v == first) => first.clone(),
                _ => String::new(),
            },
        }
    }
}

/// Placeholder token the template layer leaves in place of an aggregate code.
pub fn placeholder(code: &str) -> String {
    format!("%{{{code}}}")
}

#[derive(Debug)]
struct Session {
    pending_directory: String,
    collected: BTreeMap<String, Vec<String>>,
}

/// Collects aggregate values per pending directory and resolves them.
#[derive(Debug, Default)]
pub struct AggregationContext {
    session: Option<Session>,
    /// Values added for the file currently being expanded.
    in_flight: BTreeMap<String, Vec<String>>,
    replacements: Vec<(String, String)>,
    has_codes: bool,
}

impl AggregationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all sessions, values and pending replacements.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Record `value` as a contribution of the current file to `code`.
    pub fn add_value(&mut self, code: &str, value: &str) {
        self.has_codes = true;
        self.in_flight
            .entry(code.to_string())
            .or_default()
            .push(value.to_string());
    }

    /// Assign the values added since the last call to the raw directory `name`.
    /// An empty name closes the open session without starting a new one.
    pub fn put_directory(&mut self, name: &str) {
        if name.is_empty() {
            self.close_session();
            self.in_flight.clear();
            return;
        }
        let values = std::mem::take(&mut self.in_flight);
        if let Some(session) = self.session.as_mut().filter(|s| s.pending_directory == name) {
            for (code, vals) in values {
                session.collected.entry(code).or_default().extend(vals);
            }
            return;
        }
        self.close_session();
        self.session = Some(Session {
            pending_directory: name.to_string(),
            collected: values,
        });
    }

    /// Close the open session and hand out all `(placeholder_dir, resolved_dir)` pairs.
    pub fn take_replacements(&mut self) -> Vec<(String, String)> {
        self.put_directory("");
        std::mem::take(&mut self.replacements)
    }

    /// True once any aggregate value has been added since the last `clear()`.
    pub fn has_aggregated_codes(&self) -> bool {
        self.has_codes
    }

    fn close_session(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        if session.collected.is_empty() {
            return;
        }
        let mut resolved = session.pending_directory.clone();
        for (code, values) in &session.collected {
            let Some((kind, _base)) = AggregateKind::parse(code) else {
                continue;
            };
            resolved = resolved.replace(&placeholder(code), &kind.resolve(values));
        }
        if resolved != session.pending_directory {
            debug!(placeholder = %session.pending_directory, %resolved, "resolved aggregate directory");
            self.replacements.push((session.pending_directory, resolved));
        }
    }
}

/// True when the resolved directory still has one usable name per component
/// of the placeholder directory. An ambiguous `unq-` code that makes up a
/// whole name resolves to nothing and fails this check.
pub fn keeps_directory_shape(placeholder_dir: &str, resolved_dir: &str) -> bool {
    let expected = Path::new(placeholder_dir).components().count();
    let resolved: Vec<Component<'_>> = Path::new(resolved_dir).components().collect();
    resolved.len() == expected
        && resolved.iter().all(|c| match c {
            Component::Normal(name) => !name.to_string_lossy().trim().is_empty(),
            Component::ParentDir | Component::CurDir => false,
            Component::RootDir | Component::Prefix(_) => true,
        })
}

/// Rewrite `path` if it lies on the placeholder directory's path: either below
/// it (`placeholder/file.mp3`) or one of its placeholder-bearing ancestors
/// (`/music/%{max-year}` for `/music/%{max-year}/Album`).
pub fn rewrite_placeholder_path(path: &Path, placeholder_dir: &str, resolved_dir: &str) -> Option<PathBuf> {
    let ph = Path::new(placeholder_dir);
    let res = Path::new(resolved_dir);

    if let Ok(rest) = path.strip_prefix(ph) {
        return Some(if rest.as_os_str().is_empty() {
            res.to_path_buf()
        } else {
            res.join(rest)
        });
    }

    // Ancestor of the placeholder directory: map component-wise, which only
    // works while both sides have the same shape.
    let ph_parts: Vec<Component<'_>> = ph.components().collect();
    let res_parts: Vec<Component<'_>> = res.components().collect();
    let parts: Vec<Component<'_>> = path.components().collect();
    if ph_parts.len() != res_parts.len() || parts.len() >= ph_parts.len() {
        return None;
    }
    if parts[..] != ph_parts[..parts.len()] {
        return None;
    }
    let rewritten: PathBuf = res_parts[..parts.len()].iter().collect();
    (rewritten.as_path() != path).then_some(rewritten)
}
