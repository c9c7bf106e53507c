//! Typed error definitions for tagdir.
//! Every planned or executed action fails with one of these; they are
//! collected per action and never abort a batch on their own.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenameError {
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("{} is not a file", .0.display())]
    NotAFile(PathBuf),

    #[error("{op} failed: {detail}")]
    OperationFailed { op: String, detail: String },

    #[error(
        "New directory name is too different ({reason}): {} -> {}",
        .current.display(),
        .desired.display()
    )]
    TemplateMismatch {
        current: PathBuf,
        desired: PathBuf,
        reason: String,
    },

    #[error(
        "Refusing to rename {} to {}: destination is a different entry",
        .from.display(),
        .to.display()
    )]
    Unsafe { from: PathBuf, to: PathBuf },

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl RenameError {
    /// Stable numeric code for structured logs.
    pub fn code(&self) -> u16 {
        match self {
            RenameError::AlreadyExists(_) => 10,
            RenameError::NotADirectory(_) => 11,
            RenameError::NotAFile(_) => 12,
            RenameError::OperationFailed { .. } => 20,
            RenameError::TemplateMismatch { .. } => 30,
            RenameError::Unsafe { .. } => 40,
            RenameError::Interrupted => 130,
        }
    }

    /// Short machine-friendly name used as the `kind` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            RenameError::AlreadyExists(_) => "already_exists",
            RenameError::NotADirectory(_) => "not_a_directory",
            RenameError::NotAFile(_) => "not_a_file",
            RenameError::OperationFailed { .. } => "operation_failed",
            RenameError::TemplateMismatch { .. } => "template_mismatch",
            RenameError::Unsafe { .. } => "unsafe",
            RenameError::Interrupted => "interrupted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_show_plain_paths() {
        let e = RenameError::AlreadyExists("/m/Album".into());
        assert_eq!(e.to_string(), "/m/Album already exists");
        let e = RenameError::TemplateMismatch {
            current: "/m/a".into(),
            desired: "/x/b".into(),
            reason: "not below the parent directory".into(),
        };
        assert_eq!(
            e.to_string(),
            "New directory name is too different (not below the parent directory): /m/a -> /x/b"
        );
    }

    #[test]
    fn codes_are_distinct() {
        let all = [
            RenameError::AlreadyExists("a".into()),
            RenameError::NotADirectory("a".into()),
            RenameError::NotAFile("a".into()),
            RenameError::OperationFailed { op: "x".into(), detail: "y".into() },
            RenameError::TemplateMismatch { current: "a".into(), desired: "b".into(), reason: "r".into() },
            RenameError::Unsafe { from: "a".into(), to: "A".into() },
            RenameError::Interrupted,
        ];
        let mut codes: Vec<u16> = all.iter().map(RenameError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }
}
