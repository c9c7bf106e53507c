//! I/O helper utilities.
//!
//! Provides small adapters to enrich io::Error with actionable context/hints,
//! usable with map_err in both io::Result and RenameError code paths.
//!
//! Usage:
//!   // in executor code returning Result<_, RenameError>
//!   ops.rename_file(src, dst).map_err(rename_failed("rename file", src, dst))?;
//!
//!   // in functions returning io::Result<_>
//!   fs::rename(src, tmp).map_err(io_error_with_help("rename to temporary name", src))?;

use std::io;
use std::path::Path;

use crate::errors::RenameError;

/// Format a human-friendly message with op/path plus platform-aware hints.
fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);

    if let Some(code) = e.raw_os_error() {
        #[cfg(unix)]
        {
            match code {
                libc::EACCES | libc::EPERM => {
                    msg.push_str(" (permission denied; check ownership and write permissions)");
                }
                libc::EXDEV => {
                    msg.push_str(" (cross-filesystem; rename not possible between devices)");
                }
                libc::EBUSY => {
                    msg.push_str(" (resource busy; close players or editors using it)");
                }
                libc::ENOENT => {
                    msg.push_str(" (path not found; was it moved by an earlier action?)");
                }
                libc::EEXIST | libc::ENOTEMPTY => {
                    msg.push_str(" (destination already exists)");
                }
                libc::EINVAL => {
                    msg.push_str(" (cannot move a directory into itself)");
                }
                libc::EROFS => {
                    msg.push_str(" (read-only filesystem)");
                }
                libc::ENAMETOOLONG => {
                    msg.push_str(" (filename or path too long; shorten the format)");
                }
                _ => {}
            }
        }
        #[cfg(windows)]
        {
            match code {
                5 => msg.push_str(" (access denied; check permissions)"), // ERROR_ACCESS_DENIED
                17 => msg.push_str(" (not same device; cross-filesystem rename)"), // ERROR_NOT_SAME_DEVICE
                32 => msg.push_str(" (sharing violation; file is in use)"), // ERROR_SHARING_VIOLATION
                2 | 3 => msg.push_str(" (path not found)"), // FILE/ PATH NOT FOUND
                80 | 183 => msg.push_str(" (already exists)"), // ERROR_FILE_EXISTS / ERROR_ALREADY_EXISTS
                206 => msg.push_str(" (filename or path too long)"), // ERROR_FILENAME_EXCED_RANGE
                _ => {}
            }
        }
        msg.push_str(&format!(" [os code: {}]", code));
    } else {
        match e.kind() {
            io::ErrorKind::PermissionDenied => msg.push_str(" (permission denied)"),
            io::ErrorKind::NotFound => msg.push_str(" (path not found)"),
            io::ErrorKind::AlreadyExists => msg.push_str(" (already exists)"),
            _ => {}
        }
    }

    msg
}

/// Adapter for executor code: io::Error -> RenameError::OperationFailed.
pub fn rename_failed<'a>(
    op: &'a str,
    from: &'a Path,
    to: &'a Path,
) -> impl FnOnce(io::Error) -> RenameError + 'a {
    move |e: io::Error| RenameError::OperationFailed {
        op: format!("{} {} to {}", op, from.display(), to.display()),
        detail: build_message(op, from, &e),
    }
}

/// Adapter for io::Result code (when the surrounding function returns io::Result).
/// Preserves the original ErrorKind while adding context to the message.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> io::Error + 'a {
    move |e: io::Error| io::Error::new(e.kind(), build_message(op, path, &e))
}
