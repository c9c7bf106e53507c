//! Case-only renames (`Album` -> `ALBUM`).
//! On case-insensitive filesystems the new name is reported as already
//! existing, so the entry is first renamed to a unique hidden sibling and then
//! to its final name.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use super::helpers::io_error_with_help;

/// True if `old` and `new` are distinct names in the same directory that
/// differ only in letter case.
pub fn is_case_only_rename(old: &Path, new: &Path) -> bool {
    if old == new || old.parent() != new.parent() {
        return false;
    }
    match (old.file_name(), new.file_name()) {
        (Some(a), Some(b)) => {
            a != b && a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
        }
        _ => false,
    }
}

fn temp_sibling(target: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let name = format!(".tagdir.case.{pid}.{nanos}");
    target.parent().unwrap_or_else(|| Path::new(".")).join(name)
}

/// Rename `old` to `new` through an intermediate temporary name.
/// If the second step fails, the entry is moved back to `old` best-effort.
pub fn rename_via_temp(old: &Path, new: &Path) -> io::Result<()> {
    let tmp = temp_sibling(new);
    debug!(old = %old.display(), tmp = %tmp.display(), new = %new.display(), "case-only rename via temporary name");
    fs::rename(old, &tmp).map_err(io_error_with_help("rename to temporary name", old))?;
    if let Err(e) = fs::rename(&tmp, new) {
        let _ = fs::rename(&tmp, old);
        return Err(io_error_with_help("rename from temporary name", new)(e));
    }
    Ok(())
}
