//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/log paths and detects symlinked ancestors for safety.

use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "TAGDIR_CONFIG";

/// Config path: `$TAGDIR_CONFIG` if set, else the OS config dir.
/// A directory in `$TAGDIR_CONFIG` means `<dir>/config.xml`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        let p = PathBuf::from(p);
        return Some(if p.is_dir() { p.join("config.xml") } else { p });
    }
    if let Some(mut base) = config_dir() {
        base.push("tagdir");
        base.push("config.xml");
        Some(base)
    } else {
        env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(".config").join("tagdir").join("config.xml"))
    }
}

/// OS-appropriate default log file path (data dir).
pub fn default_log_path() -> Option<PathBuf> {
    if let Some(mut base) = data_dir() {
        base.push("tagdir");
        base.push("tagdir.log");
        Some(base)
    } else {
        env::var("HOME").ok().map(|h| {
            PathBuf::from(h)
                .join(".local")
                .join("share")
                .join("tagdir")
                .join("tagdir.log")
        })
    }
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}
