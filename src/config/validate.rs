//! Config validation logic.
//! Verifies the root directory and the shape of the format template.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Component, Path};
use tracing::{debug, error, info};

use super::types::Config;

impl Config {
    /// Validate the root directory and format, canonicalizing `root` in place.
    pub fn validate(&mut self) -> Result<()> {
        ensure_dir_exists_and_is_dir(&self.root, "root")?;
        fs::read_dir(&self.root).with_context(|| {
            format!("Cannot read root directory '{}'; check permissions", self.root.display())
        })?;
        self.root = dunce::canonicalize(&self.root)
            .with_context(|| format!("canonicalize root '{}'", self.root.display()))?;
        debug!("root readable: {}", self.root.display());

        validate_format(&self.format)?;

        info!(
            "Config validated: root='{}' format='{}' mode={} log_file='{}'",
            self.root.display(),
            self.format,
            self.mode,
            self.log_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<none>".into())
        );
        Ok(())
    }
}

/// The format must be a non-empty relative path that never climbs upwards.
pub(crate) fn validate_format(format: &str) -> Result<()> {
    if format.trim().is_empty() {
        bail!("format must not be empty");
    }
    let path = Path::new(format);
    for component in path.components() {
        match component {
            Component::ParentDir => bail!("format must not contain '..': {format}"),
            Component::RootDir | Component::Prefix(_) => {
                bail!("format must be relative, got absolute path: {format}")
            }
            _ => {}
        }
    }
    Ok(())
}

/// Ensure path exists and is a directory; emit clear errors with path context.
fn ensure_dir_exists_and_is_dir(path: &Path, name: &str) -> Result<()> {
    if !path.exists() {
        error!("{name} does not exist: {}", path.display());
        bail!("{name} does not exist: {}", path.display());
    }
    if !path.is_dir() {
        error!("{name} is not a directory: {}", path.display());
        bail!("{name} is not a directory: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_shapes() {
        assert!(validate_format("%{artist}/%{album}").is_ok());
        assert!(validate_format("  ").is_err());
        assert!(validate_format("../%{album}").is_err());
        assert!(validate_format("%a/../x").is_err());
        #[cfg(unix)]
        assert!(validate_format("/abs/%{album}").is_err());
    }

    #[test]
    fn root_must_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.mp3");
        fs::write(&file, b"x").unwrap();
        let mut cfg = Config::new(&file, "%a");
        assert!(cfg.validate().is_err());
        let mut cfg = Config::new(dir.path().join("missing"), "%a");
        assert!(cfg.validate().is_err());
        let mut cfg = Config::new(dir.path(), "%a");
        cfg.validate().unwrap();
        assert!(cfg.root.is_absolute());
    }
}
