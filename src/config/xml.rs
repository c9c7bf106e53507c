//! XML configuration support.
//! - Loads settings from config.xml (quick_xml).
//! - Creates a secure template if missing (unless TAGDIR_CONFIG is set).
//!
//! Notes:
//! - This module only reads/writes the config file; validation happens elsewhere.
//! - Unknown XML fields are a parse error so misconfigurations surface early.

use anyhow::{anyhow, Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::paths::{default_config_path, default_log_path, path_has_symlink_ancestor, CONFIG_ENV};
use super::FORMAT_DEFAULT;

use crate::config::types::{Config, LogLevel};
use crate::platform::{set_dir_mode_0700, set_file_mode_0600, write_config_secure_new_0600};
use crate::rename::RenameMode;

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    #[serde(rename = "format")]
    format: Option<String>,
    #[serde(rename = "mode")]
    mode: Option<String>,
    #[serde(rename = "log_level")]
    log_level: Option<String>,
    #[serde(rename = "log_file")]
    log_file: Option<String>,
    #[serde(rename = "dry_run", default, deserialize_with = "de_bool_trimmed_opt")]
    dry_run: Option<bool>,
}

// Accepts surrounding whitespace and 1/0 alongside true/false
fn de_bool_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }))
}

// Map XmlConfig -> Config; missing fields keep their defaults
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(format) = parsed.format.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        cfg.format = format.to_string();
    }
    if let Some(mode) = parsed.mode.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        cfg.mode = mode.parse::<RenameMode>().map_err(|e| anyhow!(e))?;
    }
    if let Some(level) = parsed.log_level.as_deref() {
        if let Ok(level) = level.trim().parse::<LogLevel>() {
            cfg.log_level = level;
        }
    }
    // An explicitly empty <log_file/> disables file logging
    if let Some(s) = parsed.log_file.as_deref() {
        let trimmed = s.trim();
        cfg.log_file = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
    }
    cfg.dry_run = parsed.dry_run.unwrap_or(false);

    Ok(cfg)
}

/// Load a Config from a specific XML file path (quick_xml).
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    let cfg = xml_to_config(parsed).with_context(|| format!("invalid config xml '{}'", path.display()))?;
    debug!(path = %path.display(), format = %cfg.format, mode = %cfg.mode, "loaded config");
    Ok(cfg)
}

/// If TAGDIR_CONFIG is set, load and return that Config; otherwise Ok(None).
pub fn load_config_from_xml_env() -> Result<Option<Config>> {
    if env::var_os(CONFIG_ENV).is_none_or(|p| p.is_empty()) {
        return Ok(None);
    }
    let path = default_config_path().context("resolve TAGDIR_CONFIG")?;
    load_config_from_xml_path(&path).map(Some)
}

/// Try loading Config from the platform default config.xml path.
/// Returns Ok(Some(cfg)) if the file exists and parses; Ok(None) if missing.
pub fn load_config_from_default_xml() -> Result<Option<Config>> {
    let Some(path) = default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load_config_from_xml_path(&path).map(Some)
}

/// Create default template config file and parent directory (best-effort permissions).
/// Uses secure creation to avoid following attacker-controlled symlinks on Unix.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        return Err(anyhow!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        ));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
        let _ = set_dir_mode_0700(parent);
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "/path/to/tagdir.log".into());

    let content = format!(
        "<!--\n  tagdir configuration (XML)\n\n  format     -> directory name template, e.g. %{{artist}}/%{{album}} or %a - %l (%{{max-year}})\n  mode       -> rename (replace the track's directory) | create (create below it)\n  log_level  -> quiet | normal | info | debug\n  log_file   -> path to log file (optional; stdout/stderr still used)\n  dry_run    -> true to only print the plan\n\n  CLI flags override XML values.\n-->\n<config>\n  <format>{}</format>\n  <mode>rename</mode>\n  <log_level>normal</log_level>\n  <log_file>{}</log_file>\n  <dry_run>false</dry_run>\n</config>\n",
        FORMAT_DEFAULT, suggested_log,
    );

    write_config_secure_new_0600(path, content.as_bytes())?;
    let _ = set_file_mode_0600(path);

    info!("Created template config at {}", path.display());
    Ok(())
}

/// Create default config if TAGDIR_CONFIG not set; return created path so CLI can inform the user.
pub fn ensure_default_config_exists() -> Option<PathBuf> {
    if env::var_os(CONFIG_ENV).is_some() {
        return None;
    }

    let cfg_path = default_config_path()?;
    if cfg_path.exists() {
        return None;
    }

    if let Ok(true) = path_has_symlink_ancestor(&cfg_path) {
        eprintln!(
            "Refusing to create template config because an existing ancestor is a symlink: {}",
            cfg_path.display()
        );
        return None;
    }

    match create_template_config(&cfg_path) {
        Ok(()) => Some(cfg_path),
        Err(e) => {
            eprintln!(
                "Failed to create template config at {}: {}",
                cfg_path.display(),
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_config_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tagdir").join("config.xml");
        create_template_config(&path).unwrap();
        let cfg = load_config_from_xml_path(&path).unwrap();
        assert_eq!(cfg.format, FORMAT_DEFAULT);
        assert_eq!(cfg.mode, RenameMode::Rename);
        assert!(!cfg.dry_run);
        assert!(create_template_config(&path).is_err(), "never overwrites");
    }
}
