use std::fs;
use tempfile::tempdir;

use tagdir::config::load_config_from_xml_path;
use tagdir::{LogLevel, RenameMode};

#[test]
fn reads_all_fields() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    let log = td.path().join("logs").join("tagdir.log");
    let xml = format!(
        r#"<config>
  <format> %{{albumartist}}/%{{album}} (%{{max-year}}) </format>
  <mode>create</mode>
  <log_level> DEBUG </log_level>
  <log_file>{}</log_file>
  <dry_run> 1 </dry_run>
</config>"#,
        log.display()
    );
    fs::write(&cfg_path, xml).unwrap();

    let cfg = load_config_from_xml_path(&cfg_path).unwrap();
    assert_eq!(cfg.format, "%{albumartist}/%{album} (%{max-year})");
    assert_eq!(cfg.mode, RenameMode::Create);
    assert_eq!(cfg.log_level, LogLevel::Debug);
    assert_eq!(cfg.log_file.as_deref(), Some(log.as_path()));
    assert!(cfg.dry_run);
}

#[test]
fn missing_fields_keep_defaults() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(&cfg_path, "<config><format>%l</format></config>").unwrap();

    let cfg = load_config_from_xml_path(&cfg_path).unwrap();
    assert_eq!(cfg.format, "%l");
    assert_eq!(cfg.mode, RenameMode::Rename);
    assert_eq!(cfg.log_level, LogLevel::Normal);
    assert_eq!(cfg.log_file, tagdir::default_log_path());
    assert!(!cfg.dry_run);
}

#[test]
fn unknown_field_is_an_error() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(&cfg_path, "<config><fromat>%l</fromat></config>").unwrap();
    assert!(load_config_from_xml_path(&cfg_path).is_err());
}

#[test]
fn invalid_mode_is_an_error() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(&cfg_path, "<config><mode>move</mode></config>").unwrap();
    let err = load_config_from_xml_path(&cfg_path).unwrap_err();
    assert!(format!("{err:#}").contains("invalid mode"), "{err:#}");
}

#[test]
fn unreadable_file_is_an_error() {
    let td = tempdir().unwrap();
    assert!(load_config_from_xml_path(&td.path().join("missing.xml")).is_err());
}
