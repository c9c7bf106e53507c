use clap::Parser;
use std::path::{Path, PathBuf};

use tagdir::cli::{Args, MANIFEST_FILE_NAME};
use tagdir::{Config, LogLevel, RenameMode};

#[test]
fn parses_root_and_flags() {
    let args = Args::try_parse_from([
        "tagdir",
        "/music",
        "--format",
        "%{artist}/%{album}",
        "--mode",
        "create",
        "--dry-run",
        "--json",
    ])
    .unwrap();
    assert_eq!(args.root.as_deref(), Some(Path::new("/music")));
    assert_eq!(args.format.as_deref(), Some("%{artist}/%{album}"));
    assert_eq!(args.mode, Some(RenameMode::Create));
    assert!(args.dry_run);
    assert!(args.json);
    assert!(!args.print_config);
}

#[test]
fn invalid_mode_is_rejected() {
    assert!(Args::try_parse_from(["tagdir", "--mode", "move"]).is_err());
}

#[test]
fn debug_flag_wins_over_log_level() {
    let args = Args::try_parse_from(["tagdir", "-d", "--log-level", "quiet"]).unwrap();
    assert_eq!(args.effective_log_level(), Some(LogLevel::Debug));

    let args = Args::try_parse_from(["tagdir", "--log-level", "quiet"]).unwrap();
    assert_eq!(args.effective_log_level(), Some(LogLevel::Quiet));

    let args = Args::try_parse_from(["tagdir", "--log-level", "loud"]).unwrap();
    assert_eq!(args.effective_log_level(), None, "unknown levels keep the config value");
}

#[test]
fn manifest_defaults_to_root_file() {
    let args = Args::try_parse_from(["tagdir"]).unwrap();
    assert_eq!(args.manifest_path(Path::new("/music")), Path::new("/music").join(MANIFEST_FILE_NAME));

    let args = Args::try_parse_from(["tagdir", "-m", "/tmp/tags.xml"]).unwrap();
    assert_eq!(args.manifest_path(Path::new("/music")), PathBuf::from("/tmp/tags.xml"));
}

#[test]
fn overrides_only_touch_given_flags() {
    let mut cfg = Config::new("/from/config", "%a");
    cfg.log_level = LogLevel::Info;

    let args = Args::try_parse_from(["tagdir"]).unwrap();
    args.apply_overrides(&mut cfg);
    assert_eq!(cfg.root, PathBuf::from("/from/config"));
    assert_eq!(cfg.format, "%a");
    assert_eq!(cfg.mode, RenameMode::Rename);
    assert_eq!(cfg.log_level, LogLevel::Info);
    assert!(!cfg.dry_run);

    let args = Args::try_parse_from(["tagdir", "/cli", "-f", "%l", "--mode", "create", "--dry-run", "--debug"]).unwrap();
    args.apply_overrides(&mut cfg);
    assert_eq!(cfg.root, PathBuf::from("/cli"));
    assert_eq!(cfg.format, "%l");
    assert_eq!(cfg.mode, RenameMode::Create);
    assert_eq!(cfg.log_level, LogLevel::Debug);
    assert!(cfg.dry_run);
}
