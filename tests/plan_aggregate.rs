//! Directory names built from aggregate codes are resolved once every track
//! of the directory has been scheduled.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

use tagdir::rename::{ActionKind, ActionPlanner, Expansion, RenameAction, RenameMode, TrackFile};
use tagdir::RenameError;
use tagdir::StdDirectoryOps;

/// "<artist> (%{max-year})" with the year taken from the file stem.
fn max_year(file: &TrackFile, _: &str) -> Option<Expansion> {
    let year = file.path().file_stem()?.to_str()?.to_string();
    let artist = file.directory().file_name()?.to_str()?.split(' ').next()?.to_string();
    Some(Expansion::new(format!("{artist} (%{{max-year}})")).with_aggregate("max-year", year))
}

#[test]
fn max_year_is_substituted_after_finalize() {
    let td = tempdir().unwrap();
    let old = td.path().join("Queen old");
    let printed = RefCell::new(Vec::new());

    let ops = StdDirectoryOps::new();
    let mut planner = ActionPlanner::new(&ops, "%a (%{max-year})", RenameMode::Rename)
        .on_scheduled(|d| printed.borrow_mut().push(d.to_string()));
    for year in ["1998", "2001", "1975"] {
        planner.schedule(&TrackFile::new(old.join(format!("{year}.mp3"))), &max_year);
    }
    assert!(printed.borrow().is_empty(), "reporting waits for resolved names");

    planner.finalize();
    let target = td.path().join("Queen (2001)");
    assert_eq!(
        planner.log().actions(),
        &[RenameAction::rename_directory(&old, &target)]
    );
    drop(planner);
    assert_eq!(
        printed.into_inner(),
        vec![format!("Rename directory: {} -> {}", old.display(), target.display())]
    );
}

#[test]
fn each_directory_gets_its_own_session() {
    let td = tempdir().unwrap();
    let ops = StdDirectoryOps::new();
    let mut planner = ActionPlanner::new(&ops, "%a (%{max-year})", RenameMode::Rename);
    for (dir, year) in [("Abba x", "1974"), ("Abba x", "1976"), ("Toto y", "1982")] {
        planner.schedule(&TrackFile::new(td.path().join(dir).join(format!("{year}.mp3"))), &max_year);
    }
    planner.finalize();

    let dests: Vec<PathBuf> = planner
        .log()
        .iter()
        .filter_map(|a| a.destination().map(Path::to_path_buf))
        .collect();
    assert_eq!(dests, vec![td.path().join("Abba (1976)"), td.path().join("Toto (1982)")]);
}

#[test]
fn ambiguous_unique_value_resolves_to_blank() {
    let td = tempdir().unwrap();
    let old = td.path().join("Various");
    let meta = |file: &TrackFile, _: &str| -> Option<Expansion> {
        let artist = file.path().file_stem()?.to_str()?.to_string();
        Some(Expansion::new("Hits [%{unq-artist}]").with_aggregate("unq-artist", artist))
    };

    let ops = StdDirectoryOps::new();
    let mut planner = ActionPlanner::new(&ops, "Hits [%{unq-artist}]", RenameMode::Rename);
    planner.schedule(&TrackFile::new(old.join("Abba.mp3")), &meta);
    planner.schedule(&TrackFile::new(old.join("Toto.mp3")), &meta);
    planner.finalize();

    assert_eq!(
        planner.log().actions(),
        &[RenameAction::rename_directory(&old, td.path().join("Hits []"))]
    );
}

#[test]
fn descendant_actions_below_placeholder_are_rewritten() {
    let td = tempdir().unwrap();
    let a = td.path().join("A");
    let meta = |file: &TrackFile, _: &str| -> Option<Expansion> {
        let year = file.path().file_stem()?.to_str()?.to_string();
        Some(Expansion::new("Best of %{min-year}/CD").with_aggregate("min-year", year))
    };

    let ops = StdDirectoryOps::new();
    let mut planner = ActionPlanner::new(&ops, "Best of %{min-year}/CD", RenameMode::Create);
    planner.schedule(&TrackFile::new(a.join("1990.mp3")), &meta);
    planner.schedule(&TrackFile::new(a.join("1985.mp3")), &meta);
    planner.finalize();

    let leaf = a.join("Best of 1985").join("CD");
    assert_eq!(
        planner.log().actions(),
        &[
            RenameAction::create_directory(a.join("Best of 1985")),
            RenameAction::create_directory(&leaf),
            RenameAction::rename_file(a.join("1990.mp3"), leaf.join("1990.mp3")),
            RenameAction::rename_file(a.join("1985.mp3"), leaf.join("1985.mp3")),
        ]
    );
}

#[test]
fn ambiguous_unique_whole_name_is_reported() {
    let td = tempdir().unwrap();
    let old = td.path().join("Various");
    let meta = |file: &TrackFile, _: &str| -> Option<Expansion> {
        let artist = file.path().file_stem()?.to_str()?.to_string();
        Some(Expansion::new("%{unq-artist}").with_aggregate("unq-artist", artist))
    };

    for mode in [RenameMode::Rename, RenameMode::Create] {
        let ops = StdDirectoryOps::new();
        let mut planner = ActionPlanner::new(&ops, "%{unq-artist}", mode);
        planner.schedule(&TrackFile::new(old.join("Abba.mp3")), &meta);
        planner.schedule(&TrackFile::new(old.join("Toto.mp3")), &meta);
        planner.finalize();

        let actions = planner.log().actions();
        assert_eq!(actions.len(), 1, "{mode}: {:?}", planner.log().describe_all());
        assert_eq!(actions[0].kind(), ActionKind::ReportError);
        match &actions[0] {
            RenameAction::ReportError {
                error: RenameError::TemplateMismatch { reason, .. },
            } => assert!(reason.contains("empty directory name"), "{reason}"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
