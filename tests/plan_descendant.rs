//! New levels below a track's directory: one CreateDirectory per level, then
//! the track itself is moved into the leaf.

use std::path::PathBuf;
use tempfile::tempdir;

use tagdir::rename::{ActionPlanner, Expansion, RenameAction, RenameMode, TrackFile};
use tagdir::StdDirectoryOps;

#[test]
fn live_subtree_creates_each_level_then_moves_the_file() {
    let td = tempdir().unwrap();
    let music = td.path().join("music");
    let file = TrackFile::new(music.join("A").join("01 Intro.mp3"));
    let meta = |_: &TrackFile, _: &str| Some(Expansion::new("A/Live/1999"));

    let ops = StdDirectoryOps::new();
    let mut planner = ActionPlanner::new(&ops, "%a/Live/%y", RenameMode::Rename);
    assert!(planner.schedule(&file, &meta));
    planner.finalize();

    let a: PathBuf = music.join("A");
    assert_eq!(
        planner.log().actions(),
        &[
            RenameAction::create_directory(a.join("Live")),
            RenameAction::create_directory(a.join("Live").join("1999")),
            RenameAction::rename_file(
                a.join("01 Intro.mp3"),
                a.join("Live").join("1999").join("01 Intro.mp3")
            ),
        ]
    );
}

#[test]
fn create_mode_places_format_below_the_directory() {
    let td = tempdir().unwrap();
    let a = td.path().join("A");
    let meta = |_: &TrackFile, _: &str| Some(Expansion::new("Live/1999"));

    let ops = StdDirectoryOps::new();
    let mut planner = ActionPlanner::new(&ops, "Live/%y", RenameMode::Create);
    planner.schedule(&TrackFile::new(a.join("01.mp3")), &meta);
    planner.schedule(&TrackFile::new(a.join("02.mp3")), &meta);

    let log = planner.log();
    // Directory creation is shared; each file gets its own move.
    assert_eq!(log.len(), 4);
    assert_eq!(log.actions()[0], RenameAction::create_directory(a.join("Live")));
    assert_eq!(log.actions()[1], RenameAction::create_directory(a.join("Live/1999")));
    assert_eq!(
        log.actions()[3],
        RenameAction::rename_file(a.join("02.mp3"), a.join("Live/1999/02.mp3"))
    );
}

#[test]
fn too_many_new_levels_is_reported_not_truncated() {
    let td = tempdir().unwrap();
    let a = td.path().join("A");
    let meta = |_: &TrackFile, _: &str| Some(Expansion::new("1/2/3/4/5/6"));

    let ops = StdDirectoryOps::new();
    let mut planner = ActionPlanner::new(&ops, "%a", RenameMode::Create);
    planner.schedule(&TrackFile::new(a.join("01.mp3")), &meta);

    let log = planner.log();
    assert_eq!(log.len(), 1);
    let text = log.describe_all()[0].to_string();
    assert!(text.starts_with("Error: New directory name is too different"), "{text}");
}

#[test]
fn file_without_metadata_is_skipped() {
    let td = tempdir().unwrap();
    let meta = |_: &TrackFile, _: &str| -> Option<Expansion> { None };

    let ops = StdDirectoryOps::new();
    let mut planner = ActionPlanner::new(&ops, "%a", RenameMode::Rename);
    assert!(planner.schedule(&TrackFile::new(td.path().join("A/01.mp3")), &meta));
    assert!(planner.log().is_empty());
}
