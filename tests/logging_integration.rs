use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tagdir::{ActionExecutor, ActionLog, RenameAction, StdDirectoryOps};
use tempfile::tempdir;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt as tsfmt, registry};

/// Appends everything written into a shared buffer.
#[derive(Clone)]
struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn failed_action_is_logged_with_error_code() {
    let td = tempdir().unwrap();
    let src = td.path().join("a.mp3");
    let dest = td.path().join("b.mp3");
    fs::write(&src, b"a").unwrap();
    fs::write(&dest, b"b").unwrap();

    let buf = Arc::new(Mutex::new(Vec::new()));
    let make_writer = {
        let buf = buf.clone();
        move || BufferWriter(buf.clone())
    };
    let layer = tsfmt::layer().json().with_writer(make_writer);
    let subscriber = registry().with(EnvFilter::new("warn")).with(layer);

    // Scoped so other tests keep the global default
    let dispatch = tracing::Dispatch::new(subscriber);
    let report = tracing::dispatcher::with_default(&dispatch, || {
        let mut log = ActionLog::new();
        log.push(RenameAction::rename_file(&src, &dest));
        ActionExecutor::new(&StdDirectoryOps::new()).run(log)
    });
    assert_eq!(report.failures.len(), 1);

    let contents = String::from_utf8_lossy(&buf.lock().unwrap()).to_string();
    let event: serde_json::Value = contents
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
        .find(|e| e["level"] == "WARN")
        .unwrap_or_else(|| panic!("no warning in: {contents}"));
    assert_eq!(event["fields"]["code"], 10);
    assert_eq!(event["fields"]["kind"], "already_exists");
    assert_eq!(event["fields"]["index"], 0);
    assert!(
        event["fields"]["message"]
            .as_str()
            .unwrap()
            .ends_with("b.mp3 already exists")
    );
}

#[test]
fn collisions_after_resolving_names_are_warned_with_the_action() {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let make_writer = {
        let buf = buf.clone();
        move || BufferWriter(buf.clone())
    };
    let layer = tsfmt::layer().json().with_writer(make_writer);
    let dispatch = tracing::Dispatch::new(registry().with(EnvFilter::new("warn")).with(layer));

    let dropped = tracing::dispatcher::with_default(&dispatch, || {
        let mut log = ActionLog::new();
        log.push(RenameAction::rename_directory("/m/x", "/m/%{max-year}"));
        log.push(RenameAction::rename_directory("/m/y", "/m/2001"));
        log.rewrite_paths(|p| (p == Path::new("/m/%{max-year}")).then(|| PathBuf::from("/m/2001")))
    });
    assert_eq!(dropped, 1);

    let contents = String::from_utf8_lossy(&buf.lock().unwrap()).to_string();
    let event: serde_json::Value = contents
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
        .find(|e| e["level"] == "WARN")
        .unwrap_or_else(|| panic!("no warning in: {contents}"));
    assert_eq!(event["fields"]["action"], "Rename directory: /m/y -> /m/2001");
}
