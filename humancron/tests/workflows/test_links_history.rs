//! Tests for link resolution and persisted run history

use super::common::*;
use humancron::history::{HistoryStore, SharedHistory};
use humancron::links::resolve_link;
use humancron::session::Session;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_resolve_link_forms() {
    assert_eq!(resolve_link("slack").as_deref(), Some("slack://"));
    assert_eq!(resolve_link("notion://").as_deref(), Some("notion://"));
    assert_eq!(
        resolve_link("https://calendar.example.com").as_deref(),
        Some("https://calendar.example.com")
    );
    assert_eq!(
        resolve_link("example.com/path").as_deref(),
        Some("https://example.com/path")
    );
    assert_eq!(resolve_link("/tmp/notes.md").as_deref(), Some("/tmp/notes.md"));
    assert_eq!(resolve_link("notadomain"), None);
    assert_eq!(resolve_link("not a domain.com"), None);
}

#[test]
fn test_history_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("history.json");

    let history = SharedHistory::new(HistoryStore::open(&path));
    let mut session = Session::new(
        vec![load(TWO_STEPS)],
        Box::new(history.clone()),
        Arc::new(GatedRunner::new(0)),
        Box::new(RecordingLinks::default()),
    );
    session.start(0);
    assert!(history.last_run("Two Steps").unwrap().completed_at.is_none());
    session.complete();

    let reopened = HistoryStore::open(&path);
    let run = reopened.last_run("Two Steps").unwrap();
    assert!(run.is_complete());
    assert_eq!(run.total_steps, 3);
    assert_eq!(run.steps_completed, 1);
    assert_eq!(reopened.runs().len(), 1);
}

#[test]
fn test_history_keeps_latest_run_per_workflow() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");

    let history = SharedHistory::new(HistoryStore::open(&path));
    let mut session = Session::new(
        vec![load(TWO_STEPS), load(DAILY_PLANNING)],
        Box::new(history.clone()),
        Arc::new(GatedRunner::new(0)),
        Box::new(RecordingLinks::default()),
    );
    for index in [0, 1, 0] {
        session.start(index);
        session.complete();
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    let runs = history.runs();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].workflow_name, "Two Steps");
    assert_eq!(runs[1].workflow_name, "Daily Planning");
}

#[test]
fn test_corrupt_history_starts_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = HistoryStore::open(&path);
    assert!(store.runs().is_empty());
    assert_eq!(store.path(), path.as_path());
}
