//! Run history persisted as JSON in the data directory

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use humancron_sdk::{HistorySink, WorkflowRun};

/// Last run per workflow, backed by `<data_dir>/history.json`
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    runs: HashMap<String, WorkflowRun>,
}

impl HistoryStore {
    /// Open the store at `path`; a missing or unreadable file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let runs = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<WorkflowRun>>(&content) {
                Ok(list) => latest_by_name(list),
                Err(e) => {
                    warn!("Ignoring unreadable history file {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        debug!("Loaded {} history records from {}", runs.len(), path.display());
        Self { path, runs }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_run(&self, workflow_name: &str) -> Option<&WorkflowRun> {
        self.runs.get(workflow_name)
    }

    /// All records, most recent first
    pub fn runs(&self) -> Vec<&WorkflowRun> {
        let mut runs: Vec<&WorkflowRun> = self.runs.values().collect();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.runs())?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write history to {}", self.path.display()))?;
        Ok(())
    }

    fn record(&mut self, run: &WorkflowRun) {
        self.runs.insert(run.workflow_name.clone(), run.clone());
        if let Err(e) = self.save() {
            warn!("Failed to save history: {:#}", e);
        }
    }
}

impl HistorySink for HistoryStore {
    fn run_started(&mut self, run: &WorkflowRun) {
        self.record(run);
    }

    fn run_completed(&mut self, run: &WorkflowRun) {
        self.record(run);
    }
}

/// Clonable handle so the front end can read what the state machine records
#[derive(Debug, Clone)]
pub struct SharedHistory(Arc<Mutex<HistoryStore>>);

impl SharedHistory {
    pub fn new(store: HistoryStore) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    pub fn last_run(&self, workflow_name: &str) -> Option<WorkflowRun> {
        self.lock().last_run(workflow_name).cloned()
    }

    pub fn runs(&self) -> Vec<WorkflowRun> {
        self.lock().runs().into_iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, HistoryStore> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HistorySink for SharedHistory {
    fn run_started(&mut self, run: &WorkflowRun) {
        self.lock().run_started(run);
    }

    fn run_completed(&mut self, run: &WorkflowRun) {
        self.lock().run_completed(run);
    }
}

fn latest_by_name(list: Vec<WorkflowRun>) -> HashMap<String, WorkflowRun> {
    let mut runs: HashMap<String, WorkflowRun> = HashMap::new();
    for run in list {
        match runs.get(&run.workflow_name) {
            Some(existing) if existing.started_at >= run.started_at => {}
            _ => {
                runs.insert(run.workflow_name.clone(), run);
            }
        }
    }
    runs
}

/// Short relative description of when a run happened ("5m ago", "Mar 3")
pub fn format_last_run(at: DateTime<Local>, now: DateTime<Local>) -> String {
    let seconds = (now - at).num_seconds();
    match seconds {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s if s < 604_800 => format!("{}d ago", s / 86_400),
        _ => at.format("%b %-d").to_string(),
    }
}

/// What a `RecordingHistory` saw
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEvent {
    Started(WorkflowRun),
    Completed(WorkflowRun),
}

/// In-memory sink; clones share the same event list
#[derive(Debug, Clone, Default)]
pub struct RecordingHistory {
    events: Arc<Mutex<Vec<HistoryEvent>>>,
}

impl RecordingHistory {
    pub fn events(&self) -> Vec<HistoryEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn push(&self, event: HistoryEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl HistorySink for RecordingHistory {
    fn run_started(&mut self, run: &WorkflowRun) {
        self.push(HistoryEvent::Started(run.clone()));
    }

    fn run_completed(&mut self, run: &WorkflowRun) {
        self.push(HistoryEvent::Completed(run.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn run(name: &str, started_at: DateTime<Local>, completed: bool) -> WorkflowRun {
        WorkflowRun {
            workflow_id: uuid::Uuid::new_v4().to_string(),
            workflow_name: name.to_string(),
            started_at,
            completed_at: completed.then(Local::now),
            steps_completed: if completed { 3 } else { 0 },
            total_steps: 3,
        }
    }

    #[test]
    fn test_shared_history_records_after_poisoned_lock() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = SharedHistory::new(HistoryStore::open(dir.path().join("history.json")));

        let handle = history.clone();
        let _ = std::thread::spawn(move || {
            let _guard = handle.0.lock().unwrap();
            panic!("poison the history lock");
        })
        .join();
        assert!(history.0.is_poisoned());

        history.run_completed(&run("Daily", Local::now(), true));
        assert!(history.last_run("Daily").unwrap().is_complete());
        assert_eq!(history.runs().len(), 1);
    }

    #[test]
    fn test_history_persists_last_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("history.json");

        let now = Local::now();
        let mut store = HistoryStore::open(&path);
        store.run_started(&run("Daily", now - Duration::hours(2), false));
        store.run_completed(&run("Daily", now - Duration::minutes(5), true));
        store.run_started(&run("Weekly", now - Duration::days(1), false));

        let reopened = HistoryStore::open(&path);
        let daily = reopened.last_run("Daily").unwrap();
        assert!(daily.is_complete());
        assert_eq!(daily.steps_completed, 3);
        assert!(!reopened.last_run("Weekly").unwrap().is_complete());

        let names: Vec<&str> = reopened.runs().iter().map(|r| r.workflow_name.as_str()).collect();
        assert_eq!(names, vec!["Daily", "Weekly"]);
    }

    #[test]
    fn test_history_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json").unwrap();

        let store = HistoryStore::open(&path);
        assert!(store.runs().is_empty());
    }

    #[test]
    fn test_latest_by_name_keeps_newest() {
        let now = Local::now();
        let runs = latest_by_name(vec![
            run("A", now - Duration::hours(1), true),
            run("A", now, false),
            run("A", now - Duration::hours(3), true),
        ]);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs["A"].started_at, now);
    }

    #[test]
    fn test_format_last_run() {
        let now = Local::now();
        assert_eq!(format_last_run(now - Duration::seconds(10), now), "just now");
        assert_eq!(format_last_run(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_last_run(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_last_run(now - Duration::days(2), now), "2d ago");

        let old = now - Duration::days(30);
        assert_eq!(format_last_run(old, now), old.format("%b %-d").to_string());
    }

    #[test]
    fn test_shared_history_reads_what_sink_records() {
        let dir = tempfile::tempdir().unwrap();
        let shared = SharedHistory::new(HistoryStore::open(dir.path().join("history.json")));
        let mut sink: Box<dyn HistorySink> = Box::new(shared.clone());

        let record = run("Daily", Local::now(), false);
        sink.run_started(&record);

        assert_eq!(shared.last_run("Daily"), Some(record));
        assert_eq!(shared.runs().len(), 1);
        assert!(shared.last_run("Weekly").is_none());
    }

    #[test]
    fn test_recording_history_shares_events() {
        let recorder = RecordingHistory::default();
        let mut sink: Box<dyn HistorySink> = Box::new(recorder.clone());
        let record = run("A", Local::now(), false);
        sink.run_started(&record);

        assert_eq!(recorder.events(), vec![HistoryEvent::Started(record)]);
    }
}
