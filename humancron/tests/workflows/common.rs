//! Common test utilities for humancron integration tests

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use humancron::history::RecordingHistory;
use humancron::session::Session;
use humancron_sdk::{async_trait, CommandResult, CommandRunner, LinkOpener, Workflow, WorkflowResult};

pub const DAILY_PLANNING: &str = r#"name: "Daily Planning"
description: "Review calendar and plan the day"
hotkey: "cmd+1"                      # optional
steps:
  - name: "Check Calendar"
    description: "Review today's meetings"
    link: "https://calendar.example.com"   # optional
    duration: 180                          # optional, seconds
    command: "echo hi"                     # optional
    automations:                           # optional
      - type: "n8n"
        webhook: "https://n8n.example.com/webhook/x"
        parameters:
          key: "value"
"#;

pub const TWO_STEPS: &str = r#"name: "Two Steps"
description: "A short routine"
steps:
  - name: "First"
    description: "Do the first thing"
    command: "true"
  - name: "Second"
    description: "Do the second thing"
    link: "https://example.com"
"#;

/// Write `contents` to `dir/file_name` and return the path
pub fn write_workflow(dir: &Path, file_name: &str, contents: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn load(contents: &str) -> Workflow {
    humancron::loader::load(contents, "test.yaml").unwrap()
}

/// Link opener that records what it was asked to open
#[derive(Clone, Default)]
pub struct RecordingLinks {
    pub opened: Arc<Mutex<Vec<String>>>,
}

impl LinkOpener for RecordingLinks {
    fn open_link(&self, link: &str) -> WorkflowResult<()> {
        self.opened.lock().unwrap().push(link.to_string());
        Ok(())
    }
}

/// Runner that returns a fixed exit code once released
pub struct GatedRunner {
    pub exit_code: i32,
    pub gate: Arc<Notify>,
    pub calls: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl GatedRunner {
    pub fn new(exit_code: i32) -> Self {
        Self {
            exit_code,
            gate: Arc::new(Notify::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl CommandRunner for GatedRunner {
    async fn execute(
        &self,
        command: &str,
        workflow_name: &str,
        step_name: &str,
        _extra_env: &HashMap<String, String>,
    ) -> CommandResult {
        self.calls.lock().unwrap().push((
            command.to_string(),
            workflow_name.to_string(),
            step_name.to_string(),
        ));
        self.gate.notified().await;
        CommandResult {
            command: command.to_string(),
            exit_code: self.exit_code,
            stdout: "gated".to_string(),
            stderr: String::new(),
            duration: 0.0,
            environment: HashMap::new(),
        }
    }
}

/// Session over `workflows` with in-memory history and recording links
pub fn session(
    workflows: Vec<Workflow>,
    runner: Arc<dyn CommandRunner>,
) -> (Session, RecordingHistory, RecordingLinks) {
    let history = RecordingHistory::default();
    let links = RecordingLinks::default();
    let session = Session::new(
        workflows,
        Box::new(history.clone()),
        runner,
        Box::new(links.clone()),
    );
    (session, history, links)
}
