//! Workflow loading and the workflows directory
//!
//! `load` turns one definition into a ready-to-run workflow (validated, with
//! the finish step appended). `load_directory` scans a directory of
//! `.yaml`/`.yml` files, skipping the ones that fail to load.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use humancron_sdk::{Workflow, WorkflowStep};

use crate::parser::{self, ParseError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Parse, validate, then append the finish step and stamp the source path
pub fn load(text: &str, source_path: impl AsRef<Path>) -> Result<Workflow, ParseError> {
    let mut workflow = parser::parse(text)?;

    // Validate what the user wrote, before the synthetic step exists
    parser::validate(&workflow)?;

    workflow.steps.push(WorkflowStep::finish());
    workflow.file_path = Some(source_path.as_ref().to_path_buf());
    Ok(workflow)
}

/// Read and load a single definition file
pub fn load_file(path: &Path) -> Result<Workflow, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    load(&text, path).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Whether a path looks like a workflow definition
pub fn is_workflow_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
            .unwrap_or(false)
}

/// Outcome of scanning a workflows directory
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Successfully loaded workflows, sorted by name
    pub workflows: Vec<Workflow>,
    /// Files that were skipped and why
    pub skipped: Vec<LoadError>,
}

/// Load every definition in `dir`
///
/// A file that fails to load is logged and recorded in `skipped`; it never
/// aborts the scan. Only failing to list the directory itself is an error.
pub fn load_directory(dir: &Path) -> Result<LoadReport> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read workflows directory {}", dir.display()))?;

    let mut report = LoadReport::default();

    for entry in entries.flatten() {
        let path = entry.path();
        if !is_workflow_file(&path) {
            continue;
        }

        match load_file(&path) {
            Ok(workflow) => {
                debug!(
                    "Loaded workflow '{}' ({} steps) from {}",
                    workflow.name,
                    workflow.steps.len(),
                    path.display()
                );
                report.workflows.push(workflow);
            }
            Err(e) => {
                warn!("Skipping workflow file: {}", e);
                report.skipped.push(e);
            }
        }
    }

    report.workflows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(report)
}

/// Create the workflows directory, seeding it with samples when empty
pub fn ensure_directory(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create workflows directory {}", dir.display()))?;

    let is_empty = std::fs::read_dir(dir)?.next().is_none();
    if is_empty {
        for (file_name, contents) in SAMPLE_WORKFLOWS {
            let path = dir.join(file_name);
            std::fs::write(&path, contents)
                .with_context(|| format!("Failed to write sample {}", path.display()))?;
        }
        debug!("Seeded {} with sample workflows", dir.display());
    }

    Ok(())
}

/// File name stem for a workflow name: lowercase, dashes, `[a-z0-9-]` only
pub fn slugify(name: &str) -> String {
    let slug: String = name
        .trim()
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();

    if slug.is_empty() {
        "workflow".to_string()
    } else {
        slug
    }
}

/// Write a new definition from the template and return its path
pub fn create_workflow_file(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(format!("{}.yaml", slugify(name)));
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }

    std::fs::create_dir_all(dir)?;
    std::fs::write(&path, workflow_template(name))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Starting point for a new definition file
pub fn workflow_template(name: &str) -> String {
    format!(
        r#"# Workflow Template
# Replace the values below with your workflow details

name: "{name}"
description: "Brief description of what this workflow does"
hotkey: "cmd+1"  # Optional: keyboard shortcut for this specific workflow
steps:
  - name: "Step 1"
    description: "What to do in this step"
    link: "app://path"  # Optional: URL or app scheme to open
    duration: 300  # Optional: expected duration in seconds

  - name: "Step 2"
    description: "Next action to take"
    link: "https://example.com"
    command: "echo $HUMANCRON_STEP_NAME"  # Optional: shell command to run
    automations:  # Optional: automations to trigger
      - type: "n8n"
        webhook: "https://your-n8n-instance.com/webhook/xyz"
        parameters:
          key: "value"
"#,
        name = name.replace('"', "'")
    )
}

const SAMPLE_WORKFLOWS: [(&str, &str); 3] = [
    (
        "daily-planning.yaml",
        r#"name: "Daily Planning"
description: "Review calendar and plan the day"
hotkey: "cmd+1"
steps:
  - name: "Check Calendar"
    description: "Review today's meetings and events"
    link: "notion-calendar://"
    duration: 180

  - name: "Review Tasks"
    description: "Check Linear for today's priorities"
    link: "https://linear.app/team/inbox"
    automations:
      - type: "n8n"
        webhook: "https://n8n.example.com/webhook/daily-tasks"

  - name: "Update Status"
    description: "Post daily plan to Slack"
    link: "slack://channel?team=T123&id=C456"
"#,
    ),
    (
        "inbox-cleanse.yaml",
        r#"name: "Inbox Cleanse"
description: "Process all inboxes and messages"
hotkey: "cmd+2"
steps:
  - name: "Email Triage"
    description: "Clean email inbox, archive or respond"
    link: "https://mail.google.com"
    duration: 300

  - name: "Slack Messages"
    description: "Review and respond to Slack messages"
    link: "slack://"
    duration: 300

  - name: "GitHub PRs"
    description: "Review pull requests"
    link: "https://github.com/pulls"
    duration: 600
"#,
    ),
    (
        "weekly-review.yaml",
        r#"name: "Weekly Review"
description: "Reflect on the week and plan ahead"
hotkey: "cmd+3"
steps:
  - name: "Journal"
    description: "Write weekly reflection"
    duration: 600

  - name: "Disk Check"
    description: "See how much space is left before the weekend"
    command: "df -h ."

  - name: "Next Week Planning"
    description: "Plan upcoming week"
    link: "https://calendar.google.com"
    duration: 300
"#,
    ),
];
