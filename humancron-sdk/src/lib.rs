use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

// Re-export async trait for convenience
pub use async_trait::async_trait;

/// A named, ordered sequence of steps loaded from one definition file.
///
/// The `id` is random per parse and is never serialized: two loads of the
/// same file produce two different workflows as far as run history, pause
/// snapshots and command results are concerned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(skip, default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
    pub steps: Vec<WorkflowStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

impl Workflow {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        hotkey: Option<String>,
        steps: Vec<WorkflowStep>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            hotkey,
            steps,
            file_path: None,
        }
    }

    /// Sum of all declared step durations, `None` when no step has one
    pub fn total_duration(&self) -> Option<f64> {
        let durations: Vec<f64> = self.steps.iter().filter_map(|s| s.duration).collect();
        if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum())
        }
    }

    /// Number of steps the user declared (the finish step is not counted)
    pub fn declared_step_count(&self) -> usize {
        self.steps.iter().filter(|s| !s.is_finish_step).count()
    }
}

/// One unit of a workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    #[serde(skip, default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Expected duration in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automations: Option<Vec<WorkflowAutomation>>,
    #[serde(default)]
    pub is_finish_step: bool,
}

impl WorkflowStep {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            link: None,
            command: None,
            duration: None,
            automations: None,
            is_finish_step: false,
        }
    }

    /// The synthetic step appended to every loaded workflow
    pub fn finish() -> Self {
        Self {
            is_finish_step: true,
            ..Self::new("Finish Workflow", "All tasks completed")
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }
}

/// Declarative pointer to an external webhook-style integration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowAutomation {
    #[serde(rename = "type")]
    pub automation_type: AutomationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutomationType {
    N8n,
    Zapier,
    Webhook,
}

impl AutomationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutomationType::N8n => "n8n",
            AutomationType::Zapier => "zapier",
            AutomationType::Webhook => "webhook",
        }
    }
}

impl fmt::Display for AutomationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutomationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "n8n" => Ok(AutomationType::N8n),
            "zapier" => Ok(AutomationType::Zapier),
            "webhook" => Ok(AutomationType::Webhook),
            other => Err(format!("unknown automation type '{}'", other)),
        }
    }
}

/// Captured outcome of running a step's shell command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Wall-clock seconds from spawn to exit
    pub duration: f64,
    #[serde(default)]
    pub environment: HashMap<String, String>,
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn display_summary(&self) -> String {
        if self.is_success() {
            "Command executed successfully".to_string()
        } else {
            format!("Command failed with exit code {}", self.exit_code)
        }
    }

    pub fn duration_string(&self) -> String {
        format!("{:.1}s", self.duration)
    }

    /// stdout followed by stderr, for display
    pub fn combined_output(&self) -> String {
        let mut output = String::new();

        if !self.stdout.is_empty() {
            output.push_str(&self.stdout);
        }

        if !self.stderr.is_empty() {
            if !output.is_empty() {
                output.push_str("\n\n--- Error Output ---\n");
            }
            output.push_str(&self.stderr);
        }

        if output.is_empty() {
            "No output".to_string()
        } else {
            output
        }
    }
}

/// Execution status of one step's command
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CommandExecutionState {
    #[default]
    Ready,
    Running,
    Success(CommandResult),
    Failure(CommandResult),
}

impl CommandExecutionState {
    /// Build the terminal state matching a finished result
    pub fn from_result(result: CommandResult) -> Self {
        if result.is_success() {
            CommandExecutionState::Success(result)
        } else {
            CommandExecutionState::Failure(result)
        }
    }

    pub fn result(&self) -> Option<&CommandResult> {
        match self {
            CommandExecutionState::Success(r) | CommandExecutionState::Failure(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, CommandExecutionState::Running)
    }

    pub fn label(&self) -> &'static str {
        match self {
            CommandExecutionState::Ready => "ready",
            CommandExecutionState::Running => "running",
            CommandExecutionState::Success(_) => "success",
            CommandExecutionState::Failure(_) => "failure",
        }
    }
}

/// History record for one run of a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub workflow_id: String,
    pub workflow_name: String,
    pub started_at: chrono::DateTime<chrono::Local>,
    pub completed_at: Option<chrono::DateTime<chrono::Local>>,
    pub steps_completed: usize,
    pub total_steps: usize,
}

impl WorkflowRun {
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Result type for collaborator operations
pub type WorkflowResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Receives run started/completed records from the execution state machine
pub trait HistorySink: Send {
    fn run_started(&mut self, run: &WorkflowRun);
    fn run_completed(&mut self, run: &WorkflowRun);
}

/// Opens a step link (URL or app shortcut token)
pub trait LinkOpener: Send + Sync {
    fn open_link(&self, link: &str) -> WorkflowResult<()>;
}

/// Runs a step's shell command out of process
///
/// Implementations never fail: a command that cannot be spawned is reported
/// as a `CommandResult` with `exit_code == -1` and a message on stderr.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn execute(
        &self,
        command: &str,
        workflow_name: &str,
        step_name: &str,
        extra_env: &HashMap<String, String>,
    ) -> CommandResult;
}

// ============================================================================
// Console Logging Macros (for CLI subcommands)
// ============================================================================

/// Logs an informational message.
///
/// # Example
/// ```
/// use humancron_sdk::log_info;
/// log_info!("Loading workflows from ~/.humancron/workflows");
/// ```
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        println!("\x1b[36mℹ {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[36mℹ {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs a warning message.
///
/// # Example
/// ```
/// use humancron_sdk::log_warning;
/// log_warning!("Skipped broken.yaml");
/// ```
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs the number of items found.
///
/// # Example
/// ```
/// use humancron_sdk::log_found;
/// log_found!(3, "workflows");
/// ```
///
/// Outputs:
/// ```text
/// Found 3 workflows
/// ```
#[macro_export]
macro_rules! log_found {
    ($count:expr, $item_type:expr) => {
        println!("\x1b[36mFound {} {}\x1b[0m", $count, $item_type);
    };
}

/// Logs that a file has been saved.
///
/// # Example
/// ```
/// use humancron_sdk::log_file_saved;
/// log_file_saved!("./morning-routine.yaml");
/// ```
#[macro_export]
macro_rules! log_file_saved {
    ($path:expr) => {
        println!("\x1b[32m✓ Saved: {}\x1b[0m", $path);
    };
}
