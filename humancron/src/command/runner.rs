//! Shell command runner
//!
//! Commands run through the platform shell with the host environment plus a
//! few `HUMANCRON_*` variables describing the workflow. Output is captured in
//! full; there is no timeout and no cancellation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, warn};

use humancron_sdk::{async_trait, CommandResult, CommandRunner};

pub const WORKFLOW_DIR_VAR: &str = "HUMANCRON_WORKFLOW_DIR";
pub const SCRIPTS_DIR_VAR: &str = "HUMANCRON_SCRIPTS_DIR";
pub const WORKFLOW_NAME_VAR: &str = "HUMANCRON_WORKFLOW_NAME";
pub const STEP_NAME_VAR: &str = "HUMANCRON_STEP_NAME";

#[cfg(windows)]
const DEFAULT_SHELL: (&str, &str) = ("cmd", "/C");
#[cfg(not(windows))]
const DEFAULT_SHELL: (&str, &str) = ("/bin/bash", "-c");

#[derive(Debug, Clone)]
pub struct ShellCommandRunner {
    workflows_dir: PathBuf,
    shell: PathBuf,
    shell_flag: String,
}

impl ShellCommandRunner {
    pub fn new(workflows_dir: impl Into<PathBuf>) -> Self {
        Self::with_shell(workflows_dir, DEFAULT_SHELL.0, DEFAULT_SHELL.1)
    }

    /// Use a specific shell program, invoked as `<shell> <flag> <command>`
    pub fn with_shell(
        workflows_dir: impl Into<PathBuf>,
        shell: impl Into<PathBuf>,
        flag: impl Into<String>,
    ) -> Self {
        Self {
            workflows_dir: workflows_dir.into(),
            shell: shell.into(),
            shell_flag: flag.into(),
        }
    }

    /// Variables injected into every command, `extra_env` last so it wins
    pub fn environment(
        &self,
        workflow_name: &str,
        step_name: &str,
        extra_env: &HashMap<String, String>,
    ) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert(
            WORKFLOW_DIR_VAR.to_string(),
            self.workflows_dir.display().to_string(),
        );
        env.insert(
            SCRIPTS_DIR_VAR.to_string(),
            self.workflows_dir.join("scripts").display().to_string(),
        );
        env.insert(WORKFLOW_NAME_VAR.to_string(), workflow_name.to_string());
        env.insert(STEP_NAME_VAR.to_string(), step_name.to_string());
        env.extend(extra_env.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn execute(
        &self,
        command: &str,
        workflow_name: &str,
        step_name: &str,
        extra_env: &HashMap<String, String>,
    ) -> CommandResult {
        let environment = self.environment(workflow_name, step_name, extra_env);
        debug!("Running '{}' for step '{}'", command, step_name);

        let start = Instant::now();
        let output = Command::new(&self.shell)
            .arg(&self.shell_flag)
            .arg(command)
            .envs(&environment)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;
        let duration = start.elapsed().as_secs_f64();

        match output {
            Ok(output) => {
                // No exit code means the process was killed by a signal
                let exit_code = output.status.code().unwrap_or(-1);
                debug!(
                    "Command '{}' exited with {} after {:.1}s",
                    command, exit_code, duration
                );
                CommandResult {
                    command: command.to_string(),
                    exit_code,
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    duration,
                    environment,
                }
            }
            Err(e) => {
                warn!("Failed to spawn '{}': {}", command, e);
                CommandResult {
                    command: command.to_string(),
                    exit_code: -1,
                    stdout: String::new(),
                    stderr: format!("Failed to execute command: {}", e),
                    duration,
                    environment,
                }
            }
        }
    }
}
