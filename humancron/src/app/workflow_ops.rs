//! Workflow operations: starting, stepping, links, commands and reloads

use tracing::{error, info};

use humancron_sdk::CommandExecutionState;

use crate::execution::ExecutionEvent;
use crate::loader;

use super::*;

impl App {
    /// Start (or resume) the workflow under the selector cursor
    pub fn start_selected(&mut self) {
        let Some(index) = self.visible_workflows().get(self.selected).copied() else {
            return;
        };
        let event = self.session.start(index);
        self.handle_event(event);
    }

    pub fn toggle_current_step(&mut self) {
        let event = self.session.toggle_completion(None);
        self.handle_event(event);
    }

    pub fn next_step(&mut self) {
        let event = self.session.next();
        self.handle_event(event);
    }

    pub fn previous_step(&mut self) {
        let event = self.session.previous();
        self.handle_event(event);
    }

    pub fn reset_workflow(&mut self) {
        let event = self.session.reset();
        self.handle_event(event);
    }

    pub fn pause_workflow(&mut self) {
        let event = self.session.pause();
        self.handle_event(event);
    }

    /// Enter in the execution view: open an unopened link, otherwise advance
    pub fn confirm_step(&mut self) {
        let Some(run) = self.session.execution().active() else {
            return;
        };
        let index = run.current_step();
        let has_unopened_link = run.current().link.is_some() && !run.is_link_opened(index);

        if has_unopened_link {
            self.open_current_link();
        } else {
            self.next_step();
        }
    }

    pub fn open_current_link(&mut self) {
        match self.session.open_step_link(None) {
            Ok(Some(event)) => self.handle_event(Some(event)),
            Ok(None) => {
                self.notifications.info("No link", "This step has no link to open");
            }
            Err(e) => {
                error!("Failed to open link: {:#}", e);
                self.notifications.error("Could not open link", e.to_string());
            }
        }
    }

    /// Run the current step's command in the background
    pub fn run_current_command(&mut self) {
        let Some(run) = self.session.execution().active() else {
            return;
        };
        let index = run.current_step();
        let Some(command) = run.current().command.clone() else {
            self.notifications.info("No command", "This step has no command to run");
            return;
        };

        // Commands are spawned onto the app's runtime
        let _guard = self.tokio_runtime.enter();
        match self.session.run_step_command(Some(index)) {
            Some(handle) => {
                self.pending_commands.push(handle);
                self.notifications.info("Running", command);
            }
            None => {
                self.notifications
                    .warning("Already running", "Wait for the current run to finish");
            }
        }
    }

    /// Collect finished background commands and report them
    pub fn poll_commands(&mut self) {
        let mut still_running = Vec::new();
        for handle in std::mem::take(&mut self.pending_commands) {
            if !handle.is_finished() {
                still_running.push(handle);
                continue;
            }

            match self.tokio_runtime.block_on(handle) {
                Ok(result) if result.is_success() => {
                    self.notifications.success(
                        result.display_summary(),
                        format!("{} ({})", result.command, result.duration_string()),
                    );
                }
                Ok(result) => {
                    self.notifications.error(
                        result.display_summary(),
                        format!("{} ({})", result.command, result.duration_string()),
                    );
                }
                Err(e) => {
                    error!("Command task failed: {}", e);
                    self.notifications.error("Command task failed", e.to_string());
                }
            }
        }
        self.pending_commands = still_running;
    }

    /// Command state of a step in the active run, for rendering
    pub fn command_state(&self, step: usize) -> CommandExecutionState {
        self.session.command_state(step)
    }

    /// Rescan the workflows directory
    pub fn reload_workflows(&mut self) {
        match loader::load_directory(&self.config.workflows_dir) {
            Ok(report) => {
                let count = report.workflows.len();
                self.skipped_files = report.skipped.iter().map(|e| e.to_string()).collect();
                self.session.replace_workflows(report.workflows);
                self.clamp_selection();
                info!("Reloaded {} workflows", count);
                self.notifications
                    .info("Reloaded", format!("{} workflow(s) loaded", count));
                if !self.skipped_files.is_empty() {
                    self.notifications.warning(
                        "Skipped workflow files",
                        format!("{} file(s) failed to load", self.skipped_files.len()),
                    );
                }
            }
            Err(e) => {
                error!("Failed to reload workflows: {:#}", e);
                self.notifications.error("Reload failed", format!("{:#}", e));
            }
        }
    }

    /// Route the view and surface feedback for a state machine event
    pub fn handle_event(&mut self, event: Option<ExecutionEvent>) {
        let Some(event) = event else {
            return;
        };

        match event {
            ExecutionEvent::Started { .. } => {
                self.current_view = View::Execution;
            }
            ExecutionEvent::Resumed { current_step, .. } => {
                self.current_view = View::Execution;
                self.notifications
                    .info("Resumed", format!("Picking up at step {}", current_step + 1));
            }
            ExecutionEvent::Paused { .. } => {
                self.current_view = View::Selector;
            }
            ExecutionEvent::Completed(run) => {
                self.current_view = View::Selector;
                self.notifications.success(
                    "Workflow complete",
                    format!(
                        "{}: {}/{} steps",
                        run.workflow_name, run.steps_completed, run.total_steps
                    ),
                );
            }
            ExecutionEvent::LinkOpened { .. }
            | ExecutionEvent::StepChanged { .. }
            | ExecutionEvent::StepToggled { .. }
            | ExecutionEvent::Reset => {}
        }
    }
}
