//! The session owns everything a front end needs to run workflows
//!
//! It wraps the execution state machine with the side effects the state
//! machine itself stays free of: opening links, running commands on tokio
//! tasks and keeping the command result store in step with the run.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::{Arc, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use humancron_sdk::{
    CommandExecutionState, CommandResult, CommandRunner, HistorySink, LinkOpener, Workflow,
};

use crate::command::{CommandResultStore, SharedCommandStore};
use crate::execution::{ExecutionEvent, ExecutionState};

pub struct Session {
    workflows: Vec<Arc<Workflow>>,
    execution: ExecutionState,
    store: SharedCommandStore,
    runner: Arc<dyn CommandRunner>,
    links: Box<dyn LinkOpener>,
}

impl Session {
    pub fn new(
        workflows: Vec<Workflow>,
        history: Box<dyn HistorySink>,
        runner: Arc<dyn CommandRunner>,
        links: Box<dyn LinkOpener>,
    ) -> Self {
        Self {
            workflows: workflows.into_iter().map(Arc::new).collect(),
            execution: ExecutionState::new(history),
            store: CommandResultStore::shared(),
            runner,
            links,
        }
    }

    pub fn workflows(&self) -> &[Arc<Workflow>] {
        &self.workflows
    }

    /// Swap in a freshly loaded set of workflows
    ///
    /// The active run keeps its own workflow. Results for workflows that are
    /// no longer loaded are dropped.
    pub fn replace_workflows(&mut self, workflows: Vec<Workflow>) {
        let active_id = self.active_workflow().map(|w| w.id);
        {
            let mut store = lock(&self.store);
            for old in &self.workflows {
                if Some(old.id) != active_id {
                    store.clear_workflow(old.id);
                }
            }
        }
        self.workflows = workflows.into_iter().map(Arc::new).collect();
    }

    pub fn execution(&self) -> &ExecutionState {
        &self.execution
    }

    pub fn store(&self) -> SharedCommandStore {
        self.store.clone()
    }

    pub fn active_workflow(&self) -> Option<&Arc<Workflow>> {
        self.execution.active().map(|run| run.workflow())
    }

    /// Start or resume the workflow at `index` in the loaded list
    pub fn start(&mut self, index: usize) -> Option<ExecutionEvent> {
        let workflow = self.workflows.get(index)?.clone();
        self.start_workflow(workflow)
    }

    pub fn start_workflow(&mut self, workflow: Arc<Workflow>) -> Option<ExecutionEvent> {
        let event = self.execution.start(workflow);
        if let Some(ExecutionEvent::Started { workflow_id }) = &event {
            lock(&self.store).clear_workflow(*workflow_id);
        }
        event
    }

    pub fn toggle_completion(&mut self, step: Option<usize>) -> Option<ExecutionEvent> {
        let workflow_id = self.active_workflow().map(|w| w.id);
        let event = self.execution.toggle_completion(step);
        self.forget_if_completed(&event, workflow_id);
        event
    }

    pub fn next(&mut self) -> Option<ExecutionEvent> {
        let workflow_id = self.active_workflow().map(|w| w.id);
        let event = self.execution.next();
        self.forget_if_completed(&event, workflow_id);
        event
    }

    pub fn previous(&mut self) -> Option<ExecutionEvent> {
        self.execution.previous()
    }

    pub fn go_to(&mut self, step: usize) -> Option<ExecutionEvent> {
        self.execution.go_to(step)
    }

    pub fn pause(&mut self) -> Option<ExecutionEvent> {
        self.execution.pause()
    }

    pub fn complete(&mut self) -> Option<ExecutionEvent> {
        let workflow_id = self.active_workflow().map(|w| w.id);
        let event = self.execution.complete();
        self.forget_if_completed(&event, workflow_id);
        event
    }

    /// Start the active run over, forgetting its command results
    pub fn reset(&mut self) -> Option<ExecutionEvent> {
        let workflow_id = self.active_workflow().map(|w| w.id)?;
        let event = self.execution.reset();
        lock(&self.store).clear_workflow(workflow_id);
        event
    }

    /// Open the link of `step` (the current step when `None`) and mark it opened
    pub fn open_step_link(&mut self, step: Option<usize>) -> Result<Option<ExecutionEvent>> {
        let Some(run) = self.execution.active() else {
            return Ok(None);
        };
        let index = step.unwrap_or(run.current_step());
        let Some(link) = run.workflow().steps.get(index).and_then(|s| s.link.clone()) else {
            return Ok(None);
        };

        self.links
            .open_link(&link)
            .map_err(|e| anyhow!("{}", e))?;
        info!("Opened link for step {}: {}", index, link);
        Ok(self.execution.mark_link_opened(index))
    }

    /// Run the command of `step` (the current step when `None`) in the background
    ///
    /// The step is marked `Running` before this returns. Returns `None` when
    /// there is nothing to run or the step's command is already running. A
    /// result that lands after the run was reset, restarted or completed is
    /// not stored. Must be called from within a tokio runtime.
    pub fn run_step_command(&self, step: Option<usize>) -> Option<JoinHandle<CommandResult>> {
        let run = self.execution.active()?;
        let index = step.unwrap_or(run.current_step());
        let workflow = run.workflow().clone();
        let step = workflow.steps.get(index)?;
        let command = step.command.clone()?;

        let Some(generation) = lock(&self.store).begin(workflow.id, step.id) else {
            debug!("Command for step '{}' is already running", step.name);
            return None;
        };

        let store = self.store.clone();
        let runner = self.runner.clone();
        let step_id = step.id;
        let step_name = step.name.clone();

        Some(tokio::spawn(async move {
            let result = runner
                .execute(&command, &workflow.name, &step_name, &HashMap::new())
                .await;
            let stored = lock(&store).finish(workflow.id, step_id, generation, result.clone());
            if !stored {
                debug!("Dropped stale result of '{}'", step_name);
            }
            result
        }))
    }

    /// Command state of `step` in the active run
    pub fn command_state(&self, step: usize) -> CommandExecutionState {
        self.execution
            .active()
            .and_then(|run| run.workflow().steps.get(step).map(|s| (run.workflow().id, s.id)))
            .map(|(workflow_id, step_id)| lock(&self.store).get_state(workflow_id, step_id))
            .unwrap_or_default()
    }

    fn forget_if_completed(&self, event: &Option<ExecutionEvent>, workflow_id: Option<Uuid>) {
        if let (Some(ExecutionEvent::Completed(_)), Some(id)) = (event, workflow_id) {
            lock(&self.store).clear_workflow(id);
        }
    }
}

fn lock(store: &SharedCommandStore) -> MutexGuard<'_, CommandResultStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}
