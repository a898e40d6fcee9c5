//! Execution state machine for a workflow run
//!
//! There is at most one active run and at most one paused snapshot. All
//! operations are synchronous and run to completion; calling them with no
//! active run is a no-op that returns `None`.

use chrono::{DateTime, Local};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use humancron_sdk::{HistorySink, Workflow, WorkflowRun, WorkflowStep};

/// State of the run currently on screen
#[derive(Debug, Clone)]
pub struct ActiveRun {
    workflow: Arc<Workflow>,
    current_step: usize,
    completed: BTreeSet<usize>,
    opened_links: BTreeSet<usize>,
    started_at: DateTime<Local>,
}

impl ActiveRun {
    pub fn workflow(&self) -> &Arc<Workflow> {
        &self.workflow
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn current(&self) -> &WorkflowStep {
        &self.workflow.steps[self.current_step]
    }

    pub fn completed(&self) -> &BTreeSet<usize> {
        &self.completed
    }

    pub fn opened_links(&self) -> &BTreeSet<usize> {
        &self.opened_links
    }

    pub fn is_completed(&self, step: usize) -> bool {
        self.completed.contains(&step)
    }

    pub fn is_link_opened(&self, step: usize) -> bool {
        self.opened_links.contains(&step)
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    fn step_count(&self) -> usize {
        self.workflow.steps.len()
    }
}

/// A run set aside without finishing
#[derive(Debug, Clone, PartialEq)]
pub struct PausedSnapshot {
    pub workflow_id: Uuid,
    pub current_step: usize,
    pub completed: BTreeSet<usize>,
    pub opened_links: BTreeSet<usize>,
    pub started_at: DateTime<Local>,
}

/// What a transition did, for the caller to react to
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    Started { workflow_id: Uuid },
    Resumed { workflow_id: Uuid, current_step: usize },
    StepChanged { step: usize },
    StepToggled { step: usize, completed: bool },
    LinkOpened { step: usize },
    Paused { workflow_id: Uuid },
    Reset,
    Completed(WorkflowRun),
}

pub struct ExecutionState {
    active: Option<ActiveRun>,
    paused: Option<PausedSnapshot>,
    history: Box<dyn HistorySink>,
}

impl ExecutionState {
    pub fn new(history: Box<dyn HistorySink>) -> Self {
        Self {
            active: None,
            paused: None,
            history,
        }
    }

    pub fn active(&self) -> Option<&ActiveRun> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn paused(&self) -> Option<&PausedSnapshot> {
        self.paused.as_ref()
    }

    /// Whether `workflow_id` has a paused run waiting to be resumed
    pub fn is_paused(&self, workflow_id: Uuid) -> bool {
        self.paused
            .as_ref()
            .map(|p| p.workflow_id == workflow_id)
            .unwrap_or(false)
    }

    /// Start a workflow, or resume it if it is the paused one
    ///
    /// Any other paused snapshot is discarded. A workflow without steps
    /// cannot be run and is ignored.
    pub fn start(&mut self, workflow: Arc<Workflow>) -> Option<ExecutionEvent> {
        if workflow.steps.is_empty() {
            return None;
        }

        if let Some(snapshot) = self.paused.take() {
            if snapshot.workflow_id == workflow.id {
                info!(
                    "Resuming workflow '{}' at step {}",
                    workflow.name, snapshot.current_step
                );
                let current_step = snapshot.current_step.min(workflow.steps.len() - 1);
                self.active = Some(ActiveRun {
                    workflow,
                    current_step,
                    completed: snapshot.completed,
                    opened_links: snapshot.opened_links,
                    started_at: snapshot.started_at,
                });
                return Some(ExecutionEvent::Resumed {
                    workflow_id: snapshot.workflow_id,
                    current_step,
                });
            }
            debug!("Discarding paused run of workflow {}", snapshot.workflow_id);
        }

        let run = ActiveRun {
            workflow: workflow.clone(),
            current_step: 0,
            completed: BTreeSet::new(),
            opened_links: BTreeSet::new(),
            started_at: Local::now(),
        };

        self.history.run_started(&WorkflowRun {
            workflow_id: workflow.id.to_string(),
            workflow_name: workflow.name.clone(),
            started_at: run.started_at,
            completed_at: None,
            steps_completed: 0,
            total_steps: workflow.steps.len(),
        });
        info!("Started workflow '{}'", workflow.name);

        self.active = Some(run);
        Some(ExecutionEvent::Started {
            workflow_id: workflow.id,
        })
    }

    /// Toggle completion of `step` (the current step when `None`)
    ///
    /// Completing the last open step finishes the run. Completing any other
    /// step moves the pointer to the next open step after the current one,
    /// wrapping around to the start.
    pub fn toggle_completion(&mut self, step: Option<usize>) -> Option<ExecutionEvent> {
        let run = self.active.as_mut()?;
        let step = step.unwrap_or(run.current_step);
        if step >= run.step_count() {
            return None;
        }

        if run.completed.remove(&step) {
            return Some(ExecutionEvent::StepToggled {
                step,
                completed: false,
            });
        }

        run.completed.insert(step);
        if run.completed.len() == run.step_count() {
            return self.complete();
        }

        let count = run.step_count();
        let next_open = (run.current_step + 1..count)
            .chain(0..count)
            .find(|i| !run.completed.contains(i));
        if let Some(next) = next_open {
            run.current_step = next;
        }

        Some(ExecutionEvent::StepToggled {
            step,
            completed: true,
        })
    }

    /// Move forward one step; moving past the last step completes the run
    pub fn next(&mut self) -> Option<ExecutionEvent> {
        let run = self.active.as_mut()?;
        if run.current_step + 1 < run.step_count() {
            run.current_step += 1;
            Some(ExecutionEvent::StepChanged {
                step: run.current_step,
            })
        } else {
            self.complete()
        }
    }

    pub fn previous(&mut self) -> Option<ExecutionEvent> {
        let run = self.active.as_mut()?;
        if run.current_step > 0 {
            run.current_step -= 1;
            Some(ExecutionEvent::StepChanged {
                step: run.current_step,
            })
        } else {
            None
        }
    }

    /// Jump straight to `step`
    pub fn go_to(&mut self, step: usize) -> Option<ExecutionEvent> {
        let run = self.active.as_mut()?;
        if step >= run.step_count() || step == run.current_step {
            return None;
        }
        run.current_step = step;
        Some(ExecutionEvent::StepChanged { step })
    }

    pub fn mark_link_opened(&mut self, step: usize) -> Option<ExecutionEvent> {
        let run = self.active.as_mut()?;
        if step >= run.step_count() {
            return None;
        }
        run.opened_links.insert(step);
        Some(ExecutionEvent::LinkOpened { step })
    }

    /// Set the active run aside so it can be resumed by starting it again
    pub fn pause(&mut self) -> Option<ExecutionEvent> {
        let run = self.active.take()?;
        let workflow_id = run.workflow.id;
        debug!(
            "Pausing workflow '{}' at step {}",
            run.workflow.name, run.current_step
        );
        self.paused = Some(PausedSnapshot {
            workflow_id,
            current_step: run.current_step,
            completed: run.completed,
            opened_links: run.opened_links,
            started_at: run.started_at,
        });
        Some(ExecutionEvent::Paused { workflow_id })
    }

    /// Finish the active run and record it
    pub fn complete(&mut self) -> Option<ExecutionEvent> {
        let run = self.active.take()?;

        let record = WorkflowRun {
            workflow_id: run.workflow.id.to_string(),
            workflow_name: run.workflow.name.clone(),
            started_at: run.started_at,
            completed_at: Some(Local::now()),
            steps_completed: run.current_step + 1,
            total_steps: run.step_count(),
        };
        self.history.run_completed(&record);

        if self.is_paused(run.workflow.id) {
            self.paused = None;
        }

        info!(
            "Completed workflow '{}' ({}/{} steps)",
            record.workflow_name, record.steps_completed, record.total_steps
        );
        Some(ExecutionEvent::Completed(record))
    }

    /// Start the active run over without touching history
    pub fn reset(&mut self) -> Option<ExecutionEvent> {
        let run = self.active.as_mut()?;
        run.completed.clear();
        run.opened_links.clear();
        run.current_step = 0;
        Some(ExecutionEvent::Reset)
    }
}
