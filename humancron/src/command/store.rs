//! Cache of command execution state keyed by workflow and step

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use humancron_sdk::{CommandExecutionState, CommandResult};

pub type SharedCommandStore = Arc<Mutex<CommandResultStore>>;

type Key = (Uuid, Uuid);

/// One entry per `(workflow id, step id)`, overwritten on re-execution
///
/// Clearing a workflow bumps its generation. An execution that started
/// before the clear stays visible as `Running` until it finishes, and its
/// result is then discarded instead of stored.
#[derive(Debug, Default)]
pub struct CommandResultStore {
    states: HashMap<Key, CommandExecutionState>,
    in_flight: HashMap<Key, u64>,
    generations: HashMap<Uuid, u64>,
}

impl CommandResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedCommandStore {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Mark a step `Running` and return the generation it started in
    ///
    /// Returns `None` when the step already has an execution in flight.
    pub fn begin(&mut self, workflow_id: Uuid, step_id: Uuid) -> Option<u64> {
        let key = (workflow_id, step_id);
        if self.in_flight.contains_key(&key) {
            return None;
        }
        let generation = self.generation(workflow_id);
        self.in_flight.insert(key, generation);
        self.states.insert(key, CommandExecutionState::Running);
        Some(generation)
    }

    /// Record the outcome of an execution started with `begin`
    ///
    /// Returns `false` when the workflow was cleared in the meantime; the
    /// result is dropped and the step reads `Ready` again.
    pub fn finish(
        &mut self,
        workflow_id: Uuid,
        step_id: Uuid,
        generation: u64,
        result: CommandResult,
    ) -> bool {
        let key = (workflow_id, step_id);
        self.in_flight.remove(&key);
        if generation == self.generation(workflow_id) {
            self.set_result(workflow_id, step_id, result);
            true
        } else {
            self.states.remove(&key);
            false
        }
    }

    fn generation(&self, workflow_id: Uuid) -> u64 {
        self.generations.get(&workflow_id).copied().unwrap_or(0)
    }

    pub fn set_state(&mut self, workflow_id: Uuid, step_id: Uuid, state: CommandExecutionState) {
        self.states.insert((workflow_id, step_id), state);
    }

    /// Store a finished result as `Success` or `Failure` by its exit code
    pub fn set_result(&mut self, workflow_id: Uuid, step_id: Uuid, result: CommandResult) {
        self.set_state(
            workflow_id,
            step_id,
            CommandExecutionState::from_result(result),
        );
    }

    pub fn get_state(&self, workflow_id: Uuid, step_id: Uuid) -> CommandExecutionState {
        self.states
            .get(&(workflow_id, step_id))
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_result(&self, workflow_id: Uuid, step_id: Uuid) -> Option<CommandResult> {
        self.states
            .get(&(workflow_id, step_id))
            .and_then(|state| state.result())
            .cloned()
    }

    pub fn is_running(&self, workflow_id: Uuid, step_id: Uuid) -> bool {
        self.in_flight.contains_key(&(workflow_id, step_id))
            || self
                .states
                .get(&(workflow_id, step_id))
                .map(|state| state.is_running())
                .unwrap_or(false)
    }

    /// Forget a workflow's results; in-flight executions stay `Running`
    pub fn clear_workflow(&mut self, workflow_id: Uuid) {
        *self.generations.entry(workflow_id).or_default() += 1;
        let in_flight = &self.in_flight;
        self.states
            .retain(|key, _| key.0 != workflow_id || in_flight.contains_key(key));
    }

    pub fn clear_all(&mut self) {
        let workflows: Vec<Uuid> = self.states.keys().map(|(wf, _)| *wf).collect();
        for workflow_id in workflows {
            self.clear_workflow(workflow_id);
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
