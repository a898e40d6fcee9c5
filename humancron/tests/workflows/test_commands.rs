//! Tests for step commands and the command result store

use super::common::*;
use humancron::command::ShellCommandRunner;
use humancron_sdk::{CommandExecutionState, CommandRunner};
use std::sync::Arc;
use tempfile::TempDir;

fn shell_runner(dir: &TempDir) -> Arc<dyn CommandRunner> {
    Arc::new(ShellCommandRunner::with_shell(dir.path(), "/bin/sh", "-c"))
}

#[cfg(unix)]
#[tokio::test]
async fn test_successful_command_stored_as_success() {
    let dir = TempDir::new().unwrap();
    let (mut session, _history, _links) = session(vec![load(TWO_STEPS)], shell_runner(&dir));

    session.start(0);
    let result = session.run_step_command(None).unwrap().await.unwrap();

    assert_eq!(result.command, "true");
    assert_eq!(result.exit_code, 0);
    assert!(matches!(session.command_state(0), CommandExecutionState::Success(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_command_stored_as_failure() {
    let dir = TempDir::new().unwrap();
    let workflow = load(&TWO_STEPS.replace("command: \"true\"", "command: \"echo oops >&2; exit 3\""));
    let (mut session, _history, _links) = session(vec![workflow], shell_runner(&dir));

    session.start(0);
    let result = session.run_step_command(Some(0)).unwrap().await.unwrap();

    assert_eq!(result.exit_code, 3);
    assert_eq!(result.stderr.trim(), "oops");
    assert_eq!(result.display_summary(), "Command failed with exit code 3");
    let CommandExecutionState::Failure(stored) = session.command_state(0) else {
        panic!("expected failure state");
    };
    assert_eq!(stored, result);
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_sees_workflow_environment() {
    let dir = TempDir::new().unwrap();
    let workflow = load(&TWO_STEPS.replace(
        "command: \"true\"",
        "command: \"echo $HUMANCRON_WORKFLOW_NAME/$HUMANCRON_STEP_NAME\"",
    ));
    let (mut session, _history, _links) = session(vec![workflow], shell_runner(&dir));

    session.start(0);
    let result = session.run_step_command(None).unwrap().await.unwrap();

    assert_eq!(result.stdout.trim(), "Two Steps/First");
    assert_eq!(
        result.environment.get("HUMANCRON_STEP_NAME").map(String::as_str),
        Some("First")
    );
}

#[tokio::test]
async fn test_unspawnable_shell_reports_failure() {
    let dir = TempDir::new().unwrap();
    let runner = Arc::new(ShellCommandRunner::with_shell(
        dir.path(),
        "/nonexistent/shell",
        "-c",
    ));
    let (mut session, _history, _links) = session(vec![load(TWO_STEPS)], runner);

    session.start(0);
    let result = session.run_step_command(None).unwrap().await.unwrap();

    assert_eq!(result.exit_code, -1);
    assert!(result.stderr.starts_with("Failed to execute command:"));
    assert!(matches!(session.command_state(0), CommandExecutionState::Failure(_)));
}

#[tokio::test]
async fn test_running_command_is_not_started_twice() {
    let runner = Arc::new(GatedRunner::new(0));
    let (mut session, _history, _links) = session(vec![load(TWO_STEPS)], runner.clone());

    session.start(0);
    let handle = session.run_step_command(None).unwrap();
    assert!(session.command_state(0).is_running());
    assert!(session.run_step_command(None).is_none());

    runner.gate.notify_one();
    let result = handle.await.unwrap();

    assert!(result.is_success());
    assert_eq!(runner.calls.lock().unwrap().len(), 1);
    assert_eq!(
        runner.calls.lock().unwrap()[0],
        ("true".to_string(), "Two Steps".to_string(), "First".to_string())
    );
    assert!(matches!(session.command_state(0), CommandExecutionState::Success(_)));
}

#[tokio::test]
async fn test_steps_without_command_do_nothing() {
    let (mut session, _history, _links) =
        session(vec![load(TWO_STEPS)], Arc::new(GatedRunner::new(0)));

    session.start(0);
    assert!(session.run_step_command(Some(1)).is_none());
    assert_eq!(session.command_state(1), CommandExecutionState::Ready);
}

#[tokio::test]
async fn test_results_cleared_per_workflow() {
    let runner = Arc::new(GatedRunner::new(1));
    runner.gate.notify_one();
    let (mut session, _history, _links) =
        session(vec![load(TWO_STEPS), load(TWO_STEPS)], runner.clone());
    let (first, second) = (session.workflows()[0].clone(), session.workflows()[1].clone());

    session.start(0);
    session.run_step_command(None).unwrap().await.unwrap();
    session.pause();

    runner.gate.notify_one();
    session.start(1);
    session.run_step_command(None).unwrap().await.unwrap();

    let store = session.store();
    assert_eq!(store.lock().unwrap().len(), 2);

    store.lock().unwrap().clear_workflow(first.id);
    let store = store.lock().unwrap();
    assert!(store.get_result(first.id, first.steps[0].id).is_none());
    assert_eq!(
        store.get_result(second.id, second.steps[0].id).map(|r| r.exit_code),
        Some(1)
    );
}

#[tokio::test]
async fn test_reset_forgets_command_results() {
    let runner = Arc::new(GatedRunner::new(0));
    runner.gate.notify_one();
    let (mut session, _history, _links) = session(vec![load(TWO_STEPS)], runner);

    session.start(0);
    session.run_step_command(None).unwrap().await.unwrap();
    assert!(matches!(session.command_state(0), CommandExecutionState::Success(_)));

    session.reset();
    assert_eq!(session.command_state(0), CommandExecutionState::Ready);
    assert!(session.store().lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reset_while_command_running() {
    let runner = Arc::new(GatedRunner::new(0));
    let (mut session, _history, _links) = session(vec![load(TWO_STEPS)], runner.clone());

    session.start(0);
    let handle = session.run_step_command(None).unwrap();
    session.reset();

    // Still in flight: shown as running and not started again
    assert!(session.command_state(0).is_running());
    assert!(session.run_step_command(None).is_none());

    runner.gate.notify_one();
    let result = handle.await.unwrap();
    assert!(result.is_success());
    assert_eq!(runner.calls.lock().unwrap().len(), 1);

    // The result belongs to the run before the reset
    assert_eq!(session.command_state(0), CommandExecutionState::Ready);
    assert!(session.store().lock().unwrap().is_empty());

    runner.gate.notify_one();
    session.run_step_command(None).unwrap().await.unwrap();
    assert!(matches!(session.command_state(0), CommandExecutionState::Success(_)));
}

#[tokio::test]
async fn test_complete_then_restart_while_command_running() {
    let runner = Arc::new(GatedRunner::new(0));
    let (mut session, _history, _links) = session(vec![load(TWO_STEPS)], runner.clone());

    session.start(0);
    let handle = session.run_step_command(None).unwrap();
    assert!(session.complete().is_some());
    assert!(session.start(0).is_some());

    assert!(session.command_state(0).is_running());
    assert!(session.run_step_command(None).is_none());

    runner.gate.notify_one();
    handle.await.unwrap();

    assert_eq!(runner.calls.lock().unwrap().len(), 1);
    assert_eq!(session.command_state(0), CommandExecutionState::Ready);
}

#[tokio::test]
async fn test_restart_after_pause_while_command_running() {
    let runner = Arc::new(GatedRunner::new(0));
    let (mut session, _history, _links) = session(
        vec![load(TWO_STEPS), load(DAILY_PLANNING)],
        runner.clone(),
    );

    session.start(0);
    let handle = session.run_step_command(None).unwrap();
    session.pause();
    // Starting another workflow discards the paused run
    session.start(1);
    session.complete();
    assert!(matches!(
        session.start(0),
        Some(humancron::execution::ExecutionEvent::Started { .. })
    ));

    runner.gate.notify_one();
    handle.await.unwrap();
    assert_eq!(session.command_state(0), CommandExecutionState::Ready);
}
