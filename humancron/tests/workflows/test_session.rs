//! Tests for running workflows through a session

use super::common::*;
use humancron::execution::ExecutionEvent;
use humancron::history::HistoryEvent;
use std::sync::Arc;

#[test]
fn test_completing_every_step_finishes_the_run() {
    let workflow = load(TWO_STEPS);
    let (mut session, history, _links) = session(vec![workflow], Arc::new(GatedRunner::new(0)));

    assert!(matches!(session.start(0), Some(ExecutionEvent::Started { .. })));
    session.toggle_completion(None);
    session.toggle_completion(None);
    let event = session.toggle_completion(None);

    let Some(ExecutionEvent::Completed(run)) = event else {
        panic!("expected completion, got {:?}", event);
    };
    assert_eq!(run.workflow_name, "Two Steps");
    assert_eq!(run.steps_completed, 3);
    assert_eq!(run.total_steps, 3);
    assert!(run.is_complete());
    assert!(!session.execution().is_active());

    let events = history.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], HistoryEvent::Started(_)));
    assert_eq!(events[1], HistoryEvent::Completed(run));
}

#[test]
fn test_single_step_workflow_completes_after_two_toggles() {
    let (mut session, _history, _links) =
        session(vec![load(DAILY_PLANNING)], Arc::new(GatedRunner::new(0)));

    session.start(0);
    assert_eq!(
        session.toggle_completion(None),
        Some(ExecutionEvent::StepToggled {
            step: 0,
            completed: true
        })
    );
    let Some(ExecutionEvent::Completed(run)) = session.toggle_completion(None) else {
        panic!("expected completion");
    };
    assert_eq!((run.steps_completed, run.total_steps), (2, 2));
    assert!(session.active_workflow().is_none());
}

#[test]
fn test_next_past_finish_step_completes() {
    let (mut session, history, _links) =
        session(vec![load(DAILY_PLANNING)], Arc::new(GatedRunner::new(0)));

    session.start(0);
    assert_eq!(session.next(), Some(ExecutionEvent::StepChanged { step: 1 }));
    assert!(session.active_workflow().unwrap().steps[1].is_finish_step);

    let event = session.next();
    assert!(matches!(event, Some(ExecutionEvent::Completed(ref run)) if run.steps_completed == 2));
    assert_eq!(history.events().len(), 2);
}

#[test]
fn test_pause_and_resume_keeps_progress() {
    let (mut session, history, _links) = session(
        vec![load(TWO_STEPS), load(DAILY_PLANNING)],
        Arc::new(GatedRunner::new(0)),
    );
    let two_steps = session.workflows()[0].id;

    session.start(0);
    session.toggle_completion(None);
    assert_eq!(session.execution().active().unwrap().current_step(), 1);

    assert_eq!(
        session.pause(),
        Some(ExecutionEvent::Paused {
            workflow_id: two_steps
        })
    );
    assert!(!session.execution().is_active());
    assert!(session.execution().is_paused(two_steps));

    assert_eq!(
        session.start(0),
        Some(ExecutionEvent::Resumed {
            workflow_id: two_steps,
            current_step: 1
        })
    );
    let run = session.execution().active().unwrap();
    assert!(run.is_completed(0));
    assert_eq!(run.current_step(), 1);
    assert!(!session.execution().is_paused(two_steps));

    // Resuming does not record a new start
    assert_eq!(history.events().len(), 1);
}

#[test]
fn test_starting_another_workflow_discards_paused_run() {
    let (mut session, _history, _links) = session(
        vec![load(TWO_STEPS), load(DAILY_PLANNING)],
        Arc::new(GatedRunner::new(0)),
    );
    let two_steps = session.workflows()[0].id;

    session.start(0);
    session.next();
    session.pause();
    session.start(1);
    session.pause();

    assert!(!session.execution().is_paused(two_steps));
    assert!(matches!(session.start(0), Some(ExecutionEvent::Started { .. })));
    assert_eq!(session.execution().active().unwrap().current_step(), 0);
}

#[test]
fn test_reset_clears_progress_without_history() {
    let (mut session, history, _links) =
        session(vec![load(TWO_STEPS)], Arc::new(GatedRunner::new(0)));

    session.start(0);
    session.toggle_completion(None);
    session.open_step_link(Some(1)).unwrap();
    assert_eq!(session.reset(), Some(ExecutionEvent::Reset));

    let run = session.execution().active().unwrap();
    assert_eq!(run.current_step(), 0);
    assert!(run.completed().is_empty());
    assert!(run.opened_links().is_empty());
    assert_eq!(history.events().len(), 1);
}

#[test]
fn test_open_step_link_records_and_marks() {
    let (mut session, _history, links) =
        session(vec![load(TWO_STEPS)], Arc::new(GatedRunner::new(0)));

    session.start(0);
    // First step has no link
    assert_eq!(session.open_step_link(None).unwrap(), None);

    session.go_to(1);
    assert_eq!(
        session.open_step_link(None).unwrap(),
        Some(ExecutionEvent::LinkOpened { step: 1 })
    );
    assert!(session.execution().active().unwrap().is_link_opened(1));
    assert_eq!(*links.opened.lock().unwrap(), ["https://example.com"]);
}

#[test]
fn test_actions_without_active_run_are_ignored() {
    let (mut session, _history, _links) =
        session(vec![load(TWO_STEPS)], Arc::new(GatedRunner::new(0)));

    assert_eq!(session.next(), None);
    assert_eq!(session.previous(), None);
    assert_eq!(session.toggle_completion(None), None);
    assert_eq!(session.pause(), None);
    assert_eq!(session.reset(), None);
    assert_eq!(session.complete(), None);
    assert_eq!(session.open_step_link(None).unwrap(), None);
    assert!(session.run_step_command(None).is_none());
    assert_eq!(session.start(5), None);
}
