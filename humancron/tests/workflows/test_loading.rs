//! Tests for loading definition files from disk

use super::common::*;
use humancron::loader;
use humancron::parser::ParseError;
use humancron_sdk::AutomationType;
use tempfile::TempDir;

#[test]
fn test_load_full_definition() {
    let workflow = load(DAILY_PLANNING);

    assert_eq!(workflow.name, "Daily Planning");
    assert_eq!(workflow.description, "Review calendar and plan the day");
    assert_eq!(workflow.hotkey.as_deref(), Some("cmd+1"));
    assert_eq!(workflow.steps.len(), 2);
    assert_eq!(workflow.declared_step_count(), 1);

    let step = &workflow.steps[0];
    assert_eq!(step.name, "Check Calendar");
    assert_eq!(step.description, "Review today's meetings");
    assert_eq!(step.link.as_deref(), Some("https://calendar.example.com"));
    assert_eq!(step.duration, Some(180.0));
    assert_eq!(step.command.as_deref(), Some("echo hi"));

    let automations = step.automations.as_ref().unwrap();
    assert_eq!(automations.len(), 1);
    assert_eq!(automations[0].automation_type, AutomationType::N8n);
    assert_eq!(
        automations[0].webhook.as_deref(),
        Some("https://n8n.example.com/webhook/x")
    );
    let parameters = automations[0].parameters.as_ref().unwrap();
    assert_eq!(parameters.get("key").map(String::as_str), Some("value"));

    let finish = &workflow.steps[1];
    assert!(finish.is_finish_step);
    assert_eq!(finish.name, "Finish Workflow");
    assert_eq!(finish.description, "All tasks completed");
}

#[test]
fn test_directory_skips_invalid_files() {
    let dir = TempDir::new().unwrap();
    write_workflow(dir.path(), "daily.yaml", DAILY_PLANNING);
    write_workflow(dir.path(), "two.yml", TWO_STEPS);
    write_workflow(
        dir.path(),
        "broken.yaml",
        "name: \"Broken\"\nsteps:\n  - name: \"Only\"\n    description: \"x\"\n",
    );
    write_workflow(dir.path(), "notes.txt", "not a workflow");

    let report = loader::load_directory(dir.path()).unwrap();

    let names: Vec<&str> = report.workflows.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, ["Daily Planning", "Two Steps"]);
    assert_eq!(report.skipped.len(), 1);

    let message = report.skipped[0].to_string();
    assert!(message.contains("broken.yaml"));
    assert!(message.contains("description"));
}

#[test]
fn test_loaded_workflows_remember_their_file() {
    let dir = TempDir::new().unwrap();
    let path = write_workflow(dir.path(), "two.yaml", TWO_STEPS);

    let workflow = loader::load_file(&path).unwrap();
    assert_eq!(workflow.file_path.as_deref(), Some(path.as_path()));
}

#[test]
fn test_bare_word_link_is_rejected() {
    let text = TWO_STEPS.replace("link: \"https://example.com\"", "link: \"notadomain\"");
    let error = loader::load(&text, "x.yaml").unwrap_err();
    assert_eq!(
        error,
        ParseError::InvalidFieldType {
            field: "steps[1].link".to_string(),
            expected: "valid URL or path".to_string(),
        }
    );
}

#[test]
fn test_missing_steps_is_invalid_format() {
    let error = loader::load("name: \"x\"\ndescription: \"y\"\n", "x.yaml").unwrap_err();
    assert_eq!(error, ParseError::InvalidFormat);
}

#[test]
fn test_reloading_gives_new_identity() {
    let first = load(TWO_STEPS);
    let second = load(TWO_STEPS);

    assert_eq!(first.name, second.name);
    assert_ne!(first.id, second.id);
    assert_ne!(first.steps[0].id, second.steps[0].id);
}

#[test]
fn test_new_workflow_file_loads() {
    let dir = TempDir::new().unwrap();
    let path = loader::create_workflow_file(dir.path(), "Evening Review").unwrap();

    assert_eq!(path.file_name().unwrap(), "evening-review.yaml");
    let workflow = loader::load_file(&path).unwrap();
    assert_eq!(workflow.name, "Evening Review");
    assert!(loader::create_workflow_file(dir.path(), "Evening Review").is_err());
}
