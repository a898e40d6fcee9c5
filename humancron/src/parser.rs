//! Parser for workflow definition files
//!
//! Definitions use a small, fixed-shape subset of YAML:
//!
//! ```text
//! name: "Daily Planning"
//! description: "Review calendar and plan the day"
//! steps:
//!   - name: "Check Calendar"
//!     description: "Review today's meetings"
//!     automations:
//!       - type: "n8n"
//!         parameters:
//!           key: "value"
//! ```
//!
//! The scan is a line-by-line state machine over [`Section`]s. Each level has
//! its own typed builder which is only turned into the immutable model when it
//! is flushed (a new `-` item at the same level, a dedent out of its body, or
//! end of input).

use std::collections::HashMap;

use humancron_sdk::{AutomationType, Workflow, WorkflowAutomation, WorkflowStep};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid workflow format: no steps section found")]
    InvalidFormat,
    #[error("missing required field: {0}")]
    MissingRequiredField(String),
    #[error("invalid value for {field}: expected {expected}")]
    InvalidFieldType { field: String, expected: String },
}

/// Where the scanner currently is in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Top,
    Steps,
    Step,
    Automations,
    Automation,
    Parameters,
}

/// One significant (non-blank, non-comment) line
#[derive(Debug)]
struct Line<'a> {
    /// Column of the first non-space character (the dash for list items)
    indent: usize,
    /// Column of the key; equals `indent` for plain lines
    body_indent: usize,
    item: bool,
    key: Option<&'a str>,
    value: String,
}

impl<'a> Line<'a> {
    fn classify(raw: &'a str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let indent = raw.len() - raw.trim_start_matches(' ').len();

        let (item, body, body_indent) = if trimmed == "-" {
            (true, "", indent + 2)
        } else if let Some(rest) = trimmed.strip_prefix("- ") {
            let body = rest.trim_start();
            (true, body, indent + 2 + (rest.len() - body.len()))
        } else {
            (false, trimmed, indent)
        };

        let (key, value) = match body.split_once(':') {
            Some((key, value)) => (Some(key.trim()), clean_scalar(value)),
            // A bare item still opens a new list entry
            None if item => (None, String::new()),
            None => return None,
        };

        Some(Self {
            indent,
            body_indent,
            item,
            key,
            value,
        })
    }

    /// The value, or `None` when it is empty after cleaning
    fn present_value(&self) -> Option<String> {
        if self.value.is_empty() {
            None
        } else {
            Some(self.value.clone())
        }
    }
}

/// Strip an inline comment, whitespace and one surrounding pair of quotes
///
/// An unterminated opening quote is dropped along with any trailing quote.
fn clean_scalar(raw: &str) -> String {
    let value = raw.trim();

    if let Some(quote) = value.chars().next().filter(|c| *c == '"' || *c == '\'') {
        let body = &value[1..];
        for (idx, ch) in body.char_indices() {
            if ch == quote {
                let rest = body[idx + 1..].trim_start();
                if rest.is_empty() || rest.starts_with('#') {
                    return body[..idx].to_string();
                }
            }
        }

        // No closing quote: drop the stray opening one
        return strip_comment(body)
            .trim()
            .trim_end_matches(quote)
            .to_string();
    }

    strip_comment(value).trim().to_string()
}

/// Cut at the first `#` that starts a word
fn strip_comment(value: &str) -> &str {
    let mut after_space = true;
    for (idx, ch) in value.char_indices() {
        if ch == '#' && after_space {
            return &value[..idx];
        }
        after_space = ch.is_whitespace();
    }
    value
}

#[derive(Debug, Default)]
struct WorkflowBuilder {
    name: Option<String>,
    description: Option<String>,
    hotkey: Option<String>,
    saw_steps: bool,
    steps: Vec<WorkflowStep>,
}

impl WorkflowBuilder {
    fn build(self) -> Result<Workflow, ParseError> {
        if !self.saw_steps {
            return Err(ParseError::InvalidFormat);
        }

        Ok(Workflow::new(
            self.name.unwrap_or_default(),
            self.description.unwrap_or_default(),
            self.hotkey,
            self.steps,
        ))
    }
}

#[derive(Debug, Default)]
struct StepBuilder {
    name: Option<String>,
    description: Option<String>,
    link: Option<String>,
    command: Option<String>,
    duration: Option<String>,
    automations: Vec<WorkflowAutomation>,
}

impl StepBuilder {
    fn set(&mut self, key: &str, value: Option<String>) {
        match key {
            "name" => self.name = value,
            "description" => self.description = value,
            "link" => self.link = value,
            "command" => self.command = value,
            "duration" => self.duration = value,
            _ => {}
        }
    }

    /// Missing name/description are kept empty so validation can name them
    fn build(self, index: usize) -> Result<WorkflowStep, ParseError> {
        let duration = match self.duration {
            Some(raw) => Some(parse_duration(&raw).ok_or_else(|| ParseError::InvalidFieldType {
                field: format!("steps[{}].duration", index),
                expected: "number of seconds".to_string(),
            })?),
            None => None,
        };

        let mut step = WorkflowStep::new(
            self.name.unwrap_or_default(),
            self.description.unwrap_or_default(),
        );
        step.link = self.link;
        step.command = self.command;
        step.duration = duration;
        if !self.automations.is_empty() {
            step.automations = Some(self.automations);
        }
        Ok(step)
    }
}

fn parse_duration(raw: &str) -> Option<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
}

#[derive(Debug, Default)]
struct AutomationBuilder {
    automation_type: Option<String>,
    webhook: Option<String>,
    parameters: HashMap<String, String>,
}

impl AutomationBuilder {
    fn set(&mut self, key: &str, value: Option<String>) {
        match key {
            "type" => self.automation_type = value,
            "webhook" => self.webhook = value,
            _ => {}
        }
    }

    fn build(self) -> Option<WorkflowAutomation> {
        let raw_type = self.automation_type?;
        let automation_type = match raw_type.parse::<AutomationType>() {
            Ok(t) => t,
            Err(e) => {
                warn!("Skipping automation: {}", e);
                return None;
            }
        };

        Some(WorkflowAutomation {
            automation_type,
            webhook: self.webhook,
            parameters: if self.parameters.is_empty() {
                None
            } else {
                Some(self.parameters)
            },
        })
    }
}

/// Line scanner holding one accumulator per nesting level
struct Scanner {
    section: Section,
    workflow: WorkflowBuilder,
    step: Option<StepBuilder>,
    automation: Option<AutomationBuilder>,
    /// Column of the keys inside the current step
    step_body: usize,
    /// Column of the `automations:` key of the current step
    automations_key: usize,
    /// Column of the keys inside the current automation
    automation_body: usize,
    /// Column of the `parameters:` key of the current automation
    parameters_key: usize,
}

impl Scanner {
    fn new() -> Self {
        Self {
            section: Section::Top,
            workflow: WorkflowBuilder::default(),
            step: None,
            automation: None,
            step_body: 0,
            automations_key: 0,
            automation_body: 0,
            parameters_key: 0,
        }
    }

    fn feed(&mut self, line: &Line<'_>) -> Result<(), ParseError> {
        // Each pass either consumes the line or closes one level and retries
        loop {
            match self.section {
                Section::Top => {
                    self.top_level(line);
                    return Ok(());
                }
                Section::Steps => {
                    if line.indent == 0 && !line.item {
                        self.section = Section::Top;
                        continue;
                    }
                    if line.item {
                        self.open_step(line);
                    }
                    return Ok(());
                }
                Section::Step => {
                    if line.indent > self.step_body || (line.item && line.indent == self.step_body) {
                        // Nested content of an unknown key
                        return Ok(());
                    }
                    if !line.item && line.indent == self.step_body {
                        self.step_key(line);
                        return Ok(());
                    }
                    self.close_step()?;
                    self.section = Section::Steps;
                }
                Section::Automations => {
                    if line.item && line.indent >= self.automations_key {
                        self.open_automation(line);
                        return Ok(());
                    }
                    self.section = Section::Step;
                }
                Section::Automation => {
                    if line.indent > self.automation_body
                        || (line.item && line.indent == self.automation_body)
                    {
                        return Ok(());
                    }
                    if !line.item && line.indent == self.automation_body {
                        self.automation_key(line);
                        return Ok(());
                    }
                    self.close_automation();
                    self.section = Section::Automations;
                }
                Section::Parameters => {
                    if line.indent > self.parameters_key {
                        if let (false, Some(key), Some(value)) =
                            (line.item, line.key, line.present_value())
                        {
                            if let Some(automation) = self.automation.as_mut() {
                                automation.parameters.insert(key.to_string(), value);
                            }
                        }
                        return Ok(());
                    }
                    self.section = Section::Automation;
                }
            }
        }
    }

    fn top_level(&mut self, line: &Line<'_>) {
        if line.indent != 0 || line.item {
            return;
        }
        match line.key {
            Some("steps") => {
                self.workflow.saw_steps = true;
                self.section = Section::Steps;
            }
            Some("name") => self.workflow.name = line.present_value(),
            Some("description") => self.workflow.description = line.present_value(),
            Some("hotkey") => self.workflow.hotkey = line.present_value(),
            _ => {}
        }
    }

    fn open_step(&mut self, line: &Line<'_>) {
        self.step = Some(StepBuilder::default());
        self.step_body = line.body_indent;
        self.section = Section::Step;
        if line.key.is_some() {
            self.step_key(line);
        }
    }

    fn step_key(&mut self, line: &Line<'_>) {
        let Some(key) = line.key else { return };
        if key == "automations" && line.value.is_empty() {
            self.automations_key = line.body_indent;
            self.section = Section::Automations;
            return;
        }
        if let Some(step) = self.step.as_mut() {
            step.set(key, line.present_value());
        }
    }

    fn close_step(&mut self) -> Result<(), ParseError> {
        if let Some(step) = self.step.take() {
            let index = self.workflow.steps.len();
            self.workflow.steps.push(step.build(index)?);
        }
        Ok(())
    }

    fn open_automation(&mut self, line: &Line<'_>) {
        self.automation = Some(AutomationBuilder::default());
        self.automation_body = line.body_indent;
        self.section = Section::Automation;
        if line.key.is_some() {
            self.automation_key(line);
        }
    }

    fn automation_key(&mut self, line: &Line<'_>) {
        let Some(key) = line.key else { return };
        if key == "parameters" && line.value.is_empty() {
            self.parameters_key = self.automation_body;
            self.section = Section::Parameters;
            return;
        }
        if let Some(automation) = self.automation.as_mut() {
            automation.set(key, line.present_value());
        }
    }

    fn close_automation(&mut self) {
        if let Some(automation) = self.automation.take() {
            if let (Some(built), Some(step)) = (automation.build(), self.step.as_mut()) {
                step.automations.push(built);
            }
        }
    }

    fn finish(mut self) -> Result<Workflow, ParseError> {
        self.close_automation();
        self.close_step()?;
        self.workflow.build()
    }
}

/// Parse definition text into a workflow
///
/// This is the structural pass only; call [`validate`] for field-level
/// checks. The returned workflow has a fresh random id.
pub fn parse(text: &str) -> Result<Workflow, ParseError> {
    let mut scanner = Scanner::new();
    for raw in text.lines() {
        if let Some(line) = Line::classify(raw) {
            scanner.feed(&line)?;
        }
    }
    scanner.finish()
}

/// Check required fields and link format
pub fn validate(workflow: &Workflow) -> Result<(), ParseError> {
    if workflow.name.is_empty() {
        return Err(ParseError::MissingRequiredField("name".to_string()));
    }

    if workflow.description.is_empty() {
        return Err(ParseError::MissingRequiredField("description".to_string()));
    }

    if workflow.steps.is_empty() {
        return Err(ParseError::MissingRequiredField("steps".to_string()));
    }

    for (index, step) in workflow.steps.iter().enumerate() {
        if step.name.is_empty() {
            return Err(ParseError::MissingRequiredField(format!("steps[{}].name", index)));
        }

        if step.description.is_empty() {
            return Err(ParseError::MissingRequiredField(format!(
                "steps[{}].description",
                index
            )));
        }

        if let Some(link) = step.link.as_deref().filter(|l| !l.is_empty()) {
            if !link.contains("://") && !link.starts_with('/') {
                return Err(ParseError::InvalidFieldType {
                    field: format!("steps[{}].link", index),
                    expected: "valid URL or path".to_string(),
                });
            }
        }
    }

    Ok(())
}
