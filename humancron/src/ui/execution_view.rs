//! Execution view: step list on the left, current step detail on the right

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use humancron_sdk::{CommandExecutionState, WorkflowStep};

use super::format_duration;
use crate::app::App;
use crate::execution::ActiveRun;

pub fn render_execution(f: &mut Frame, area: Rect, app: &App) {
    let Some(run) = app.session.execution().active() else {
        let idle = Paragraph::new("No active workflow")
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(idle, area);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(columns[0]);

    render_step_list(f, left[0], app, run);
    render_progress(f, left[1], run);
    render_step_detail(f, columns[1], app, run);
}

fn render_step_list(f: &mut Frame, area: Rect, app: &App, run: &ActiveRun) {
    let items: Vec<ListItem> = run
        .workflow()
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let is_current = i == run.current_step();
            let mark = if run.is_completed(i) { "[x]" } else { "[ ]" };

            let mut spans = vec![
                Span::raw(if is_current { "▶ " } else { "  " }),
                Span::styled(
                    mark,
                    Style::default().fg(if run.is_completed(i) {
                        Color::Green
                    } else {
                        Color::DarkGray
                    }),
                ),
                Span::raw(" "),
                Span::styled(
                    step.name.clone(),
                    Style::default()
                        .fg(if is_current { Color::White } else { Color::Gray })
                        .add_modifier(if is_current {
                            Modifier::BOLD
                        } else {
                            Modifier::empty()
                        }),
                ),
            ];

            if run.is_link_opened(i) {
                spans.push(Span::styled(" ↗", Style::default().fg(Color::Cyan)));
            }
            if step.command.is_some() {
                let (badge, color) = command_badge(&app.command_state(i));
                spans.push(Span::styled(format!(" {}", badge), Style::default().fg(color)));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(run.current_step()));

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Steps "));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_progress(f: &mut Frame, area: Rect, run: &ActiveRun) {
    let total = run.workflow().steps.len().max(1);
    let done = run.completed().len();
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(done as f64 / total as f64)
        .label(format!("{}/{} done", done, total));
    f.render_widget(gauge, area);
}

fn render_step_detail(f: &mut Frame, area: Rect, app: &App, run: &ActiveRun) {
    let step = run.current();
    let index = run.current_step();

    let mut lines = vec![
        Line::from(Span::styled(
            step.name.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            step.description.clone(),
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
    ];

    if step.is_finish_step {
        lines.push(Line::from(Span::styled(
            "Press Enter to finish the workflow",
            Style::default().fg(Color::Green),
        )));
    }

    if let Some(link) = &step.link {
        let status = if run.is_link_opened(index) {
            Span::styled(" (opened)", Style::default().fg(Color::Cyan))
        } else {
            Span::styled(" (press o or Enter)", Style::default().fg(Color::DarkGray))
        };
        lines.push(Line::from(vec![
            Span::styled("Link: ", Style::default().fg(Color::Gray)),
            Span::styled(link.clone(), Style::default().fg(Color::Blue)),
            status,
        ]));
    }

    if let Some(duration) = step.duration {
        lines.push(Line::from(vec![
            Span::styled("Duration: ", Style::default().fg(Color::Gray)),
            Span::styled(format_duration(duration), Style::default().fg(Color::White)),
        ]));
    }

    lines.extend(automation_lines(step));

    if let Some(command) = &step.command {
        lines.push(Line::from(""));
        lines.extend(command_lines(command, &app.command_state(index)));
    }

    let detail = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Current Step "))
        .wrap(Wrap { trim: false });
    f.render_widget(detail, area);
}

fn automation_lines(step: &WorkflowStep) -> Vec<Line<'static>> {
    let Some(automations) = &step.automations else {
        return Vec::new();
    };

    let mut lines = vec![Line::from(Span::styled(
        "Automations:",
        Style::default().fg(Color::Gray),
    ))];
    for automation in automations {
        let target = automation.webhook.clone().unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {} ", automation.automation_type),
                Style::default().fg(Color::Magenta),
            ),
            Span::styled(target, Style::default().fg(Color::DarkGray)),
        ]));
        if let Some(parameters) = &automation.parameters {
            let mut keys: Vec<&String> = parameters.keys().collect();
            keys.sort();
            for key in keys {
                lines.push(Line::from(Span::styled(
                    format!("    {} = {}", key, parameters[key]),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
    }
    lines
}

fn command_lines(command: &str, state: &CommandExecutionState) -> Vec<Line<'static>> {
    let (badge, color) = command_badge(state);
    let mut lines = vec![Line::from(vec![
        Span::styled("Command: ", Style::default().fg(Color::Gray)),
        Span::styled(format!("$ {}", command), Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(badge, Style::default().fg(color)),
    ])];

    match state {
        CommandExecutionState::Ready => lines.push(Line::from(Span::styled(
            "Press x to run",
            Style::default().fg(Color::DarkGray),
        ))),
        CommandExecutionState::Running => lines.push(Line::from(Span::styled(
            "Running...",
            Style::default().fg(Color::Yellow),
        ))),
        CommandExecutionState::Success(result) | CommandExecutionState::Failure(result) => {
            lines.push(Line::from(Span::styled(
                format!("{} in {}", result.display_summary(), result.duration_string()),
                Style::default().fg(color),
            )));
            lines.push(Line::from(""));
            for line in result.combined_output().lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
    }
    lines
}

fn command_badge(state: &CommandExecutionState) -> (&'static str, Color) {
    match state {
        CommandExecutionState::Ready => ("▷", Color::DarkGray),
        CommandExecutionState::Running => ("⟳", Color::Yellow),
        CommandExecutionState::Success(_) => ("✓", Color::Green),
        CommandExecutionState::Failure(_) => ("✗", Color::Red),
    }
}
