//! Workflow selector: filter line plus the list of loaded workflows

use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::{centered_rect, format_duration};
use crate::app::App;
use crate::history::format_last_run;

pub fn render_selector(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_filter(f, chunks[0], app);
    render_workflow_list(f, chunks[1], app);
}

fn render_filter(f: &mut Frame, area: Rect, app: &App) {
    let (text, style) = if app.filter.is_empty() && !app.is_filtering {
        (
            "Press / to search workflows".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    } else if app.is_filtering {
        (format!("{}█", app.filter), Style::default().fg(Color::Yellow))
    } else {
        (app.filter.clone(), Style::default().fg(Color::White))
    };

    let filter = Paragraph::new(Line::from(vec![
        Span::styled("🔍 ", Style::default().fg(Color::Gray)),
        Span::styled(text, style),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(filter, area);
}

fn render_workflow_list(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Workflows ({}) ", app.config.workflows_dir.display()));

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let visible = app.visible_workflows();
    if visible.is_empty() {
        let message = if app.filter.is_empty() {
            format!(
                "No workflows found.\n\nAdd .yaml files to {}\nor run `humancron new <NAME>`.",
                app.config.workflows_dir.display()
            )
        } else {
            format!("No workflows match '{}'", app.filter)
        };
        let empty = Paragraph::new(message)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: false });
        f.render_widget(empty, centered_rect(80, 40, inner_area));
        return;
    }

    let now = Local::now();
    let items: Vec<ListItem> = visible
        .iter()
        .enumerate()
        .filter_map(|(row, index)| {
            let workflow = app.session.workflows().get(*index)?;
            let is_selected = row == app.selected;
            let bullet = if is_selected { "▶" } else { " " };

            let mut title = vec![
                Span::raw(format!(" {} ", bullet)),
                Span::styled(
                    workflow.name.clone(),
                    Style::default()
                        .fg(if is_selected { Color::White } else { Color::Gray })
                        .add_modifier(if is_selected {
                            Modifier::BOLD
                        } else {
                            Modifier::empty()
                        }),
                ),
            ];

            if app.session.execution().is_paused(workflow.id) {
                title.push(Span::raw(" "));
                title.push(Span::styled("[Paused]", Style::default().fg(Color::Yellow)));
            }
            if let Some(hotkey) = &workflow.hotkey {
                title.push(Span::raw(" "));
                title.push(Span::styled(
                    format!("[{}]", hotkey),
                    Style::default().fg(Color::DarkGray),
                ));
            }

            let mut meta = format!("{} steps", workflow.declared_step_count());
            if let Some(total) = workflow.total_duration() {
                meta.push_str(&format!(" · ~{}", format_duration(total)));
            }
            if let Some(run) = app.history.last_run(&workflow.name) {
                meta.push_str(&format!(" · last run {}", format_last_run(run.started_at, now)));
            }

            Some(ListItem::new(vec![
                Line::from(title),
                Line::from(Span::styled(
                    format!("     {}", workflow.description),
                    Style::default().fg(Color::DarkGray),
                )),
                Line::from(Span::styled(
                    format!("     {}", meta),
                    Style::default().fg(Color::DarkGray),
                )),
                Line::from(""),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.selected));
    let list = List::new(items);
    f.render_stateful_widget(list, inner_area, &mut state);
}
