//! Header and footer rendering functions

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, View};

pub fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let title = match (app.current_view, app.session.active_workflow()) {
        (View::Execution, Some(workflow)) => format!("humancron - {}", workflow.name),
        _ => "humancron - Workflows".to_string(),
    };

    let mut spans = vec![Span::styled(
        title,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )];

    if let Some(run) = app.session.execution().active() {
        let total = run.workflow().steps.len();
        spans.push(Span::raw("      "));
        spans.push(Span::styled(
            format!(
                "Step {}/{}  ({} done)",
                run.current_step() + 1,
                total,
                run.completed().len()
            ),
            Style::default().fg(Color::Cyan),
        ));
    }

    spans.push(Span::raw("      "));
    spans.push(Span::styled("[Q]", Style::default().add_modifier(Modifier::BOLD)));
    spans.push(Span::raw("uit"));

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn key(label: &str) -> Span<'_> {
    Span::styled(label, Style::default().add_modifier(Modifier::BOLD))
}

pub fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let footer_text = match app.current_view {
        View::Selector if app.is_filtering => Line::from(vec![
            Span::styled(
                "TYPE",
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" to filter  "),
            key("[↑↓]"),
            Span::raw(" Navigate  "),
            key("[Enter]"),
            Span::raw(" Start  "),
            key("[Esc]"),
            Span::raw(" Clear"),
        ]),
        View::Selector => Line::from(vec![
            key("[↑↓/jk]"),
            Span::raw(" Navigate  "),
            key("[/]"),
            Span::raw(" Filter  "),
            key("[Enter]"),
            Span::raw(" Start/Resume  "),
            key("[R]"),
            Span::raw(" Reload  "),
            key("[Q]"),
            Span::raw(" Quit"),
        ]),
        View::Execution => Line::from(vec![
            key("[↑↓/jk]"),
            Span::raw(" Step  "),
            key("[Space]"),
            Span::raw(" Done  "),
            key("[Enter]"),
            Span::raw(" Open/Next  "),
            key("[O]"),
            Span::raw(" Link  "),
            key("[X]"),
            Span::raw(" Run  "),
            key("[R]"),
            Span::raw(" Reset  "),
            key("[Esc/B]"),
            Span::raw(" Pause  "),
            key("[Q]"),
            Span::raw(" Quit"),
        ]),
    };

    let footer = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}
