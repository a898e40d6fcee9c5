//! UI rendering functions for the humancron TUI
//!
//! Two views share a header and footer: the workflow selector and the
//! step-by-step execution view. Notifications are drawn as an overlay.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::app::{App, View};

// Module declarations
mod components;
mod execution_view;
mod header_footer;
mod notifications;
mod selector;

// Re-export public functions
pub use components::{centered_rect, format_duration};
pub use execution_view::render_execution;
pub use header_footer::{render_footer, render_header};
pub use notifications::render_notifications;
pub use selector::render_selector;

/// Main UI rendering function - orchestrates all view rendering
pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, chunks[0], app);

    match app.current_view {
        View::Selector => render_selector(f, chunks[1], app),
        View::Execution => render_execution(f, chunks[1], app),
    }

    render_footer(f, chunks[2], app);

    render_notifications(f, app, chunks[1]);
}
