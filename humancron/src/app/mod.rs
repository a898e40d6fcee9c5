//! Application state and module organization
//!
//! This module contains the main App struct; its behaviour is split across
//! the submodules by concern (key input, navigation, workflow operations).

use anyhow::{Context, Result};

use crate::config::Config;
use crate::history::SharedHistory;
use crate::session::Session;

mod models;
pub use models::*;

// Declare submodules
mod input;
mod navigation;
mod notifications;
mod workflow_ops;

pub use notifications::NotificationManager;

impl App {
    pub fn new(
        config: Config,
        session: Session,
        history: SharedHistory,
        skipped_files: Vec<String>,
    ) -> Result<Self> {
        // Create tokio runtime for command execution
        let tokio_runtime =
            tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

        let mut app = Self {
            config,
            session,
            history,
            current_view: View::Selector,
            should_quit: false,
            selected: 0,
            filter: String::new(),
            is_filtering: false,
            skipped_files,
            notifications: NotificationManager::new(),
            pending_commands: Vec::new(),
            tokio_runtime,
        };

        if !app.skipped_files.is_empty() {
            let count = app.skipped_files.len();
            app.notifications.warning(
                "Skipped workflow files",
                format!("{} file(s) failed to load; see `humancron list`", count),
            );
        }

        Ok(app)
    }

    /// Called once per frame before drawing
    pub fn tick(&mut self) {
        self.poll_commands();
        self.notifications.cleanup_expired();
    }
}
