//! Main application state

use tokio::task::JoinHandle;

use humancron_sdk::CommandResult;

use super::View;
use crate::app::NotificationManager;
use crate::config::Config;
use crate::history::SharedHistory;
use crate::session::Session;

/// Main application state
pub struct App {
    pub config: Config,
    pub session: Session,
    pub history: SharedHistory,

    pub current_view: View,
    pub should_quit: bool,

    // Selector state; `selected` indexes the filtered list
    pub selected: usize,
    pub filter: String,
    pub is_filtering: bool,
    pub skipped_files: Vec<String>,

    pub notifications: NotificationManager,

    // Step commands still running in the background
    pub pending_commands: Vec<JoinHandle<CommandResult>>,

    // Tokio runtime for command execution
    pub tokio_runtime: tokio::runtime::Runtime,
}
