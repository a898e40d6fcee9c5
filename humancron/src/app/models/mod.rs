//! Data models for the application

mod app;
mod notification;
mod view;

// Re-export all public types
pub use app::*;
pub use notification::*;
pub use view::*;
