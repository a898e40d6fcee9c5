//! Transient user-visible messages

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: usize,
    pub timestamp: Instant,
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    pub auto_dismiss_after: Option<Duration>,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.auto_dismiss_after {
            Some(duration) => now.duration_since(self.timestamp) >= duration,
            None => false,
        }
    }
}
