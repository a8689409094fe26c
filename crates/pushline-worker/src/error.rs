//! Worker host error types.

/// Errors reported by the hosting runtime's display and window primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The display primitive rejected the notification.
    #[error("Notification display rejected: {0}")]
    Display(String),

    /// Focusing an existing window failed.
    #[error("Failed to focus client {0}")]
    Focus(String),

    /// Opening a new window failed.
    #[error("Failed to open window at {0}")]
    OpenWindow(String),

    /// Any other runtime failure (skip-waiting, client claim, ...).
    #[error("Worker runtime error: {0}")]
    Runtime(String),
}

impl From<HostError> for pushline_core::Error {
    fn from(e: HostError) -> Self {
        Self::Presentation(e.to_string())
    }
}
