//! Error types for the Pushline pipeline.

use thiserror::Error;

/// Result type alias using Pushline Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the subscription lifecycle and its collaborators.
///
/// `PayloadDecode` and `Presentation` only ever travel inside the
/// background worker; they are logged there and never reach a caller.
#[derive(Debug, Error)]
pub enum Error {
    /// The platform has no background worker or push subsystem.
    #[error("Push notifications are not supported on this platform")]
    Unsupported,

    /// The user denied notification permission for this session.
    #[error("Notification permission denied")]
    PermissionDenied,

    /// The platform refused to register the background worker.
    #[error("Background worker registration failed: {0}")]
    WorkerRegistrationFailed(String),

    /// The platform (or the strict key policy) refused the application server key.
    #[error("Application server key rejected: {0}")]
    KeyTransformRejected(String),

    /// The dispatch side reported the endpoint as gone.
    #[error("Subscription expired: {endpoint}")]
    SubscriptionExpired {
        /// Endpoint that is no longer valid.
        endpoint: String,
    },

    /// A push payload could not be decoded as structured data.
    #[error("Push payload decode failed: {0}")]
    PayloadDecode(String),

    /// The platform refused to display a notification.
    #[error("Notification presentation failed: {0}")]
    Presentation(String),

    /// The subscription registry answered with a non-success status.
    #[error("Registry error (status {status}): {message}")]
    Registry {
        /// HTTP status code returned by the registry.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// Transport-level failure talking to the registry.
    #[error("Registry request failed: {0}")]
    Request(String),

    /// Any other platform push subsystem failure.
    #[error("Platform error: {0}")]
    Platform(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error should trigger an unsubscribe + resubscribe cycle.
    pub const fn is_expiry(&self) -> bool {
        matches!(self, Self::SubscriptionExpired { .. })
    }

    /// Whether this error is terminal for the current session.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::Unsupported)
    }
}
