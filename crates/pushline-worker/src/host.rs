//! The hosting runtime seen from inside the background worker.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::descriptor::NotificationOptions;
use crate::error::HostError;

/// Identifier of an application window known to the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An open application window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowClient {
    pub id: ClientId,
    pub url: String,
    /// Whether this worker currently controls the window.
    pub controlled: bool,
}

/// Primitives the runtime offers to the background worker.
///
/// Implementations wrap the platform; the worker never holds state of its
/// own beyond what is passed into each call.
#[async_trait]
pub trait WorkerHost: Send + Sync {
    /// Display a notification. Optional fields absent from `options` must
    /// not be sent to the platform at all.
    async fn show_notification(
        &self,
        title: &str,
        options: &NotificationOptions,
    ) -> Result<(), HostError>;

    /// Close the displayed notification with this tag. Closing twice is a no-op.
    async fn close_notification(&self, tag: &str);

    /// Enumerate open windows of this origin.
    async fn match_all_clients(&self, include_uncontrolled: bool)
    -> Result<Vec<WindowClient>, HostError>;

    async fn focus_client(&self, id: &ClientId) -> Result<(), HostError>;

    async fn open_window(&self, url: &str) -> Result<(), HostError>;

    /// Activate a waiting worker immediately.
    async fn skip_waiting(&self) -> Result<(), HostError>;

    /// Take control of already-open windows.
    async fn claim_clients(&self) -> Result<(), HostError>;
}
