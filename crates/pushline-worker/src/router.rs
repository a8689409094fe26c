//! Notification interaction routing: focus an open window or open a new one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::HostError;
use crate::host::{ClientId, WorkerHost};

/// A notification as it is currently displayed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShownNotification {
    pub tag: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl ShownNotification {
    pub fn url(&self) -> Option<&str> {
        self.data
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
    }
}

/// User clicked a notification (or one of its actions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationClick {
    pub notification: ShownNotification,
    #[serde(default)]
    pub action: Option<String>,
}

/// Where a click ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// An already open window showing the target was focused.
    Focused(ClientId),
    /// A new window was opened at the target.
    Opened(String),
}

pub struct InteractionRouter<H> {
    host: Arc<H>,
    default_url: String,
}

impl<H: WorkerHost> InteractionRouter<H> {
    pub fn new(host: Arc<H>, default_url: impl Into<String>) -> Self {
        Self {
            host,
            default_url: default_url.into(),
        }
    }

    /// Close the notification, then focus the window already showing its
    /// target URL or open a new one there.
    pub async fn route_click(&self, click: &NotificationClick) -> Result<ClickOutcome, HostError> {
        self.host.close_notification(&click.notification.tag).await;

        let target_url = click.notification.url().unwrap_or(&self.default_url);
        debug!(
            tag = %click.notification.tag,
            action = click.action.as_deref().unwrap_or(""),
            url = target_url,
            "Routing notification click"
        );

        let clients = self.host.match_all_clients(true).await?;
        if let Some(client) = clients.iter().find(|c| c.url == target_url) {
            self.host.focus_client(&client.id).await?;
            return Ok(ClickOutcome::Focused(client.id.clone()));
        }

        self.host.open_window(target_url).await?;
        Ok(ClickOutcome::Opened(target_url.to_string()))
    }

    /// Dismissed without a click: nothing to do beyond telemetry.
    pub fn on_close(&self, notification: &ShownNotification) {
        info!(tag = %notification.tag, "Notification dismissed");
    }
}
