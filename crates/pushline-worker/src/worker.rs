//! Background worker event dispatch.
//!
//! One entry point for every lifecycle event the runtime delivers. Dispatch
//! never fails: there is no channel to report errors through at this point,
//! so failures are logged and contained here.

use std::sync::Arc;

use pushline_core::config::NotificationConfig;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::host::WorkerHost;
use crate::payload::RawPushEvent;
use crate::pending::PendingWork;
use crate::processor::{PresentationOutcome, PushProcessor};
use crate::router::{ClickOutcome, InteractionRouter, NotificationClick, ShownNotification};

/// Control messages posted to the worker by application windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Activate a waiting worker version immediately.
    SkipWaiting,
}

impl WorkerMessage {
    /// Parse a posted message; accepts `{"type":"SKIP_WAITING"}` or the bare
    /// string `"SKIP_WAITING"`.
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => {
                serde_json::from_value(serde_json::json!({ "type": s })).ok()
            }
            other => serde_json::from_value(other.clone()).ok(),
        }
    }
}

/// Lifecycle events delivered to the background worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Install,
    Activate,
    Push(RawPushEvent),
    NotificationClick(NotificationClick),
    NotificationClose(ShownNotification),
    Message(Value),
}

impl WorkerEvent {
    const fn name(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Push(_) => "push",
            Self::NotificationClick(_) => "notificationclick",
            Self::NotificationClose(_) => "notificationclose",
            Self::Message(_) => "message",
        }
    }
}

/// What dispatching an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Installed,
    Activated,
    Presented(PresentationOutcome),
    /// `None` when routing failed in the host.
    Clicked(Option<ClickOutcome>),
    Dismissed,
    SkippedWaiting,
    /// Message not understood; ignored.
    Ignored,
}

/// The background worker: push processing plus interaction routing over one host.
pub struct ServiceWorker<H> {
    host: Arc<H>,
    processor: PushProcessor<H>,
    router: InteractionRouter<H>,
    pending: PendingWork,
}

impl<H: WorkerHost> ServiceWorker<H> {
    pub fn new(host: Arc<H>, config: NotificationConfig) -> Self {
        Self::with_pending(host, config, PendingWork::new())
    }

    /// Build a worker that reports its in-flight work through `pending`.
    pub fn with_pending(host: Arc<H>, config: NotificationConfig, pending: PendingWork) -> Self {
        let router = InteractionRouter::new(Arc::clone(&host), config.default_url.clone());
        let processor = PushProcessor::new(Arc::clone(&host), config, pending.clone());
        Self {
            host,
            processor,
            router,
            pending,
        }
    }

    pub const fn pending(&self) -> &PendingWork {
        &self.pending
    }

    pub const fn processor(&self) -> &PushProcessor<H> {
        &self.processor
    }

    /// Handle one event to completion.
    pub async fn dispatch(&self, event: WorkerEvent) -> EventOutcome {
        let _work = self.pending.token();
        debug!(event = event.name(), "Dispatching worker event");

        match event {
            WorkerEvent::Install => {
                info!("Background worker installed");
                EventOutcome::Installed
            }
            WorkerEvent::Activate => {
                if let Err(e) = self.host.claim_clients().await {
                    warn!(error = %e, "Failed to claim open windows");
                }
                info!("Background worker activated");
                EventOutcome::Activated
            }
            WorkerEvent::Push(push) => EventOutcome::Presented(self.processor.handle(&push).await),
            WorkerEvent::NotificationClick(click) => match self.router.route_click(&click).await {
                Ok(outcome) => EventOutcome::Clicked(Some(outcome)),
                Err(e) => {
                    warn!(error = %e, "Notification click routing failed");
                    EventOutcome::Clicked(None)
                }
            },
            WorkerEvent::NotificationClose(notification) => {
                self.router.on_close(&notification);
                EventOutcome::Dismissed
            }
            WorkerEvent::Message(value) => self.on_message(&value).await,
        }
    }

    async fn on_message(&self, value: &Value) -> EventOutcome {
        match WorkerMessage::parse(value) {
            Some(WorkerMessage::SkipWaiting) => {
                if let Err(e) = self.host.skip_waiting().await {
                    warn!(error = %e, "skip_waiting failed");
                }
                info!("Skip-waiting requested; activating immediately");
                EventOutcome::SkippedWaiting
            }
            None => {
                debug!("Ignoring unrecognised worker message");
                EventOutcome::Ignored
            }
        }
    }
}
