//! Push event processing: decode, normalize, present.
//!
//! Runs once per inbound push event. Nothing here ever fails outward: decode
//! errors fall back to the raw text, presentation errors get exactly one
//! fallback attempt, and a failed fallback drops the event.

use std::sync::Arc;

use pushline_core::config::NotificationConfig;
use tracing::{debug, error, warn};

use crate::descriptor::NotificationDescriptor;
use crate::host::WorkerHost;
use crate::payload::{RawPushEvent, decode_payload};
use crate::pending::PendingWork;

/// What became of one push event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationOutcome {
    /// The normalized notification was displayed.
    Shown { tag: String },
    /// The primary display failed; the generic fallback was displayed.
    FallbackShown,
    /// Both attempts failed; the event was dropped.
    Dropped,
}

/// Decodes push events and asks the host to present them.
pub struct PushProcessor<H> {
    host: Arc<H>,
    config: NotificationConfig,
    pending: PendingWork,
}

impl<H: WorkerHost> PushProcessor<H> {
    pub const fn new(host: Arc<H>, config: NotificationConfig, pending: PendingWork) -> Self {
        Self {
            host,
            config,
            pending,
        }
    }

    /// Normalize an event into a descriptor without presenting it.
    pub fn normalize(&self, event: &RawPushEvent) -> NotificationDescriptor {
        normalize(event, &self.config)
    }

    /// Process one push event to completion.
    ///
    /// Holds a pending-work token for the whole duration so the runtime
    /// keeps the worker alive.
    pub async fn handle(&self, event: &RawPushEvent) -> PresentationOutcome {
        let _work = self.pending.token();

        let descriptor = self.normalize(event);
        let options = descriptor.options();

        let primary = match self.host.show_notification(&descriptor.title, &options).await {
            Ok(()) => {
                debug!(tag = %descriptor.tag, "Notification shown");
                return PresentationOutcome::Shown {
                    tag: descriptor.tag,
                };
            }
            Err(e) => e,
        };
        warn!(
            error = %pushline_core::Error::from(primary),
            tag = %descriptor.tag,
            "Presentation failed; trying fallback"
        );

        let (title, options) = descriptor.fallback(&self.config);
        match self.host.show_notification(&title, &options).await {
            Ok(()) => PresentationOutcome::FallbackShown,
            Err(e) => {
                error!(
                    error = %pushline_core::Error::from(e),
                    "Fallback presentation failed; dropping push event"
                );
                PresentationOutcome::Dropped
            }
        }
    }
}

/// Normalize a raw push event into a descriptor.
pub fn normalize(event: &RawPushEvent, config: &NotificationConfig) -> NotificationDescriptor {
    let Some(data) = &event.data else {
        debug!("Push event without payload; using defaults");
        return NotificationDescriptor::defaults(config);
    };

    match decode_payload(data) {
        Ok(payload) => NotificationDescriptor::from_payload(&payload, config),
        Err(failure) => {
            let raw = failure.raw_text.clone();
            debug!(
                error = %pushline_core::Error::from(failure),
                "Payload not structured; using raw text as body"
            );
            raw.map_or_else(
                || NotificationDescriptor::defaults(config),
                |text| NotificationDescriptor::from_text(&text, config),
            )
        }
    }
}
