//! Pushline background worker
//!
//! Everything that runs inside the origin-scoped background worker:
//! - Decoding inbound push payloads through a prioritized chain of
//!   representations and presenting them (with one fallback attempt)
//! - Routing notification clicks to an open window or a new one
//! - Worker lifecycle events (install, activate, skip-waiting messages)
//! - Pending-work tokens that keep the worker alive while events are processed

pub mod descriptor;
pub mod error;
pub mod host;
pub mod payload;
pub mod pending;
pub mod processor;
pub mod router;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod worker;

pub use descriptor::{NotificationDescriptor, NotificationOptions};
pub use error::HostError;
pub use host::{ClientId, WindowClient, WorkerHost};
pub use payload::{DecodeFailure, PushData, RawPushEvent, decode_payload};
pub use pending::{PendingWork, WorkToken};
pub use processor::{PresentationOutcome, PushProcessor};
pub use router::{ClickOutcome, InteractionRouter, NotificationClick, ShownNotification};
pub use worker::{EventOutcome, ServiceWorker, WorkerEvent, WorkerMessage};
