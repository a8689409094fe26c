//! Pushline client
//!
//! The application side of the push pipeline:
//! - Subscription lifecycle (worker registration, permission, subscribe,
//!   read-repair, unsubscribe) over platform and registry traits
//! - A reqwest client for the subscription registry
//! - Operator subcommands for the `pushline` binary

pub mod commands;
pub mod lifecycle;
pub mod registry;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use lifecycle::{
    EnsureOutcome, LifecycleState, PermissionState, PushPlatform, SubscribeOptions,
    SubscriptionManager, SubscriptionRegistry, SubscriptionStatus, WorkerRegistration,
};
pub use registry::RegistryClient;
