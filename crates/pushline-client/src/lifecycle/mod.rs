//! Subscription lifecycle: permission, worker registration, and
//! subscribe / unsubscribe / resubscribe kept in step with the registry.

mod manager;
mod platform;


pub use manager::{EnsureOutcome, LifecycleState, SubscriptionManager, SubscriptionStatus};
pub use platform::{
    PermissionState, PushPlatform, SubscribeOptions, SubscriptionRegistry, WorkerRegistration,
};
