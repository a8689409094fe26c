//! Seams to the platform push subsystem and the subscription registry.

use async_trait::async_trait;
use pushline_core::Result;
use pushline_core::types::{PushSubscription, Validation};
use pushline_crypto::ApplicationServerKey;
use serde::{Deserialize, Serialize};

/// Notification permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    /// Not decided yet; prompting is allowed.
    Default,
}

/// A background worker registration held by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRegistration {
    pub script_url: String,
    pub scope: String,
}

/// Arguments to the platform subscribe primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Always `true`; silent push is not supported.
    pub user_visible_only: bool,
    pub application_server_key: ApplicationServerKey,
}

impl SubscribeOptions {
    pub const fn new(application_server_key: ApplicationServerKey) -> Self {
        Self {
            user_visible_only: true,
            application_server_key,
        }
    }
}

/// The platform push subsystem.
///
/// Owns the one subscription slot per origin. Implementations hand out a
/// fresh [`PushSubscription`] on every call; callers never hold one across
/// operations.
#[async_trait]
pub trait PushPlatform: Send + Sync {
    /// Whether background workers and push are available at all.
    fn is_supported(&self) -> bool;

    /// Current worker registration at `scope`, if any.
    async fn worker_registration(&self, scope: &str) -> Result<Option<WorkerRegistration>>;

    /// Register the background worker. Errors are registration failures.
    async fn register_worker(&self, script_url: &str, scope: &str) -> Result<WorkerRegistration>;

    /// Query permission without prompting.
    async fn permission_state(&self) -> PermissionState;

    /// Prompt the user once and return the answer.
    async fn request_permission(&self) -> Result<PermissionState>;

    async fn get_subscription(&self) -> Result<Option<PushSubscription>>;

    /// Create a subscription. A refused key is reported as
    /// [`pushline_core::Error::KeyTransformRejected`].
    async fn subscribe(&self, options: SubscribeOptions) -> Result<PushSubscription>;

    /// Remove the subscription. `Ok(false)` means the platform declined.
    async fn unsubscribe(&self, subscription: &PushSubscription) -> Result<bool>;
}

/// The remote subscription registry (the dispatch side's storage).
#[async_trait]
pub trait SubscriptionRegistry: Send + Sync {
    /// Current application server key, URL-safe base64.
    async fn fetch_server_key(&self) -> Result<String>;

    /// Store `(endpoint, p256dh, auth)`. Re-registering an endpoint replaces it.
    async fn register_subscription(&self, subscription: &PushSubscription) -> Result<u64>;

    async fn delete_subscription(&self, subscription: &PushSubscription) -> Result<()>;

    /// Never fails: an unreachable registry yields [`Validation::Unknown`].
    async fn validate_subscription(&self, endpoint: &str) -> Validation;
}
