//! Subscription data model and registry wire types.
//!
//! The persisted and transmitted representation of a subscription is always
//! the triple `(endpoint, p256dh, auth)`; the key fields carry URL-safe
//! base64 without padding, as produced by the platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key material of a push subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    /// P-256 key-agreement public key (65-byte uncompressed point, base64url).
    pub p256dh: String,
    /// Shared authentication secret (base64url).
    pub auth: String,
}

/// A push subscription as handed out by the platform push subsystem.
///
/// This is a handle: it is obtained fresh from the platform for every
/// operation and never kept across suspension points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    /// Opaque, globally unique endpoint URL.
    pub endpoint: String,
    /// Expiration time in milliseconds since the epoch, when the platform knows one.
    #[serde(
        rename = "expirationTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration_time: Option<i64>,
    /// Key material.
    pub keys: SubscriptionKeys,
}

impl PushSubscription {
    pub fn new(endpoint: impl Into<String>, p256dh: impl Into<String>, auth: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            expiration_time: None,
            keys: SubscriptionKeys {
                p256dh: p256dh.into(),
                auth: auth.into(),
            },
        }
    }
}

/// A subscription record as stored by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: u64,
    pub endpoint: String,
    pub keys: SubscriptionKeys,
    pub created_at: DateTime<Utc>,
    /// Account the record belongs to, when the registry exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<u64>,
}

/// One page of a paginated registry listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    /// Absolute or base-relative URL of the next page.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// A listing body: paginated, or a bare array when the registry has
/// pagination switched off.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Paged(Page<T>),
    Plain(Vec<T>),
}

impl<T> ListResponse<T> {
    /// Split into this page's items and the link to the next page.
    pub fn into_parts(self) -> (Vec<T>, Option<String>) {
        match self {
            Self::Paged(page) => (page.results, page.next),
            Self::Plain(items) => (items, None),
        }
    }
}

/// Result of asking the registry whether an endpoint is still live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Expired,
    /// The registry could not be reached or gave no usable answer.
    Unknown,
}

/// Outcome of one delivery attempt by the dispatch collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Accepted by the push service.
    Delivered,
    /// The endpoint is gone (404 / 410); the subscription must be rebuilt.
    Gone,
    /// Transient failure (5xx, network); may succeed later.
    Temporary(String),
    /// Rejected for good (other 4xx).
    Permanent(String),
}

impl DispatchOutcome {
    /// Classify a push service HTTP response.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            200..=299 => Self::Delivered,
            404 | 410 => Self::Gone,
            400..=499 => Self::Permanent(format!("HTTP {status}: {body}")),
            _ => Self::Temporary(format!("HTTP {status}")),
        }
    }

    /// Whether the endpoint behind this outcome has expired.
    pub const fn is_expiry(&self) -> bool {
        matches!(self, Self::Gone)
    }
}

// =========================================================================
// Registry wire types
// =========================================================================

/// `GET` key-retrieval response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerKeyResponse {
    pub public_key: String,
}

/// Body of the subscribe and unsubscribe requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionEnvelope {
    pub subscription: PushSubscription,
}

/// `POST` subscribe response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeResponse {
    #[serde(default)]
    pub message: String,
    pub subscription_id: u64,
}

/// Plain `{ "message": ... }` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// Error body returned by the registry on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request body for triggering a test push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestPushRequest {
    pub title: String,
    pub body: String,
}

/// Response of the test push endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestPushResponse {
    #[serde(default)]
    pub message: String,
    pub success_count: u32,
    pub failed_count: u32,
    #[serde(default)]
    pub remaining_subscriptions: Option<u32>,
}
