//! Subscription lifecycle state machine.
//!
//! `Unregistered -> WorkerRegistered -> PermissionGranted -> Subscribed -> (Expired | Unsubscribed)`
//!
//! The subscription itself lives in the platform. Every operation asks the
//! platform for it afresh; the manager only tracks where in the lifecycle it
//! believes the origin to be.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pushline_core::config::{KeyPolicy, WorkerConfig};
use pushline_core::tracing_init::endpoint_prefix;
use pushline_core::types::{DispatchOutcome, PushSubscription, Validation};
use pushline_core::{Error, Result};
use tracing::{debug, info, instrument, warn};

use super::platform::{
    PermissionState, PushPlatform, SubscribeOptions, SubscriptionRegistry, WorkerRegistration,
};

/// Where the manager believes the origin's subscription slot is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unregistered,
    WorkerRegistered,
    PermissionGranted,
    Subscribed,
    Expired,
    Unsubscribed,
}

/// Side-effect free snapshot of the platform subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionStatus {
    pub subscribed: bool,
    pub subscription: Option<PushSubscription>,
}

/// Result of the read-repair pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// No subscription existed; one was created.
    Created(PushSubscription),
    /// The existing subscription is known to the registry.
    Valid(PushSubscription),
    /// The existing subscription had expired and was torn down and rebuilt.
    Renewed(PushSubscription),
    /// The registry could not say; the subscription was left alone.
    Unknown(PushSubscription),
}

impl EnsureOutcome {
    pub const fn subscription(&self) -> &PushSubscription {
        match self {
            Self::Created(s) | Self::Valid(s) | Self::Renewed(s) | Self::Unknown(s) => s,
        }
    }
}

/// Drives permission, worker registration and subscribe/unsubscribe against
/// a platform and keeps the registry in step.
pub struct SubscriptionManager<P, R> {
    platform: Arc<P>,
    registry: Arc<R>,
    worker: WorkerConfig,
    key_policy: KeyPolicy,
    state: LifecycleState,
    /// Set once the user denies permission; never cleared within a session.
    permission_denied: bool,
    last_validated_at: Option<DateTime<Utc>>,
}

impl<P: PushPlatform, R: SubscriptionRegistry> SubscriptionManager<P, R> {
    pub const fn new(
        platform: Arc<P>,
        registry: Arc<R>,
        worker: WorkerConfig,
        key_policy: KeyPolicy,
    ) -> Self {
        Self {
            platform,
            registry,
            worker,
            key_policy,
            state: LifecycleState::Unregistered,
            permission_denied: false,
            last_validated_at: None,
        }
    }

    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// When the registry last confirmed the subscription.
    pub const fn last_validated_at(&self) -> Option<DateTime<Utc>> {
        self.last_validated_at
    }

    pub const fn permission_denied(&self) -> bool {
        self.permission_denied
    }

    /// Register the background worker unless it already is. Not retried.
    #[instrument(skip(self), fields(scope = %self.worker.scope))]
    pub async fn ensure_ready(&mut self) -> Result<WorkerRegistration> {
        if !self.platform.is_supported() {
            return Err(Error::Unsupported);
        }

        let registration = match self.platform.worker_registration(&self.worker.scope).await? {
            Some(existing) => {
                debug!("Background worker already registered");
                existing
            }
            None => self
                .platform
                .register_worker(&self.worker.script_url, &self.worker.scope)
                .await
                .map_err(|e| match e {
                    Error::WorkerRegistrationFailed(_) => e,
                    other => Error::WorkerRegistrationFailed(other.to_string()),
                })?,
        };

        if self.state == LifecycleState::Unregistered {
            self.state = LifecycleState::WorkerRegistered;
        }
        Ok(registration)
    }

    /// Query permission, prompting at most once and only while undecided.
    #[instrument(skip(self))]
    pub async fn request_permission(&mut self) -> Result<PermissionState> {
        if self.permission_denied {
            return Ok(PermissionState::Denied);
        }

        let permission = match self.platform.permission_state().await {
            PermissionState::Default => self.platform.request_permission().await?,
            decided => decided,
        };

        match permission {
            PermissionState::Granted => {
                if matches!(
                    self.state,
                    LifecycleState::Unregistered | LifecycleState::WorkerRegistered
                ) {
                    self.state = LifecycleState::PermissionGranted;
                }
            }
            PermissionState::Denied => {
                info!("Notification permission denied; not prompting again this session");
                self.permission_denied = true;
            }
            PermissionState::Default => debug!("Permission prompt dismissed"),
        }
        Ok(permission)
    }

    /// Create a platform subscription and register it with the registry.
    ///
    /// Not retried on failure; the next lifecycle check tries again.
    #[instrument(skip(self))]
    pub async fn subscribe(&mut self) -> Result<PushSubscription> {
        self.ensure_ready().await?;
        if self.request_permission().await? != PermissionState::Granted {
            return Err(Error::PermissionDenied);
        }

        let encoded = self.registry.fetch_server_key().await?;
        let key = pushline_crypto::application_server_key(&encoded, self.key_policy)?;
        let subscription = self.platform.subscribe(SubscribeOptions::new(key)).await?;

        let id = self.registry.register_subscription(&subscription).await?;
        self.state = LifecycleState::Subscribed;
        self.last_validated_at = Some(Utc::now());
        info!(
            subscription_id = id,
            endpoint = endpoint_prefix(&subscription.endpoint),
            "Push subscription registered"
        );
        Ok(subscription)
    }

    /// Ask the platform for the current subscription. No side effects.
    pub async fn check_status(&self) -> Result<SubscriptionStatus> {
        if !self.platform.is_supported() {
            return Ok(SubscriptionStatus {
                subscribed: false,
                subscription: None,
            });
        }
        let subscription = self.platform.get_subscription().await?;
        Ok(SubscriptionStatus {
            subscribed: subscription.is_some(),
            subscription,
        })
    }

    /// Read-repair: create a missing subscription, rebuild an expired one.
    #[instrument(skip(self))]
    pub async fn ensure_subscription(&mut self) -> Result<EnsureOutcome> {
        if !self.platform.is_supported() {
            return Err(Error::Unsupported);
        }

        let Some(existing) = self.platform.get_subscription().await? else {
            return Ok(EnsureOutcome::Created(self.subscribe().await?));
        };

        match self.registry.validate_subscription(&existing.endpoint).await {
            Validation::Valid => {
                self.state = LifecycleState::Subscribed;
                self.last_validated_at = Some(Utc::now());
                Ok(EnsureOutcome::Valid(existing))
            }
            Validation::Unknown => {
                warn!(
                    endpoint = endpoint_prefix(&existing.endpoint),
                    "Could not validate subscription; leaving it in place"
                );
                Ok(EnsureOutcome::Unknown(existing))
            }
            Validation::Expired => {
                info!(
                    endpoint = endpoint_prefix(&existing.endpoint),
                    "Subscription expired; rebuilding"
                );
                Ok(EnsureOutcome::Renewed(self.rebuild().await?))
            }
        }
    }

    /// Remove the subscription from the platform, then from the registry.
    ///
    /// Returns `false` when there was nothing to remove; the registry is not
    /// contacted in that case. A platform-side failure leaves the registry
    /// record in place.
    #[instrument(skip(self))]
    pub async fn unsubscribe(&mut self) -> Result<bool> {
        let Some(subscription) = self.platform.get_subscription().await? else {
            debug!("No subscription to remove");
            return Ok(false);
        };

        if !self.platform.unsubscribe(&subscription).await? {
            warn!(
                endpoint = endpoint_prefix(&subscription.endpoint),
                "Platform refused to remove subscription; keeping registry record"
            );
            return Err(Error::Platform("unsubscribe was refused".into()));
        }

        self.registry.delete_subscription(&subscription).await?;
        self.state = LifecycleState::Unsubscribed;
        self.last_validated_at = None;
        info!(
            endpoint = endpoint_prefix(&subscription.endpoint),
            "Push subscription removed"
        );
        Ok(true)
    }

    /// React to a delivery result reported by the dispatch side.
    ///
    /// An expiry tears the subscription down and builds a new one; every
    /// other outcome leaves it alone.
    pub async fn handle_dispatch_outcome(
        &mut self,
        outcome: &DispatchOutcome,
    ) -> Result<Option<PushSubscription>> {
        if !outcome.is_expiry() {
            return Ok(None);
        }
        info!("Dispatch reported the endpoint gone; rebuilding subscription");
        self.rebuild().await.map(Some)
    }

    /// Full tear-down and rebuild, never an in-place key rotation.
    async fn rebuild(&mut self) -> Result<PushSubscription> {
        self.state = LifecycleState::Expired;
        self.unsubscribe().await?;
        self.subscribe().await
    }
}
