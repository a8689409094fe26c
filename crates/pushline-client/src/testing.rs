//! In-memory platform and registry doubles.

use std::sync::Mutex;

use async_trait::async_trait;
use pushline_core::types::{PushSubscription, Validation};
use pushline_core::{Error, Result};
use pushline_crypto::{UNCOMPRESSED_POINT_LEN, encode_url_safe};

use crate::lifecycle::{
    PermissionState, PushPlatform, SubscribeOptions, SubscriptionRegistry, WorkerRegistration,
};

fn locked<S, T>(state: &Mutex<S>, f: impl FnOnce(&mut S) -> T) -> T {
    let mut guard = state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    f(&mut guard)
}

#[derive(Debug)]
struct PlatformState {
    supported: bool,
    registration: Option<WorkerRegistration>,
    fail_registration: bool,
    register_calls: usize,
    permission: PermissionState,
    prompt_answer: PermissionState,
    prompts: usize,
    subscription: Option<PushSubscription>,
    subscribe_calls: Vec<SubscribeOptions>,
    refuse_unsubscribe: bool,
    issued: u32,
}

impl Default for PlatformState {
    fn default() -> Self {
        Self {
            supported: true,
            registration: None,
            fail_registration: false,
            register_calls: 0,
            permission: PermissionState::Default,
            prompt_answer: PermissionState::Granted,
            prompts: 0,
            subscription: None,
            subscribe_calls: Vec::new(),
            refuse_unsubscribe: false,
            issued: 0,
        }
    }
}

/// Platform push subsystem double.
///
/// Rejects application server keys that are not 65-byte uncompressed
/// points, like the real subsystem does.
#[derive(Debug, Default)]
pub struct MemoryPlatform {
    state: Mutex<PlatformState>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unsupported() -> Self {
        let platform = Self::default();
        locked(&platform.state, |s| s.supported = false);
        platform
    }

    /// Answer the next prompts with `answer`.
    pub fn answer_prompts_with(&self, answer: PermissionState) {
        locked(&self.state, |s| s.prompt_answer = answer);
    }

    pub fn set_permission(&self, permission: PermissionState) {
        locked(&self.state, |s| s.permission = permission);
    }

    pub fn fail_registration(&self) {
        locked(&self.state, |s| s.fail_registration = true);
    }

    pub fn refuse_unsubscribe(&self) {
        locked(&self.state, |s| s.refuse_unsubscribe = true);
    }

    /// Pretend a subscription already exists, e.g. from an earlier session.
    pub fn install_subscription(&self, subscription: PushSubscription) {
        locked(&self.state, |s| s.subscription = Some(subscription));
    }

    pub fn current(&self) -> Option<PushSubscription> {
        locked(&self.state, |s| s.subscription.clone())
    }

    pub fn prompts(&self) -> usize {
        locked(&self.state, |s| s.prompts)
    }

    pub fn register_calls(&self) -> usize {
        locked(&self.state, |s| s.register_calls)
    }

    pub fn subscribe_calls(&self) -> Vec<SubscribeOptions> {
        locked(&self.state, |s| s.subscribe_calls.clone())
    }
}

#[async_trait]
impl PushPlatform for MemoryPlatform {
    fn is_supported(&self) -> bool {
        locked(&self.state, |s| s.supported)
    }

    async fn worker_registration(&self, scope: &str) -> Result<Option<WorkerRegistration>> {
        Ok(locked(&self.state, |s| {
            s.registration.clone().filter(|r| r.scope == scope)
        }))
    }

    async fn register_worker(&self, script_url: &str, scope: &str) -> Result<WorkerRegistration> {
        locked(&self.state, |s| {
            s.register_calls += 1;
            if s.fail_registration {
                return Err(Error::WorkerRegistrationFailed(format!(
                    "script {script_url} could not be installed"
                )));
            }
            let registration = WorkerRegistration {
                script_url: script_url.to_string(),
                scope: scope.to_string(),
            };
            s.registration = Some(registration.clone());
            Ok(registration)
        })
    }

    async fn permission_state(&self) -> PermissionState {
        locked(&self.state, |s| s.permission)
    }

    async fn request_permission(&self) -> Result<PermissionState> {
        Ok(locked(&self.state, |s| {
            s.prompts += 1;
            s.permission = s.prompt_answer;
            s.permission
        }))
    }

    async fn get_subscription(&self) -> Result<Option<PushSubscription>> {
        Ok(self.current())
    }

    async fn subscribe(&self, options: SubscribeOptions) -> Result<PushSubscription> {
        locked(&self.state, |s| {
            s.subscribe_calls.push(options.clone());
            let key = &options.application_server_key;
            if !key.is_uncompressed_point() {
                return Err(Error::KeyTransformRejected(format!(
                    "expected {UNCOMPRESSED_POINT_LEN}-byte point, got {} bytes",
                    key.len()
                )));
            }
            if let Some(existing) = &s.subscription {
                return Ok(existing.clone());
            }
            s.issued += 1;
            let n = s.issued;
            let subscription = PushSubscription::new(
                format!("https://push.example/send/{n}"),
                encode_url_safe(&[0x04; UNCOMPRESSED_POINT_LEN]),
                encode_url_safe(&n.to_be_bytes().repeat(4)),
            );
            s.subscription = Some(subscription.clone());
            Ok(subscription)
        })
    }

    async fn unsubscribe(&self, subscription: &PushSubscription) -> Result<bool> {
        Ok(locked(&self.state, |s| {
            let matches = s
                .subscription
                .as_ref()
                .is_some_and(|current| current.endpoint == subscription.endpoint);
            if !matches || s.refuse_unsubscribe {
                return false;
            }
            s.subscription = None;
            true
        }))
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    server_key: String,
    records: Vec<(u64, PushSubscription)>,
    next_id: u64,
    unreachable: bool,
    fetch_calls: usize,
    register_calls: usize,
    delete_calls: usize,
    validate_calls: usize,
}

/// Subscription registry double keyed by endpoint.
#[derive(Debug)]
pub struct MemoryRegistry {
    state: Mutex<RegistryState>,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        let mut point = vec![0x04];
        point.extend(1..=64u8);
        Self::with_server_key(encode_url_safe(&point))
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server_key(server_key: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                server_key: server_key.into(),
                ..RegistryState::default()
            }),
        }
    }

    /// Make every call behave as if the network were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        locked(&self.state, |s| s.unreachable = unreachable);
    }

    /// Drop a record, as the dispatch side does after a 410.
    pub fn forget(&self, endpoint: &str) {
        locked(&self.state, |s| s.records.retain(|(_, r)| r.endpoint != endpoint));
    }

    pub fn endpoints(&self) -> Vec<String> {
        locked(&self.state, |s| {
            s.records.iter().map(|(_, r)| r.endpoint.clone()).collect()
        })
    }

    pub fn fetch_calls(&self) -> usize {
        locked(&self.state, |s| s.fetch_calls)
    }

    pub fn register_calls(&self) -> usize {
        locked(&self.state, |s| s.register_calls)
    }

    pub fn delete_calls(&self) -> usize {
        locked(&self.state, |s| s.delete_calls)
    }

    pub fn validate_calls(&self) -> usize {
        locked(&self.state, |s| s.validate_calls)
    }

    pub fn total_calls(&self) -> usize {
        locked(&self.state, |s| {
            s.fetch_calls + s.register_calls + s.delete_calls + s.validate_calls
        })
    }
}

fn unreachable_error() -> Error {
    Error::Request("registry unreachable".into())
}

#[async_trait]
impl SubscriptionRegistry for MemoryRegistry {
    async fn fetch_server_key(&self) -> Result<String> {
        locked(&self.state, |s| {
            s.fetch_calls += 1;
            if s.unreachable {
                return Err(unreachable_error());
            }
            Ok(s.server_key.clone())
        })
    }

    async fn register_subscription(&self, subscription: &PushSubscription) -> Result<u64> {
        locked(&self.state, |s| {
            s.register_calls += 1;
            if s.unreachable {
                return Err(unreachable_error());
            }
            // Upsert by endpoint.
            if let Some((id, record)) = s
                .records
                .iter_mut()
                .find(|(_, r)| r.endpoint == subscription.endpoint)
            {
                *record = subscription.clone();
                return Ok(*id);
            }
            s.next_id += 1;
            let id = s.next_id;
            s.records.push((id, subscription.clone()));
            Ok(id)
        })
    }

    async fn delete_subscription(&self, subscription: &PushSubscription) -> Result<()> {
        locked(&self.state, |s| {
            s.delete_calls += 1;
            if s.unreachable {
                return Err(unreachable_error());
            }
            s.records.retain(|(_, r)| r.endpoint != subscription.endpoint);
            Ok(())
        })
    }

    async fn validate_subscription(&self, endpoint: &str) -> Validation {
        locked(&self.state, |s| {
            s.validate_calls += 1;
            if s.unreachable {
                Validation::Unknown
            } else if s.records.iter().any(|(_, r)| r.endpoint == endpoint) {
                Validation::Valid
            } else {
                Validation::Expired
            }
        })
    }
}
