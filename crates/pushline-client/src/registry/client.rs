//! Subscription registry REST client.
//!
//! Uses reqwest to call the registry's key, subscribe, unsubscribe and test
//! endpoints.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use pushline_core::config::RegistryConfig;
use pushline_core::tracing_init::endpoint_prefix;
use pushline_core::types::{
    ErrorResponse, ListResponse, MessageResponse, PushSubscription, ServerKeyResponse,
    SubscribeResponse, SubscriptionEnvelope, SubscriptionRecord, TestPushRequest,
    TestPushResponse, Validation,
};
use pushline_core::{Error, Result};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::lifecycle::SubscriptionRegistry;

/// Upper bound on pages fetched for one listing.
const MAX_PAGES: usize = 50;

fn transport(e: reqwest::Error) -> Error {
    Error::Request(e.to_string())
}

/// HTTP client for the subscription registry.
#[derive(Debug)]
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
    key_path: String,
    subscribe_path: String,
    unsubscribe_path: String,
    test_path: String,
}

impl RegistryClient {
    /// Create a new registry client.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(Error::Config("registry base_url is empty".into()));
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| Error::Config("Invalid token format".into()))?;
            headers.insert(AUTHORIZATION, value);
        }

        // reqwest is built with rustls-no-provider; Err means a provider is
        // already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(transport)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key_path: normalize_path(&config.key_path),
            subscribe_path: normalize_path(&config.subscribe_path),
            unsubscribe_path: normalize_path(&config.unsubscribe_path),
            test_path: normalize_path(&config.test_path),
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success response onto the error taxonomy.
    ///
    /// `endpoint` names the subscription concerned, for 410 responses.
    async fn check_status(
        resp: reqwest::Response,
        endpoint: Option<&str>,
    ) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::GONE {
            return Err(Error::SubscriptionExpired {
                endpoint: endpoint.unwrap_or_else(|| resp.url().as_str()).to_string(),
            });
        }

        let fallback = status.canonical_reason().unwrap_or("Unknown").to_string();
        let message = resp
            .json::<ErrorResponse>()
            .await
            .map_or(fallback, |body| body.error);
        Err(Error::Registry {
            status: status.as_u16(),
            message,
        })
    }

    /// List the subscriptions the registry holds for the current owner.
    ///
    /// Follows `next` links until the listing is exhausted.
    pub async fn list_subscriptions(&self) -> Result<Vec<SubscriptionRecord>> {
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(self.url(&self.subscribe_path));

        while let Some(url) = next.take() {
            if !seen.insert(url.clone()) {
                warn!(url = %url, "Registry pagination loops; stopping");
                break;
            }
            if seen.len() > MAX_PAGES {
                warn!(pages = MAX_PAGES, "Registry listing exceeds page limit; truncating");
                break;
            }
            let resp = self.http.get(&url).send().await.map_err(transport)?;
            let resp = Self::check_status(resp, None).await?;
            let listing: ListResponse<SubscriptionRecord> =
                resp.json().await.map_err(transport)?;
            let (page, link) = listing.into_parts();
            records.extend(page);
            next = link.map(|link| self.resolve_link(&link));
        }

        debug!(count = records.len(), "Listed registry subscriptions");
        Ok(records)
    }

    /// Resolve a pagination link, which may be absolute or base-relative.
    fn resolve_link(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            self.url(&normalize_path(link))
        }
    }

    /// Ask the registry to push a test notification to every subscription.
    pub async fn send_test(&self, title: &str, body: &str) -> Result<TestPushResponse> {
        let request = TestPushRequest {
            title: title.to_string(),
            body: body.to_string(),
        };
        let resp = self
            .http
            .post(self.url(&self.test_path))
            .json(&request)
            .send()
            .await
            .map_err(transport)?;
        let resp = Self::check_status(resp, None).await?;
        resp.json().await.map_err(transport)
    }
}

#[async_trait]
impl SubscriptionRegistry for RegistryClient {
    async fn fetch_server_key(&self) -> Result<String> {
        let resp = self
            .http
            .get(self.url(&self.key_path))
            .send()
            .await
            .map_err(transport)?;
        let resp = Self::check_status(resp, None).await?;
        let body: ServerKeyResponse = resp.json().await.map_err(transport)?;
        Ok(body.public_key)
    }

    async fn register_subscription(&self, subscription: &PushSubscription) -> Result<u64> {
        let envelope = SubscriptionEnvelope {
            subscription: subscription.clone(),
        };
        let resp = self
            .http
            .post(self.url(&self.subscribe_path))
            .json(&envelope)
            .send()
            .await
            .map_err(transport)?;
        let resp = Self::check_status(resp, Some(&subscription.endpoint)).await?;
        let body: SubscribeResponse = resp.json().await.map_err(transport)?;
        debug!(
            subscription_id = body.subscription_id,
            message = %body.message,
            "Registry accepted subscription"
        );
        Ok(body.subscription_id)
    }

    async fn delete_subscription(&self, subscription: &PushSubscription) -> Result<()> {
        let envelope = SubscriptionEnvelope {
            subscription: subscription.clone(),
        };
        let resp = self
            .http
            .post(self.url(&self.unsubscribe_path))
            .json(&envelope)
            .send()
            .await
            .map_err(transport)?;
        if resp.status() == StatusCode::NOT_FOUND {
            debug!(
                endpoint = endpoint_prefix(&subscription.endpoint),
                "Registry had no record; treating as deleted"
            );
            return Ok(());
        }
        let resp = Self::check_status(resp, Some(&subscription.endpoint)).await?;
        let body: MessageResponse = resp.json().await.map_err(transport)?;
        debug!(message = %body.message, "Registry removed subscription");
        Ok(())
    }

    async fn validate_subscription(&self, endpoint: &str) -> Validation {
        match self.list_subscriptions().await {
            Ok(records) if records.iter().any(|r| r.endpoint == endpoint) => Validation::Valid,
            Ok(_) => Validation::Expired,
            Err(e) => {
                warn!(error = %e, "Subscription validation failed");
                Validation::Unknown
            }
        }
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
