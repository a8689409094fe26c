//! Operator subcommands against the subscription registry.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Read, Write};

use anyhow::Context;
use clap::Subcommand;
use pushline_core::Config;
use pushline_core::config::NotificationConfig;
use pushline_core::tracing_init::endpoint_prefix;
use pushline_core::types::PushSubscription;
use pushline_worker::{NotificationDescriptor, RawPushEvent};

use crate::lifecycle::SubscriptionRegistry;
use crate::registry::RegistryClient;

/// Registry subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the application server key and show its normalized form
    Key,
    /// List registered subscriptions
    List,
    /// Delete the registry record for an endpoint
    Unsubscribe {
        /// Full endpoint URL
        endpoint: String,
    },
    /// Send a test notification to every registered subscription
    Test {
        #[arg(long, default_value = "Test notification")]
        title: String,
        #[arg(long, default_value = "This is a test notification")]
        body: String,
    },
    /// Decode a push payload the way the background worker does
    Decode {
        /// Payload file, or `-` for stdin
        input: String,
    },
}

/// Execute a subcommand.
pub async fn run(command: Command, config: &Config) -> anyhow::Result<()> {
    let mut out = io::stdout();
    match command {
        Command::Key => {
            let client = RegistryClient::new(&config.registry)?;
            let encoded = client.fetch_server_key().await?;
            let key = pushline_crypto::application_server_key(&encoded, config.keys.policy)
                .map_err(pushline_core::Error::from)?;
            writeln!(out, "public_key:  {encoded}")?;
            writeln!(out, "length:      {} bytes", key.len())?;
            writeln!(
                out,
                "normalized:  {}",
                pushline_crypto::encode_url_safe(key.as_bytes())
            )?;
            writeln!(
                out,
                "point:       {}",
                if key.is_uncompressed_point() {
                    "uncompressed P-256"
                } else {
                    "unexpected format"
                }
            )?;
        }
        Command::List => {
            let client = RegistryClient::new(&config.registry)?;
            let records = client.list_subscriptions().await?;
            if records.is_empty() {
                writeln!(out, "No subscriptions registered.")?;
                return Ok(());
            }
            writeln!(out, "{:<6} {:<20} ENDPOINT", "ID", "CREATED")?;
            for record in &records {
                writeln!(
                    out,
                    "{:<6} {:<20} {}",
                    record.id,
                    record.created_at.format("%Y-%m-%d %H:%M:%S"),
                    endpoint_prefix(&record.endpoint)
                )?;
            }
        }
        Command::Unsubscribe { endpoint } => {
            let client = RegistryClient::new(&config.registry)?;
            let records = client.list_subscriptions().await?;
            let Some(record) = records.into_iter().find(|r| r.endpoint == endpoint) else {
                writeln!(out, "No subscription registered for that endpoint.")?;
                return Ok(());
            };
            let subscription = PushSubscription {
                endpoint: record.endpoint,
                expiration_time: None,
                keys: record.keys,
            };
            client.delete_subscription(&subscription).await?;
            writeln!(out, "Removed subscription {}.", record.id)?;
        }
        Command::Test { title, body } => {
            let client = RegistryClient::new(&config.registry)?;
            let report = client.send_test(&title, &body).await?;
            writeln!(out, "{}", report.message)?;
            writeln!(
                out,
                "delivered: {}  failed: {}",
                report.success_count, report.failed_count
            )?;
            if let Some(remaining) = report.remaining_subscriptions {
                writeln!(out, "remaining subscriptions: {remaining}")?;
            }
        }
        Command::Decode { input } => {
            let payload = read_payload(&input)?;
            let descriptor = describe(payload, &config.notification);
            writeln!(out, "{}", serde_json::to_string_pretty(&descriptor)?)?;
        }
    }
    Ok(())
}

/// Read a payload from a file, or stdin for `-`.
pub fn read_payload(input: &str) -> anyhow::Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read(input).with_context(|| format!("Failed to read payload file {input}"))
}

/// Normalize raw payload bytes as if they arrived in a push event.
pub fn describe(payload: Vec<u8>, config: &NotificationConfig) -> NotificationDescriptor {
    let event = if payload.is_empty() {
        RawPushEvent::empty()
    } else {
        RawPushEvent::json(payload)
    };
    pushline_worker::processor::normalize(&event, config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn describe_structured_payload() {
        let d = describe(
            br#"{"title":"T","body":"B","url":"/x"}"#.to_vec(),
            &NotificationConfig::default(),
        );
        assert_eq!(d.title, "T");
        assert_eq!(d.url(), Some("/x"));
    }

    #[test]
    fn describe_empty_payload_uses_defaults() {
        let config = NotificationConfig::default();
        assert_eq!(
            describe(Vec::new(), &config),
            NotificationDescriptor::defaults(&config)
        );
    }

    #[test]
    fn read_payload_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.json");
        std::fs::write(&path, "plain text").unwrap();

        let bytes = read_payload(path.to_str().unwrap()).unwrap();
        let d = describe(bytes, &NotificationConfig::default());
        assert_eq!(d.body, "plain text");
    }

    #[test]
    fn read_payload_missing_file_errors() {
        let err = read_payload("/nonexistent/pushline/payload.json").unwrap_err();
        assert!(err.to_string().contains("payload.json"));
    }
}
