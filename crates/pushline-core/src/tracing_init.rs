//! Shared tracing/logging initialization.
//!
//! The `pushline` binary and embedding hosts use the same pattern for
//! setting up `tracing_subscriber` with an env-filter and optional JSON
//! output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise the global tracing subscriber.
///
/// * `default_filter` -- default `RUST_LOG` value when the env-var is not set
///   (e.g. `"pushline=info"`).
/// * `log_json` -- when `true`, emit structured JSON log lines instead of the
///   human-readable format.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_tracing(default_filter: &str, log_json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
    );
    if log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Shorten a push endpoint for log output.
///
/// Endpoints are capability URLs; only the origin and a short path prefix
/// are logged.
pub fn endpoint_prefix(endpoint: &str) -> &str {
    const MAX: usize = 48;
    if endpoint.len() <= MAX {
        return endpoint;
    }
    let mut end = MAX;
    while !endpoint.is_char_boundary(end) {
        end -= 1;
    }
    &endpoint[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_endpoint_unchanged() {
        assert_eq!(endpoint_prefix("https://push.example/a"), "https://push.example/a");
    }

    #[test]
    fn long_endpoint_truncated() {
        let endpoint = format!("https://fcm.googleapis.com/fcm/send/{}", "x".repeat(100));
        let prefix = endpoint_prefix(&endpoint);
        assert_eq!(prefix.len(), 48);
        assert!(endpoint.starts_with(prefix));
    }
}
