//! Configuration resolution for Pushline.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/pushline/settings.json)
//! 3. Project config (.pushline/settings.json)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete Pushline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub keys: KeyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the subscription registry lives and how to talk to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub base_url: String,
    pub key_path: String,
    pub subscribe_path: String,
    pub unsubscribe_path: String,
    pub test_path: String,
    /// Bearer token for the registry, if it requires authentication.
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            key_path: "/api/notifications/vapid-key/".to_string(),
            subscribe_path: "/api/notifications/subscribe/".to_string(),
            unsubscribe_path: "/api/notifications/unsubscribe/".to_string(),
            test_path: "/api/notifications/test/".to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

/// Background worker registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub script_url: String,
    pub scope: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            script_url: "/sw.js".to_string(),
            scope: "/".to_string(),
        }
    }
}

/// Defaults applied when normalizing inbound push payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub default_title: String,
    pub default_body: String,
    /// Tag used when the payload carries none.
    pub default_tag: String,
    /// Tag of the single fallback presentation attempt.
    pub fallback_tag: String,
    /// Click target when the payload carries no URL.
    pub default_url: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub require_interaction: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_title: "New notification".to_string(),
            default_body: "You have a new notification".to_string(),
            default_tag: "notification".to_string(),
            fallback_tag: "notification-fallback".to_string(),
            default_url: "/".to_string(),
            icon: None,
            badge: None,
            require_interaction: false,
        }
    }
}

/// How strictly the application server key is checked before subscribing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPolicy {
    /// 64-byte keys get the `0x04` prefix; every other length passes through
    /// and the platform decides.
    #[default]
    Lenient,
    /// Only 65-byte uncompressed points on P-256 are accepted.
    Strict,
}

impl std::str::FromStr for KeyPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(Error::Config(format!("Unknown key policy: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub policy: KeyPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Load configuration with hierarchical resolution.
///
/// Files are layered key by key: a project file that only sets
/// `notification` leaves the global `registry` settings intact.
pub fn load_config(project_dir: Option<&Path>) -> Result<Config> {
    let mut layered = serde_json::to_value(Config::default())?;

    // Load global config
    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            merge_config(&mut layered, read_config_value(&global_path)?);
        }
    }

    // Load project config
    if let Some(dir) = project_dir {
        let project_path = dir.join(".pushline").join("settings.json");
        if project_path.exists() {
            merge_config(&mut layered, read_config_value(&project_path)?);
        }
    }

    let mut config: Config = serde_json::from_value(layered)
        .map_err(|e| Error::Config(format!("Invalid layered configuration: {e}")))?;

    // Apply environment overrides
    apply_env_overrides(&mut config);

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("pushline").join("settings.json"))
}

/// Parse one settings file on its own, missing keys taking their defaults.
pub fn load_config_file(path: &Path) -> Result<Config> {
    serde_json::from_value(read_config_value(path)?).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn read_config_value(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Overlay only the keys `overlay` actually sets; objects merge recursively.
pub fn merge_config(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_config(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(val) = std::env::var("PUSHLINE_BASE_URL") {
        config.registry.base_url = val;
    }
    if let Ok(val) = std::env::var("PUSHLINE_TOKEN") {
        config.registry.token = Some(val);
    }
    if let Ok(val) = std::env::var("PUSHLINE_TIMEOUT_SECS") {
        if let Ok(n) = val.parse() {
            config.registry.timeout_secs = n;
        }
    }
    if let Ok(val) = std::env::var("PUSHLINE_LOG_LEVEL") {
        config.logging.level = val;
    }
    if let Ok(val) = std::env::var("PUSHLINE_KEY_POLICY") {
        match val.parse() {
            Ok(policy) => config.keys.policy = policy,
            Err(e) => tracing::warn!(error = %e, "Ignoring PUSHLINE_KEY_POLICY"),
        }
    }
}
