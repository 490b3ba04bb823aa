//! Configuration for the Eldoria conversation system.
//!
//! Maps directly to `eldoria.toml`. Every field has a default, so an empty
//! file is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EldoriaConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Conversation session tuning.
    #[serde(default)]
    pub session: SessionConfig,
    /// Inbound stream decoding limits.
    #[serde(default)]
    pub stream: StreamConfig,
    /// Remote dialogue endpoint.
    #[serde(default)]
    pub endpoint: EndpointConfig,
    /// In-process Ollama relay.
    #[serde(default)]
    pub relay: RelayConfig,
}

impl EldoriaConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `EldoriaError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::EldoriaError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Conversation session tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long `begin()` is refused after a hostile verdict (milliseconds).
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Distance (world units) beyond which an active conversation ends.
    #[serde(default = "default_conversation_distance")]
    pub conversation_distance: f32,
    /// Denominator of the hostility tally shown to the player.
    #[serde(default = "default_hostility_cap")]
    pub hostility_cap: usize,
    /// Message sent on the opening turn of a conversation.
    #[serde(default = "default_opening_message")]
    pub opening_message: String,
}

impl SessionConfig {
    /// Cooldown window as a `Duration`.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            conversation_distance: default_conversation_distance(),
            hostility_cap: default_hostility_cap(),
            opening_message: default_opening_message(),
        }
    }
}

/// Inbound stream decoding limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Largest unterminated record the line buffer will hold before failing
    /// the turn.
    #[serde(default = "default_max_partial_bytes")]
    pub max_partial_bytes: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_partial_bytes: default_max_partial_bytes(),
        }
    }
}

/// Remote dialogue endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the dialogue server.
    #[serde(default = "default_endpoint_url")]
    pub base_url: String,
    /// Path of the conversation route.
    #[serde(default = "default_endpoint_path")]
    pub path: String,
    /// Hard timeout for a whole turn, including streaming (milliseconds).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl EndpointConfig {
    /// Full URL of the conversation route.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_endpoint_url(),
            path: default_endpoint_path(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// In-process relay to a local Ollama instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Base URL of the Ollama API.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    /// Chat model name.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_model(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde requires named functions)
// ---------------------------------------------------------------------------

fn default_log_level() -> String {
    "info".to_string()
}
fn default_cooldown_ms() -> u64 {
    2000
}
fn default_conversation_distance() -> f32 {
    100.0
}
fn default_hostility_cap() -> usize {
    10
}
fn default_opening_message() -> String {
    "hello".to_string()
}
fn default_max_partial_bytes() -> usize {
    64 * 1024
}
fn default_endpoint_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_endpoint_path() -> String {
    "/conversation".to_string()
}
fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "llama3".to_string()
}
