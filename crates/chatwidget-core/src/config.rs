use serde::{Deserialize, Serialize};

use crate::connection::BackoffPolicy;
use crate::engine_io::ENGINE_IO_VERSION;
use crate::error::ConfigError;
use crate::protocol::UserId;

/// Backend origin used when none is configured
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_namespace() -> String {
    "/".to_string()
}

fn default_user_id() -> UserId {
    1
}

/// Speech output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub rate: f32,
    pub pitch: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

/// Widget configuration, passed in at construction time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Backend origin, e.g. `http://192.168.1.230:5000`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_user_id")]
    pub user_id: UserId,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub reconnect: BackoffPolicy,
    /// Render replies as markdown instead of plain text
    #[serde(default)]
    pub markdown: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            namespace: default_namespace(),
            user_id: default_user_id(),
            speech: SpeechConfig::default(),
            reconnect: BackoffPolicy::default(),
            markdown: false,
        }
    }
}

impl WidgetConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        split_scheme(&self.endpoint)?;
        if !self.namespace.starts_with('/') {
            return Err(ConfigError::InvalidNamespace(self.namespace.clone()));
        }
        if !(0.1..=10.0).contains(&self.speech.rate) {
            return Err(ConfigError::InvalidRate(self.speech.rate));
        }
        if !(0.0..=2.0).contains(&self.speech.pitch) {
            return Err(ConfigError::InvalidPitch(self.speech.pitch));
        }
        if self.reconnect.base_delay_ms == 0 || self.reconnect.base_delay_ms > self.reconnect.max_delay_ms {
            return Err(ConfigError::InvalidBackoff);
        }
        Ok(())
    }

    /// WebSocket URL of the socket.io endpoint
    pub fn socket_url(&self) -> Result<String, ConfigError> {
        let (secure, rest) = split_scheme(&self.endpoint)?;
        let scheme = if secure { "wss" } else { "ws" };
        let host = rest.trim_end_matches('/');
        Ok(format!(
            "{}://{}/socket.io/?EIO={}&transport=websocket",
            scheme, host, ENGINE_IO_VERSION
        ))
    }
}

/// Returns (is_secure, remainder after `://`)
fn split_scheme(endpoint: &str) -> Result<(bool, &str), ConfigError> {
    let invalid = || ConfigError::InvalidEndpoint(endpoint.to_string());
    let (scheme, rest) = endpoint.split_once("://").ok_or_else(invalid)?;
    let secure = match scheme {
        "http" | "ws" => false,
        "https" | "wss" => true,
        _ => return Err(invalid()),
    };
    if rest.trim_end_matches('/').is_empty() {
        return Err(invalid());
    }
    Ok((secure, rest))
}
