use thiserror::Error;

use crate::request::RequestKind;

/// Errors returned by widget operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WidgetError {
    #[error("input is empty")]
    EmptyInput,

    #[error("a {0} request is already in flight")]
    RequestPending(RequestKind),

    #[error("widget has been unmounted")]
    Unmounted,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Failure handing an event to the socket writer
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("socket writer is closed")]
    Closed,

    #[error("failed to serialize event: {0}")]
    Serialize(String),
}

/// Errors decoding socket frames or event payloads
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty packet")]
    EmptyPacket,

    #[error("unknown engine.io packet type '{0}'")]
    UnknownPacketType(char),

    #[error("unknown socket.io packet type '{0}'")]
    UnknownSocketPacketType(char),

    #[error("event packet is not a [name, ...args] array")]
    MalformedEvent,

    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("requestId '{0}' is not a valid request id")]
    InvalidRequestId(String),

    #[error("invalid JSON: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::Json(err.to_string())
    }
}

/// Invalid widget configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("endpoint '{0}' must start with http://, https://, ws:// or wss://")]
    InvalidEndpoint(String),

    #[error("namespace '{0}' must start with '/'")]
    InvalidNamespace(String),

    #[error("speech rate {0} is outside 0.1..=10")]
    InvalidRate(f32),

    #[error("speech pitch {0} is outside 0..=2")]
    InvalidPitch(f32),

    #[error("reconnect base delay must be non-zero and not exceed max delay")]
    InvalidBackoff,

    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors raised by a speech engine
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech synthesis is unavailable")]
    Unavailable,

    #[error("speech engine failed: {0}")]
    Engine(String),
}
