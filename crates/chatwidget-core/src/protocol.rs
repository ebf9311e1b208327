use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::request::{RequestId, RequestKind};

/// Outgoing event: ask the backend for a chat reply
pub const SEND_MESSAGE: &str = "sendMessage";
/// Outgoing event: ask the backend to generate an image
pub const GENERATE_IMAGE: &str = "generateImage";
/// Incoming event: chat reply
pub const RECEIVE_MESSAGE: &str = "receiveMessage";
/// Incoming event: generated image URL
pub const IMAGE_GENERATED: &str = "imageGenerated";

/// User id type (numeric on the wire)
pub type UserId = u64;

/// Payload of `sendMessage`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub message: String,
    pub user_id: UserId,
    pub request_id: RequestId,
}

/// Payload of `generateImage`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImagePayload {
    pub prompt: String,
    pub user_id: UserId,
    pub request_id: RequestId,
}

/// Payload of `receiveMessage`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReceived {
    /// The user message the reply answers, as echoed by the backend
    #[serde(default)]
    pub message: String,
    pub bot_reply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Payload of `imageGenerated`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerated {
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// `Ok(None)` when the backend doesn't echo `requestId`. An echoed id that
/// isn't one of ours is an error, never a missing id.
fn parse_request_id(raw: &Option<String>) -> Result<Option<RequestId>, ProtocolError> {
    match raw.as_deref() {
        None => Ok(None),
        Some(raw) => RequestId::parse(raw)
            .map(Some)
            .ok_or_else(|| ProtocolError::InvalidRequestId(raw.to_string())),
    }
}

impl MessageReceived {
    pub fn request_id(&self) -> Result<Option<RequestId>, ProtocolError> {
        parse_request_id(&self.request_id)
    }
}

impl ImageGenerated {
    pub fn request_id(&self) -> Result<Option<RequestId>, ProtocolError> {
        parse_request_id(&self.request_id)
    }
}

/// Events sent from the widget to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingEvent {
    SendMessage(SendMessagePayload),
    GenerateImage(GenerateImagePayload),
}

impl OutgoingEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutgoingEvent::SendMessage(_) => SEND_MESSAGE,
            OutgoingEvent::GenerateImage(_) => GENERATE_IMAGE,
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            OutgoingEvent::SendMessage(_) => RequestKind::Chat,
            OutgoingEvent::GenerateImage(_) => RequestKind::Image,
        }
    }

    pub fn request_id(&self) -> RequestId {
        match self {
            OutgoingEvent::SendMessage(p) => p.request_id,
            OutgoingEvent::GenerateImage(p) => p.request_id,
        }
    }

    /// Event arguments in socket.io order: `[name, payload]`
    pub fn to_args(&self) -> Result<Vec<Value>, serde_json::Error> {
        let payload = match self {
            OutgoingEvent::SendMessage(p) => serde_json::to_value(p)?,
            OutgoingEvent::GenerateImage(p) => serde_json::to_value(p)?,
        };
        Ok(vec![Value::String(self.name().to_string()), payload])
    }
}

/// Events received from the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingEvent {
    MessageReceived(MessageReceived),
    ImageGenerated(ImageGenerated),
}

impl IncomingEvent {
    /// Decode a named event; only the first payload argument is used
    pub fn decode(name: &str, payload: Value) -> Result<Self, ProtocolError> {
        match name {
            RECEIVE_MESSAGE => Ok(IncomingEvent::MessageReceived(serde_json::from_value(payload)?)),
            IMAGE_GENERATED => Ok(IncomingEvent::ImageGenerated(serde_json::from_value(payload)?)),
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IncomingEvent::MessageReceived(_) => RECEIVE_MESSAGE,
            IncomingEvent::ImageGenerated(_) => IMAGE_GENERATED,
        }
    }
}
