//! Socket.IO v5 over Engine.IO v4 text framing
//!
//! Only the WebSocket transport is supported, so every frame carries exactly
//! one packet. Binary events and binary acks are rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::error::ProtocolError;
use crate::protocol::{IncomingEvent, OutgoingEvent};

/// Engine.IO protocol revision spoken by this client
pub const ENGINE_IO_VERSION: u8 = 4;

const DEFAULT_NAMESPACE: &str = "/";

/// Handshake sent by the server in the open packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

/// Engine.IO packet
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(ProtocolError::EmptyPacket)?;
        let body = chars.as_str();

        match kind {
            '0' => Ok(EnginePacket::Open(serde_json::from_str(body)?)),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(body.to_string())),
            '3' => Ok(EnginePacket::Pong(body.to_string())),
            '4' => Ok(EnginePacket::Message(body.to_string())),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(ProtocolError::UnknownPacketType(other)),
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(match self {
            EnginePacket::Open(handshake) => format!("0{}", serde_json::to_string(handshake)?),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{}", data),
            EnginePacket::Pong(data) => format!("3{}", data),
            EnginePacket::Message(data) => format!("4{}", data),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        })
    }
}

/// Socket.IO packet carried inside an Engine.IO message
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect { namespace: String, data: Option<Value> },
    Disconnect { namespace: String },
    Event { namespace: String, id: Option<u64>, data: Vec<Value> },
    Ack { namespace: String, id: u64, data: Vec<Value> },
    ConnectError { namespace: String, data: Option<Value> },
}

impl SocketPacket {
    pub fn namespace(&self) -> &str {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::Ack { namespace, .. }
            | SocketPacket::ConnectError { namespace, .. } => namespace,
        }
    }

    pub fn decode(body: &str) -> Result<Self, ProtocolError> {
        let mut chars = body.chars();
        let kind = chars.next().ok_or(ProtocolError::EmptyPacket)?;
        if !('0'..='4').contains(&kind) {
            return Err(ProtocolError::UnknownSocketPacketType(kind));
        }
        let mut rest = chars.as_str();

        let namespace = if rest.starts_with('/') {
            match rest.find(',') {
                Some(comma) => {
                    let ns = &rest[..comma];
                    rest = &rest[comma + 1..];
                    ns.to_string()
                }
                None => {
                    let ns = rest;
                    rest = "";
                    ns.to_string()
                }
            }
        } else {
            DEFAULT_NAMESPACE.to_string()
        };

        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        let id = if digits > 0 {
            rest[..digits].parse::<u64>().ok()
        } else {
            None
        };
        rest = &rest[digits..];

        let data: Option<Value> = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str(rest)?)
        };

        match kind {
            '0' => Ok(SocketPacket::Connect { namespace, data }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => Ok(SocketPacket::Event {
                namespace,
                id,
                data: into_array(data)?,
            }),
            '3' => Ok(SocketPacket::Ack {
                namespace,
                id: id.ok_or(ProtocolError::MalformedEvent)?,
                data: into_array(data)?,
            }),
            _ => Ok(SocketPacket::ConnectError { namespace, data }),
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        let (kind, id, data) = match self {
            SocketPacket::Connect { data, .. } => ('0', None, data.clone()),
            SocketPacket::Disconnect { .. } => ('1', None, None),
            SocketPacket::Event { id, data, .. } => ('2', *id, Some(Value::Array(data.clone()))),
            SocketPacket::Ack { id, data, .. } => ('3', Some(*id), Some(Value::Array(data.clone()))),
            SocketPacket::ConnectError { data, .. } => ('4', None, data.clone()),
        };

        let mut out = String::new();
        out.push(kind);
        let namespace = self.namespace();
        if namespace != DEFAULT_NAMESPACE {
            out.push_str(namespace);
            out.push(',');
        }
        if let Some(id) = id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = data {
            out.push_str(&serde_json::to_string(&data)?);
        }
        Ok(out)
    }
}

fn into_array(data: Option<Value>) -> Result<Vec<Value>, ProtocolError> {
    match data {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(ProtocolError::MalformedEvent),
    }
}

/// What the transport should do after a frame has been processed
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Write this text frame to the socket
    Send(String),
    /// Namespace connection acknowledged by the server
    Connected { sid: Option<String> },
    /// Application event for the widget
    Event(IncomingEvent),
    /// Server closed the session or the namespace
    Disconnected,
    /// Server refused the namespace connection
    ConnectError(String),
}

/// Sans-IO Socket.IO client session for a single namespace
#[derive(Debug)]
pub struct SocketIoSession {
    namespace: String,
    handshake: Option<Handshake>,
    connected: bool,
}

impl SocketIoSession {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            handshake: None,
            connected: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn handshake(&self) -> Option<&Handshake> {
        self.handshake.as_ref()
    }

    /// How long the server may stay silent before the connection is dead
    pub fn liveness_timeout(&self) -> Option<Duration> {
        self.handshake
            .as_ref()
            .map(|h| Duration::from_millis(h.ping_interval + h.ping_timeout))
    }

    /// Process one inbound text frame
    pub fn handle_frame(&mut self, frame: &str) -> Result<Vec<SessionAction>, ProtocolError> {
        match EnginePacket::decode(frame)? {
            EnginePacket::Open(handshake) => {
                log::debug!("Engine.IO open, sid={}", handshake.sid);
                self.handshake = Some(handshake);
                let connect = SocketPacket::Connect {
                    namespace: self.namespace.clone(),
                    data: None,
                };
                Ok(vec![SessionAction::Send(
                    EnginePacket::Message(connect.encode()?).encode()?,
                )])
            }
            EnginePacket::Ping(data) => Ok(vec![SessionAction::Send(EnginePacket::Pong(data).encode()?)]),
            EnginePacket::Close => {
                self.connected = false;
                Ok(vec![SessionAction::Disconnected])
            }
            EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => Ok(Vec::new()),
            EnginePacket::Message(body) => self.handle_socket_packet(SocketPacket::decode(&body)?),
        }
    }

    fn handle_socket_packet(&mut self, packet: SocketPacket) -> Result<Vec<SessionAction>, ProtocolError> {
        if packet.namespace() != self.namespace {
            log::debug!("Ignoring packet for namespace {}", packet.namespace());
            return Ok(Vec::new());
        }

        match packet {
            SocketPacket::Connect { data, .. } => {
                self.connected = true;
                let sid = data
                    .as_ref()
                    .and_then(|d| d.get("sid"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Ok(vec![SessionAction::Connected { sid }])
            }
            SocketPacket::Disconnect { .. } => {
                self.connected = false;
                Ok(vec![SessionAction::Disconnected])
            }
            SocketPacket::ConnectError { data, .. } => {
                self.connected = false;
                let message = match data {
                    Some(Value::String(s)) => s,
                    Some(value) => value
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| value.to_string()),
                    None => "connection refused".to_string(),
                };
                Ok(vec![SessionAction::ConnectError(message)])
            }
            SocketPacket::Event { data, .. } => {
                let mut args = data.into_iter();
                let name = match args.next() {
                    Some(Value::String(name)) => name,
                    _ => return Err(ProtocolError::MalformedEvent),
                };
                let payload = args.next().unwrap_or(Value::Null);
                Ok(vec![SessionAction::Event(IncomingEvent::decode(&name, payload)?)])
            }
            SocketPacket::Ack { id, .. } => {
                log::debug!("Ignoring ack {}", id);
                Ok(Vec::new())
            }
        }
    }

    /// Encode an outgoing event as a complete text frame
    pub fn encode_event(&self, event: &OutgoingEvent) -> Result<String, ProtocolError> {
        let packet = SocketPacket::Event {
            namespace: self.namespace.clone(),
            id: None,
            data: event.to_args()?,
        };
        EnginePacket::Message(packet.encode()?).encode()
    }

    /// Frame that politely leaves the namespace
    pub fn disconnect_frame(&self) -> Result<String, ProtocolError> {
        let packet = SocketPacket::Disconnect {
            namespace: self.namespace.clone(),
        };
        EnginePacket::Message(packet.encode()?).encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SendMessagePayload;
    use crate::request::RequestId;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const OPEN: &str = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

    #[test]
    fn test_decode_open_handshake() {
        match EnginePacket::decode(OPEN).unwrap() {
            EnginePacket::Open(h) => {
                assert_eq!(h.sid, "abc");
                assert_eq!(h.ping_interval, 25000);
                assert_eq!(h.max_payload, Some(1_000_000));
            }
            other => panic!("unexpected packet: {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_unknown_and_empty() {
        assert_eq!(EnginePacket::decode(""), Err(ProtocolError::EmptyPacket));
        assert_eq!(EnginePacket::decode("9"), Err(ProtocolError::UnknownPacketType('9')));
        assert_eq!(
            SocketPacket::decode("51-[\"x\",{}]"),
            Err(ProtocolError::UnknownSocketPacketType('5'))
        );
    }

    #[test]
    fn test_socket_packet_with_namespace_and_ack_id() {
        let packet = SocketPacket::decode(r#"2/chat,12["hello",1]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                namespace: "/chat".to_string(),
                id: Some(12),
                data: vec![json!("hello"), json!(1)],
            }
        );
        assert_eq!(packet.encode().unwrap(), r#"2/chat,12["hello",1]"#);
    }

    #[test]
    fn test_connect_without_data() {
        assert_eq!(
            SocketPacket::decode("0").unwrap(),
            SocketPacket::Connect {
                namespace: "/".to_string(),
                data: None
            }
        );
        assert_eq!(
            SocketPacket::decode("0/admin").unwrap(),
            SocketPacket::Connect {
                namespace: "/admin".to_string(),
                data: None
            }
        );
    }

    #[test]
    fn test_session_handshake_and_connect() {
        let mut session = SocketIoSession::new("/");

        let actions = session.handle_frame(OPEN).unwrap();
        assert_eq!(actions, vec![SessionAction::Send("40".to_string())]);
        assert_eq!(session.liveness_timeout(), Some(Duration::from_millis(45000)));
        assert!(!session.is_connected());

        let actions = session.handle_frame(r#"40{"sid":"xyz"}"#).unwrap();
        assert_eq!(
            actions,
            vec![SessionAction::Connected {
                sid: Some("xyz".to_string())
            }]
        );
        assert!(session.is_connected());
    }

    #[test]
    fn test_session_connects_custom_namespace() {
        let mut session = SocketIoSession::new("/chat");
        let actions = session.handle_frame(OPEN).unwrap();
        assert_eq!(actions, vec![SessionAction::Send("40/chat,".to_string())]);

        // packets for other namespaces are dropped
        assert!(session.handle_frame("40").unwrap().is_empty());
        assert!(!session.is_connected());
    }

    #[test]
    fn test_session_answers_ping() {
        let mut session = SocketIoSession::new("/");
        assert_eq!(
            session.handle_frame("2").unwrap(),
            vec![SessionAction::Send("3".to_string())]
        );
        assert_eq!(
            session.handle_frame("2probe").unwrap(),
            vec![SessionAction::Send("3probe".to_string())]
        );
    }

    #[test]
    fn test_session_decodes_events() {
        let mut session = SocketIoSession::new("/");
        let actions = session
            .handle_frame(r#"42["receiveMessage",{"message":"hello","botReply":"hi"}]"#)
            .unwrap();

        match &actions[..] {
            [SessionAction::Event(IncomingEvent::MessageReceived(payload))] => {
                assert_eq!(payload.bot_reply, "hi");
            }
            other => panic!("unexpected actions: {:?}", other),
        }
    }

    #[test]
    fn test_session_reports_connect_error() {
        let mut session = SocketIoSession::new("/");
        let actions = session
            .handle_frame(r#"44{"message":"Not authorized"}"#)
            .unwrap();
        assert_eq!(
            actions,
            vec![SessionAction::ConnectError("Not authorized".to_string())]
        );
    }

    #[test]
    fn test_session_close_and_disconnect() {
        let mut session = SocketIoSession::new("/");
        session.handle_frame("40").unwrap();
        assert_eq!(session.handle_frame("41").unwrap(), vec![SessionAction::Disconnected]);
        assert!(!session.is_connected());

        session.handle_frame("40").unwrap();
        assert_eq!(session.handle_frame("1").unwrap(), vec![SessionAction::Disconnected]);
        assert!(!session.is_connected());
    }

    #[test]
    fn test_event_without_name_is_malformed() {
        let mut session = SocketIoSession::new("/");
        assert_eq!(
            session.handle_frame("42[1,2]"),
            Err(ProtocolError::MalformedEvent)
        );
        assert_eq!(
            session.handle_frame(r#"42{"a":1}"#),
            Err(ProtocolError::MalformedEvent)
        );
    }

    #[test]
    fn test_encode_outgoing_event() {
        let session = SocketIoSession::new("/");
        let id = RequestId::new();
        let frame = session
            .encode_event(&OutgoingEvent::SendMessage(SendMessagePayload {
                message: "hello".to_string(),
                user_id: 1,
                request_id: id,
            }))
            .unwrap();

        assert!(frame.starts_with(r#"42["sendMessage",{"#));
        let body: Value = serde_json::from_str(&frame[2..]).unwrap();
        assert_eq!(body[1]["message"], json!("hello"));
        assert_eq!(body[1]["requestId"], json!(id.to_string()));
        assert_eq!(session.disconnect_frame().unwrap(), "41");
    }
}
