//! Core state model for the chatwidget socket chat client
//!
//! This crate has no browser dependencies. It holds the widget state, request
//! correlation, the socket.io wire codec, the reconnect state machine, the
//! speech announcer and configuration. `chatwidget-wasm` binds it to the DOM.

pub mod config;
pub mod connection;
pub mod engine_io;
pub mod error;
pub mod protocol;
pub mod request;
pub mod speech;
pub mod widget;

pub use config::{SpeechConfig, WidgetConfig};
pub use connection::{BackoffPolicy, Connection, ConnectionState, Retry};
pub use engine_io::{SessionAction, SocketIoSession};
pub use error::{ConfigError, ProtocolError, SpeechError, TransportError, WidgetError};
pub use protocol::{IncomingEvent, OutgoingEvent};
pub use request::{PendingRequests, RequestId, RequestKind};
pub use speech::{Announcement, Notifier, SpeechAnnouncer, SpeechEngine, Utterance};
pub use widget::{ChatMessage, ChatWidget, EventEmitter};
