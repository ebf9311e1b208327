use futures::channel::mpsc::UnboundedReceiver;
use futures::channel::oneshot;
use futures::future::{Fuse, FutureExt};
use futures::stream::{Fuse as FuseStream, SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use gloo_net::websocket::{futures::WebSocket, Message as WsMessage, WebSocketError};
use gloo_timers::future::TimeoutFuture;
use std::time::Duration;
use wasm_bindgen::JsValue;

use chatwidget_core::{OutgoingEvent, SessionAction, SocketIoSession};

use crate::utils::timer_millis;

/// Used until the server's handshake tells us its ping schedule
const DEFAULT_LIVENESS: Duration = Duration::from_secs(45);

/// How a connection ended without an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Closed {
    /// The server disconnected us from the namespace
    ByServer,
    /// The server refused the namespace connection
    Refused(String),
    /// The widget was torn down
    Shutdown,
}

enum Step {
    Frame(Option<Result<WsMessage, WebSocketError>>),
    Outgoing(Option<OutgoingEvent>),
    Shutdown,
    Timeout,
}

impl Step {
    /// Anything the server sent counts as a sign of life
    fn is_inbound(&self) -> bool {
        matches!(self, Step::Frame(_))
    }
}

/// A socket.io connection over a browser WebSocket
pub struct SocketIoConnection {
    sink: SplitSink<WebSocket, WsMessage>,
    stream: FuseStream<SplitStream<WebSocket>>,
    session: SocketIoSession,
}

impl SocketIoConnection {
    pub fn open(url: &str, namespace: &str) -> Result<Self, JsValue> {
        log::info!("Connecting to WebSocket: {}", url);
        let ws = WebSocket::open(url)
            .map_err(|e| JsValue::from_str(&format!("Failed to connect: {:?}", e)))?;
        let (sink, stream) = ws.split();

        Ok(Self {
            sink,
            stream: stream.fuse(),
            session: SocketIoSession::new(namespace),
        })
    }

    fn liveness_timer(&self) -> Fuse<TimeoutFuture> {
        let liveness = self.session.liveness_timeout().unwrap_or(DEFAULT_LIVENESS);
        TimeoutFuture::new(timer_millis(liveness)).fuse()
    }

    async fn send_text(&mut self, text: String) -> Result<(), JsValue> {
        log::debug!("Sending frame: {}", text);
        self.sink
            .send(WsMessage::Text(text))
            .await
            .map_err(|e| JsValue::from_str(&format!("Failed to send: {:?}", e)))
    }

    async fn send_event(&mut self, event: OutgoingEvent) -> Result<(), JsValue> {
        let frame = self
            .session
            .encode_event(&event)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize: {}", e)))?;
        self.send_text(frame).await
    }

    /// Pump frames until the connection ends.
    ///
    /// Session actions other than raw sends are passed to `on_action`.
    /// `Err` means the transport broke and a reconnect is worthwhile.
    pub async fn run<F>(
        mut self,
        outgoing: &mut UnboundedReceiver<OutgoingEvent>,
        mut shutdown: &mut Fuse<oneshot::Receiver<()>>,
        mut on_action: F,
    ) -> Result<Closed, JsValue>
    where
        F: FnMut(SessionAction),
    {
        let mut timeout = self.liveness_timer();

        loop {
            let step = futures::select! {
                frame = self.stream.next() => Step::Frame(frame),
                event = outgoing.next() => Step::Outgoing(event),
                _ = shutdown => Step::Shutdown,
                _ = timeout => Step::Timeout,
            };

            let inbound = step.is_inbound();

            match step {
                Step::Frame(Some(Ok(WsMessage::Text(text)))) => {
                    log::debug!("Received frame: {}", text);
                    let actions = self.session.handle_frame(&text).unwrap_or_else(|e| {
                        log::warn!("Skipping frame: {}", e);
                        Vec::new()
                    });
                    for action in actions {
                        match action {
                            SessionAction::Send(reply) => self.send_text(reply).await?,
                            SessionAction::Disconnected => {
                                on_action(SessionAction::Disconnected);
                                return Ok(Closed::ByServer);
                            }
                            SessionAction::ConnectError(message) => {
                                on_action(SessionAction::ConnectError(message.clone()));
                                return Ok(Closed::Refused(message));
                            }
                            other => on_action(other),
                        }
                    }
                }
                Step::Frame(Some(Ok(WsMessage::Bytes(_)))) => {
                    log::warn!("Received unexpected binary message");
                }
                Step::Frame(Some(Err(e))) => {
                    return Err(JsValue::from_str(&format!("WebSocket error: {:?}", e)));
                }
                Step::Frame(None) => {
                    return Err(JsValue::from_str("WebSocket connection lost"));
                }
                Step::Outgoing(Some(event)) => self.send_event(event).await?,
                Step::Outgoing(None) | Step::Shutdown => return self.close().await,
                Step::Timeout => {
                    return Err(JsValue::from_str("No ping from server, connection timed out"));
                }
            }

            // Rebuilt after handling so a fresh handshake's ping schedule applies
            if inbound {
                timeout = self.liveness_timer();
            }
        }
    }

    async fn close(mut self) -> Result<Closed, JsValue> {
        if self.session.is_connected() {
            if let Ok(frame) = self.session.disconnect_frame() {
                let _ = self.send_text(frame).await;
            }
        }
        let _ = self.sink.close().await;
        log::info!("WebSocket closed");
        Ok(Closed::Shutdown)
    }
}
