//! Chat widget state model
//!
//! [`ChatWidget`] owns the message list, the in-flight requests and the last
//! generated image. User actions become [`OutgoingEvent`]s handed to an
//! [`EventEmitter`]; incoming events mutate state and may trigger speech.
//!
//! Pending state is advisory UI state. It gates the widget's own submit calls
//! but nothing stops a transport from carrying a second request.

use futures::channel::mpsc::UnboundedSender;

use crate::error::{ProtocolError, TransportError, WidgetError};
use crate::protocol::{
    GenerateImagePayload, ImageGenerated, IncomingEvent, MessageReceived, OutgoingEvent,
    SendMessagePayload, UserId,
};
use crate::request::{PendingRequest, PendingRequests, RequestId, RequestKind};
use crate::speech::SpeechAnnouncer;

/// Sink for outgoing socket events
pub trait EventEmitter {
    fn emit(&self, event: OutgoingEvent) -> Result<(), TransportError>;
}

impl EventEmitter for UnboundedSender<OutgoingEvent> {
    fn emit(&self, event: OutgoingEvent) -> Result<(), TransportError> {
        self.unbounded_send(event).map_err(|_| TransportError::Closed)
    }
}

/// One completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// What the user sent
    pub text: String,
    /// What the backend answered
    pub reply: String,
}

pub struct ChatWidget {
    user_id: UserId,
    messages: Vec<ChatMessage>,
    pending: PendingRequests,
    image_url: Option<String>,
    message_draft: String,
    image_draft: String,
    mounted: bool,
    emitter: Box<dyn EventEmitter>,
    announcer: SpeechAnnouncer,
}

impl ChatWidget {
    pub fn new(user_id: UserId, emitter: Box<dyn EventEmitter>, announcer: SpeechAnnouncer) -> Self {
        Self {
            user_id,
            messages: Vec::new(),
            pending: PendingRequests::new(),
            image_url: None,
            message_draft: String::new(),
            image_draft: String::new(),
            mounted: true,
            emitter,
            announcer,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn pending(&self) -> &PendingRequests {
        &self.pending
    }

    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.pending.is_pending(kind)
    }

    /// The "Thinking..." state: any request in flight
    pub fn is_loading(&self) -> bool {
        self.pending.any_pending()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Whether the input for `kind` should be enabled
    pub fn can_submit(&self, kind: RequestKind) -> bool {
        self.mounted && !self.pending.is_pending(kind)
    }

    pub fn message_draft(&self) -> &str {
        &self.message_draft
    }

    pub fn set_message_draft(&mut self, text: impl Into<String>) {
        self.message_draft = text.into();
    }

    pub fn image_draft(&self) -> &str {
        &self.image_draft
    }

    pub fn set_image_draft(&mut self, text: impl Into<String>) {
        self.image_draft = text.into();
    }

    /// Send a chat message. The text goes on the wire exactly as given.
    pub fn submit_message(&mut self, text: &str) -> Result<RequestId, WidgetError> {
        self.check_submit(RequestKind::Chat, text)?;

        let request_id = self.pending.register(RequestKind::Chat, text);
        let event = OutgoingEvent::SendMessage(SendMessagePayload {
            message: text.to_string(),
            user_id: self.user_id,
            request_id,
        });
        self.emit(RequestKind::Chat, event)?;

        self.message_draft.clear();
        Ok(request_id)
    }

    /// Ask the backend to generate an image
    pub fn submit_image_prompt(&mut self, text: &str) -> Result<RequestId, WidgetError> {
        self.check_submit(RequestKind::Image, text)?;

        let request_id = self.pending.register(RequestKind::Image, text);
        let event = OutgoingEvent::GenerateImage(GenerateImagePayload {
            prompt: text.to_string(),
            user_id: self.user_id,
            request_id,
        });
        self.emit(RequestKind::Image, event)?;

        self.image_draft.clear();
        Ok(request_id)
    }

    pub fn submit_message_draft(&mut self) -> Result<RequestId, WidgetError> {
        let text = self.message_draft.clone();
        self.submit_message(&text)
    }

    pub fn submit_image_draft(&mut self) -> Result<RequestId, WidgetError> {
        let text = self.image_draft.clone();
        self.submit_image_prompt(&text)
    }

    fn check_submit(&self, kind: RequestKind, text: &str) -> Result<(), WidgetError> {
        if !self.mounted {
            return Err(WidgetError::Unmounted);
        }
        if text.trim().is_empty() {
            return Err(WidgetError::EmptyInput);
        }
        if self.pending.is_pending(kind) {
            return Err(WidgetError::RequestPending(kind));
        }
        Ok(())
    }

    fn emit(&mut self, kind: RequestKind, event: OutgoingEvent) -> Result<(), WidgetError> {
        let request_id = event.request_id();
        log::debug!("Emitting {} ({})", event.name(), request_id);

        if let Err(e) = self.emitter.emit(event) {
            log::error!("Failed to emit {} request: {}", kind, e);
            self.pending.cancel(kind, request_id);
            return Err(e.into());
        }
        Ok(())
    }

    /// Dispatch an event received from the backend
    pub fn handle_incoming(&mut self, event: IncomingEvent) -> Result<(), WidgetError> {
        match event {
            IncomingEvent::MessageReceived(payload) => self.on_message_received(payload),
            IncomingEvent::ImageGenerated(payload) => self.on_image_received(payload),
        }
    }

    /// Append the reply, clear its pending request and speak it
    pub fn on_message_received(&mut self, payload: MessageReceived) -> Result<(), WidgetError> {
        if !self.mounted {
            log::warn!("Dropping reply received after unmount");
            return Err(WidgetError::Unmounted);
        }

        let text = match self.resolve(RequestKind::Chat, payload.request_id()) {
            Some(request) => request.text,
            None => {
                log::warn!("Reply does not match any pending chat request");
                payload.message
            }
        };

        self.messages.push(ChatMessage {
            text,
            reply: payload.bot_reply,
        });

        if let Some(message) = self.messages.last() {
            self.announcer.announce(&message.reply);
        }
        Ok(())
    }

    /// Store the generated image URL and clear its pending request
    pub fn on_image_received(&mut self, payload: ImageGenerated) -> Result<(), WidgetError> {
        if !self.mounted {
            log::warn!("Dropping image received after unmount");
            return Err(WidgetError::Unmounted);
        }

        if self.resolve(RequestKind::Image, payload.request_id()).is_none() {
            log::warn!("Image does not match any pending image request");
        }

        self.image_url = Some(payload.image_url);
        Ok(())
    }

    /// A response with a foreign id resolves nothing
    fn resolve(
        &mut self,
        kind: RequestKind,
        id: Result<Option<RequestId>, ProtocolError>,
    ) -> Option<PendingRequest> {
        match id {
            Ok(id) => self.pending.resolve(kind, id),
            Err(e) => {
                log::warn!("Ignoring {} response correlation: {}", kind, e);
                None
            }
        }
    }

    /// Tear the widget down. Later events and submits are refused.
    pub fn unmount(&mut self) {
        if self.mounted {
            log::info!("Chat widget unmounted");
        }
        self.mounted = false;
        self.pending.clear();
    }
}
