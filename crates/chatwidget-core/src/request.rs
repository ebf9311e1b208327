//! Request correlation
//!
//! Every outgoing request gets a locally generated [`RequestId`] and a
//! [`RequestKind`]. In-flight requests are tracked per kind so that a reply of
//! one kind can never clear the pending state of the other.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use uuid::Uuid;

/// Kind of request the widget can have in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Chat,
    Image,
}

impl RequestKind {
    pub const ALL: [RequestKind; 2] = [RequestKind::Chat, RequestKind::Image];
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Chat => write!(f, "chat"),
            RequestKind::Image => write!(f, "image"),
        }
    }
}

/// Opaque correlation identifier echoed back by servers that support it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request that has been emitted and not yet answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: RequestId,
    pub kind: RequestKind,
    /// Text the user submitted (message or image prompt)
    pub text: String,
}

/// In-flight requests, kept in emission order per kind
#[derive(Debug, Default)]
pub struct PendingRequests {
    chat: VecDeque<PendingRequest>,
    image: VecDeque<PendingRequest>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self, kind: RequestKind) -> &VecDeque<PendingRequest> {
        match kind {
            RequestKind::Chat => &self.chat,
            RequestKind::Image => &self.image,
        }
    }

    fn queue_mut(&mut self, kind: RequestKind) -> &mut VecDeque<PendingRequest> {
        match kind {
            RequestKind::Chat => &mut self.chat,
            RequestKind::Image => &mut self.image,
        }
    }

    /// Track a new request and return its id
    pub fn register(&mut self, kind: RequestKind, text: impl Into<String>) -> RequestId {
        let id = RequestId::new();
        self.queue_mut(kind).push_back(PendingRequest {
            id,
            kind,
            text: text.into(),
        });
        id
    }

    /// Drop a request without a response (used when emission fails)
    pub fn cancel(&mut self, kind: RequestKind, id: RequestId) -> Option<PendingRequest> {
        let queue = self.queue_mut(kind);
        let pos = queue.iter().position(|r| r.id == id)?;
        queue.remove(pos)
    }

    /// Match a response to a pending request.
    ///
    /// An echoed id resolves exactly that request. Without an id the oldest
    /// pending request of the kind is resolved. An id that matches nothing
    /// resolves nothing, so a stray response cannot clear someone else's
    /// pending state.
    pub fn resolve(&mut self, kind: RequestKind, id: Option<RequestId>) -> Option<PendingRequest> {
        match id {
            Some(id) => self.cancel(kind, id),
            None => self.queue_mut(kind).pop_front(),
        }
    }

    pub fn is_pending(&self, kind: RequestKind) -> bool {
        !self.queue(kind).is_empty()
    }

    /// True while any request of any kind is in flight
    pub fn any_pending(&self) -> bool {
        RequestKind::ALL.iter().any(|k| self.is_pending(*k))
    }

    pub fn len(&self, kind: RequestKind) -> usize {
        self.queue(kind).len()
    }

    pub fn iter(&self, kind: RequestKind) -> impl Iterator<Item = &PendingRequest> {
        self.queue(kind).iter()
    }

    pub fn clear(&mut self) {
        self.chat.clear();
        self.image.clear();
    }
}
