//! Typed events emitted by the platform session

use serde::Deserialize;

use crate::inbound::RawMessage;

/// An event from the session, in arrival order
///
/// Wire form is `{"event": "<name>", "data": {...}}` using the platform's
/// event names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PlatformEvent {
    /// A pairing code must be scanned
    Qr { code: String },
    /// Credentials accepted
    Authenticated,
    /// Session ready to send and receive
    Ready,
    /// Credentials rejected
    AuthFailure { message: String },
    /// Connection lost
    Disconnected {
        #[serde(default)]
        reason: Option<String>,
    },
    /// Message received from someone else
    Message(RawMessage),
    /// Message created on this account (including our own sends)
    MessageCreate(RawMessage),
    /// Delivery state of a message changed
    MessageAck { message: RawMessage, ack: i64 },
    /// Someone joined a group
    GroupJoin(serde_json::Value),
}

impl PlatformEvent {
    /// Event name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Qr { .. } => "qr",
            Self::Authenticated => "authenticated",
            Self::Ready => "ready",
            Self::AuthFailure { .. } => "auth_failure",
            Self::Disconnected { .. } => "disconnected",
            Self::Message(_) => "message",
            Self::MessageCreate(_) => "message_create",
            Self::MessageAck { .. } => "message_ack",
            Self::GroupJoin(_) => "group_join",
        }
    }
}
