//! Platform session capability
//!
//! The authenticated WhatsApp connection is owned by an external session
//! process. The bridge only needs three things from it: whether it is
//! ready, sending a message, and downloading the media of a received
//! message. Everything else (pairing, credential storage, reconnects)
//! stays on the other side of this trait.

mod event;
mod sidecar;
mod state;

use async_trait::async_trait;
use serde::Deserialize;

pub use event::PlatformEvent;
pub use sidecar::{SidecarSession, SidecarStatus};
pub use state::{SessionState, SharedSessionState};

use crate::Result;
use crate::messaging::{MediaPayload, SendOptions};

/// Content of an outbound message, with media already loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    /// Plain text body
    Text(String),
    /// Media bytes; the caption travels in the options
    Media(MediaPayload),
}

/// Identifiers the platform returns for a sent message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SentMessage {
    /// Serialized platform message id
    pub id: String,
    /// Delivery state at send time
    #[serde(default)]
    pub ack: Option<i64>,
    /// Platform timestamp (epoch seconds)
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Media attached to a received message, as the platform returns it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadedMedia {
    /// MIME type reported by the platform
    #[serde(rename = "mimetype")]
    pub mime_type: String,
    /// Base64-encoded payload
    pub data: String,
    /// Original filename, when known
    #[serde(default)]
    pub filename: Option<String>,
}

/// Downloads media of received messages
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download the media attached to a message
    ///
    /// # Errors
    ///
    /// Returns error if the platform cannot produce the media
    async fn download_media(&self, message_id: &str) -> Result<DownloadedMedia>;
}

/// The authenticated chat session
#[async_trait]
pub trait ClientSession: MediaFetcher {
    /// Whether the session is authenticated and able to send
    fn is_ready(&self) -> bool;

    /// Send a message to a qualified chat id
    ///
    /// # Errors
    ///
    /// Returns error with the platform's reason if the send fails
    async fn send(
        &self,
        chat_id: &str,
        content: &MessageContent,
        options: &SendOptions,
    ) -> Result<SentMessage>;
}
