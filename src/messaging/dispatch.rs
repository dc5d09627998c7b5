//! Single-target outbound dispatch

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::directive::{MessageKind, SendDirective};
use super::media::{MediaLoader, MediaType};
use super::options::SendOptions;
use super::target::Target;
use crate::session::{ClientSession, MessageContent};
use crate::{Error, Result};

/// A message the session accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub message_id: String,
    pub chat_id: String,
    pub message_type: MessageKind,
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    pub sent_at: DateTime<Utc>,
    pub ack: Option<i64>,
    pub timestamp: Option<i64>,
    pub send_options: SendOptions,
}

/// A send that did not go out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendFailure {
    /// Target as the caller supplied it
    pub target: String,
    pub chat_id: String,
    /// Reason text, passed through from the session unclassified
    pub error: String,
    pub sent_at: DateTime<Utc>,
}

impl SendFailure {
    #[must_use]
    pub fn new(target: &Target, error: impl Into<String>) -> Self {
        Self {
            target: target.as_input().to_string(),
            chat_id: target.chat_id(),
            error: error.into(),
            sent_at: Utc::now(),
        }
    }
}

/// Outcome of one send attempt
///
/// Serializes flat, with a `success` discriminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendResult {
    Ok(SendReceipt),
    Failed(SendFailure),
}

impl SendResult {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Platform message id of a successful send
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        match self {
            Self::Ok(receipt) => Some(&receipt.message_id),
            Self::Failed(_) => None,
        }
    }

    /// Failure reason of an unsuccessful send
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Ok(_) => None,
            Self::Failed(failure) => Some(&failure.error),
        }
    }
}

impl Serialize for SendResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Tagged<'a, T> {
            success: bool,
            #[serde(flatten)]
            inner: &'a T,
        }

        match self {
            Self::Ok(receipt) => Tagged {
                success: true,
                inner: receipt,
            }
            .serialize(serializer),
            Self::Failed(failure) => Tagged {
                success: false,
                inner: failure,
            }
            .serialize(serializer),
        }
    }
}

/// `message:sent` payload forwarded after a single send when enabled
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentNotification {
    pub event: &'static str,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub client_ready: bool,
    pub message: SendResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SentNotification {
    #[must_use]
    pub fn new(result: SendResult, client_ready: bool) -> Self {
        Self {
            event: "message:sent",
            success: result.is_ok(),
            timestamp: Utc::now(),
            client_ready,
            error: result.error().map(str::to_string),
            message: result,
        }
    }
}

/// Sends one directive to one target through the session
#[derive(Clone)]
pub struct OutboundDispatcher {
    session: Arc<dyn ClientSession>,
    loader: MediaLoader,
}

impl OutboundDispatcher {
    #[must_use]
    pub fn new(session: Arc<dyn ClientSession>) -> Self {
        Self {
            session,
            loader: MediaLoader::default(),
        }
    }

    /// Use a specific media loader
    #[must_use]
    pub fn with_loader(mut self, loader: MediaLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Whether the underlying session can send
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    /// Send a directive to a target
    ///
    /// The session is not called unless it is ready and any media has been
    /// loaded. Once it is called, its failure is reported as
    /// [`SendResult::Failed`] carrying the raw reason.
    ///
    /// # Errors
    ///
    /// - `ClientNotReady` if the session is not ready
    /// - `MediaUnavailable` if the media cannot be loaded
    /// - `Validation` if the directive has nothing to send
    pub async fn send(&self, target: &Target, directive: &SendDirective) -> Result<SendResult> {
        if !self.session.is_ready() {
            return Err(Error::ClientNotReady);
        }

        let chat_id = target.chat_id();

        let (content, media_type) = match directive.kind {
            MessageKind::Text => {
                let body = directive
                    .body
                    .as_deref()
                    .filter(|b| !b.trim().is_empty())
                    .ok_or_else(|| Error::Validation("message body is empty".to_string()))?;
                (MessageContent::Text(body.to_string()), None)
            }
            MessageKind::Media => {
                let media = directive
                    .media
                    .as_ref()
                    .ok_or_else(|| Error::Validation("media directive without media".to_string()))?;
                let payload = self.loader.load(media).await?;
                tracing::debug!(
                    source = %media.describe(),
                    mime_type = %payload.mime_type,
                    bytes = payload.data.len(),
                    "media loaded"
                );
                let media_type = payload.media_type();
                (MessageContent::Media(payload), Some(media_type))
            }
        };

        match self.session.send(&chat_id, &content, &directive.options).await {
            Ok(sent) => {
                tracing::info!(chat_id = %chat_id, message_id = %sent.id, kind = directive.kind.as_str(), "message sent");
                Ok(SendResult::Ok(SendReceipt {
                    message_id: sent.id,
                    chat_id,
                    message_type: directive.kind,
                    body: directive.body.clone(),
                    media_type,
                    sent_at: Utc::now(),
                    ack: sent.ack,
                    timestamp: sent.timestamp,
                    send_options: directive.options.clone(),
                }))
            }
            Err(e) => {
                tracing::warn!(chat_id = %chat_id, error = %e, "send failed");
                Ok(SendResult::Failed(SendFailure::new(target, e.to_string())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::messaging::directive::MediaRef;
    use crate::messaging::options::PartialSendOptions;
    use crate::session::{DownloadedMedia, MediaFetcher, SentMessage};

    #[derive(Default)]
    struct RecordingSession {
        ready: AtomicBool,
        calls: AtomicUsize,
        fail_with: Option<String>,
        last: Mutex<Option<(String, MessageContent, SendOptions)>>,
    }

    impl RecordingSession {
        fn ready() -> Self {
            Self {
                ready: AtomicBool::new(true),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl MediaFetcher for RecordingSession {
        async fn download_media(&self, _message_id: &str) -> Result<DownloadedMedia> {
            Err(Error::Session("unused".to_string()))
        }
    }

    #[async_trait]
    impl ClientSession for RecordingSession {
        fn is_ready(&self) -> bool {
            self.ready.load(Ordering::SeqCst)
        }

        async fn send(
            &self,
            chat_id: &str,
            content: &MessageContent,
            options: &SendOptions,
        ) -> Result<SentMessage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() =
                Some((chat_id.to_string(), content.clone(), options.clone()));
            match &self.fail_with {
                Some(reason) => Err(Error::Send(reason.clone())),
                None => Ok(SentMessage {
                    id: format!("true_{chat_id}_3EB0"),
                    ack: Some(1),
                    timestamp: Some(1_700_000_000),
                }),
            }
        }
    }

    fn text(body: &str) -> SendDirective {
        SendDirective::text(body, &PartialSendOptions::default())
    }

    #[tokio::test]
    async fn text_send_copies_session_fields() {
        let session = Arc::new(RecordingSession::ready());
        let dispatcher = OutboundDispatcher::new(session.clone());

        let result = dispatcher
            .send(&Target::individual("919876543210"), &text("Hello from API!"))
            .await
            .unwrap();

        let SendResult::Ok(receipt) = &result else {
            panic!("expected success, got {result:?}");
        };
        assert_eq!(receipt.chat_id, "919876543210@c.us");
        assert_eq!(receipt.message_id, "true_919876543210@c.us_3EB0");
        assert_eq!(receipt.ack, Some(1));
        assert_eq!(receipt.timestamp, Some(1_700_000_000));
        assert_eq!(receipt.body.as_deref(), Some("Hello from API!"));

        let (chat_id, content, _) = session.last.lock().unwrap().clone().unwrap();
        assert_eq!(chat_id, "919876543210@c.us");
        assert_eq!(content, MessageContent::Text("Hello from API!".to_string()));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["chatId"], "919876543210@c.us");
    }

    #[tokio::test]
    async fn not_ready_never_calls_session() {
        let session = Arc::new(RecordingSession::default());
        let dispatcher = OutboundDispatcher::new(session.clone());

        let err = dispatcher
            .send(&Target::individual("1"), &text("hi"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ClientNotReady));
        assert_eq!(session.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_media_never_calls_session() {
        let session = Arc::new(RecordingSession::ready());
        let dispatcher = OutboundDispatcher::new(session.clone());
        let directive = SendDirective::media(
            MediaRef::Path("/nonexistent/wa-bridge/photo.jpg".into()),
            Some("caption".to_string()),
            &PartialSendOptions::default(),
        );

        let err = dispatcher
            .send(&Target::individual("1"), &directive)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MediaUnavailable(_)));
        assert_eq!(session.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn inline_media_carries_caption() {
        let session = Arc::new(RecordingSession::ready());
        let dispatcher = OutboundDispatcher::new(session.clone());
        let directive = SendDirective::media(
            MediaRef::Bytes {
                data: vec![0xFF, 0xD8, 0xFF],
                mime_type: "image/jpeg".to_string(),
                filename: Some("photo.jpg".to_string()),
            },
            Some("Look".to_string()),
            &PartialSendOptions::default(),
        );

        let result = dispatcher
            .send(&Target::group("123-456@g.us"), &directive)
            .await
            .unwrap();

        let SendResult::Ok(receipt) = result else {
            panic!("expected success");
        };
        assert_eq!(receipt.media_type, Some(MediaType::Image));
        let (_, content, options) = session.last.lock().unwrap().clone().unwrap();
        assert!(matches!(content, MessageContent::Media(_)));
        assert_eq!(options.caption.as_deref(), Some("Look"));
        assert!(options.send_media_as_hd);
    }

    #[tokio::test]
    async fn session_failure_becomes_failed_result() {
        let session = Arc::new(RecordingSession {
            fail_with: Some("Evaluation failed: chat not found".to_string()),
            ..RecordingSession::ready()
        });
        let dispatcher = OutboundDispatcher::new(session);

        let result = dispatcher
            .send(&Target::individual("1"), &text("hi"))
            .await
            .unwrap();

        assert!(!result.is_ok());
        assert_eq!(result.error(), Some("Evaluation failed: chat not found"));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["target"], "1");
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let session = Arc::new(RecordingSession::ready());
        let dispatcher = OutboundDispatcher::new(session.clone());

        let err = dispatcher
            .send(&Target::individual("1"), &text("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(session.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sent_notification_shape() {
        let failure = SendResult::Failed(SendFailure::new(&Target::individual("1"), "boom"));
        let json = serde_json::to_value(SentNotification::new(failure, true)).unwrap();
        assert_eq!(json["event"], "message:sent");
        assert_eq!(json["success"], false);
        assert_eq!(json["clientReady"], true);
        assert_eq!(json["error"], "boom");
        assert_eq!(json["message"]["chatId"], "1@c.us");
    }
}
