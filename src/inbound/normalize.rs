//! Raw platform messages to the stable webhook schema

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::links::detect_links;
use super::raw::RawMessage;
use crate::messaging::target::{ChatKind, strip_suffixes};
use crate::session::MediaFetcher;

/// Largest decoded media payload included in a webhook (10 MiB)
pub const MAX_INBOUND_MEDIA_BYTES: usize = 10 * 1024 * 1024;

/// Chat a message belongs to
///
/// Only the id and its [`ChatKind`] are stored; the three JSON flags are
/// derived on serialization, so exactly one of them is ever true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatInfo {
    pub id: String,
    pub kind: ChatKind,
}

impl ChatInfo {
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.kind == ChatKind::Group
    }

    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.kind == ChatKind::Broadcast
    }

    #[must_use]
    pub fn is_private(&self) -> bool {
        !self.is_group() && !self.is_broadcast()
    }
}

impl Serialize for ChatInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ChatInfo", 4)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("isGroup", &self.is_group())?;
        s.serialize_field("isBroadcast", &self.is_broadcast())?;
        s.serialize_field("isPrivate", &self.is_private())?;
        s.end()
    }
}

/// Media block of a forwarded message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboundMedia {
    pub mimetype: String,
    /// Base64 payload, as downloaded
    pub data: String,
    pub filename: Option<String>,
    /// Decoded size in bytes
    pub size: usize,
}

/// A received message in webhook form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    pub message_id: String,
    pub from: String,
    pub from_number: String,
    pub to: Option<String>,
    pub author: Option<String>,
    pub participant: Option<String>,
    pub body: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub timestamp: i64,
    pub ack: Option<i64>,
    pub chat: ChatInfo,
    pub from_me: bool,
    pub has_media: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<InboundMedia>,
    pub has_quoted_msg: bool,
    pub has_reaction: bool,
    pub has_group_mentions: bool,
    pub is_forwarded: bool,
    pub is_gif: bool,
    pub is_starred: bool,
    pub is_status: bool,
    pub is_ephemeral: bool,
    pub group_mentions: Vec<String>,
    pub mentioned_ids: Vec<String>,
    pub links: Vec<String>,
    #[serde(rename = "vCards")]
    pub vcards: Vec<String>,
    pub location: Option<Value>,
    pub duration: Option<Value>,
    pub device_type: Option<String>,
    pub forwarding_score: u32,
}

/// Delivery-state change in webhook form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AckEvent {
    pub event: &'static str,
    pub message_id: String,
    pub from: String,
    pub from_number: String,
    pub ack: i64,
    pub timestamp: i64,
    pub chat_type: ChatKind,
}

impl AckEvent {
    /// Build the `message:ack` payload for a message
    #[must_use]
    pub fn new(raw: &RawMessage, ack: i64) -> Self {
        Self {
            event: "message:ack",
            message_id: raw.id.clone(),
            from: raw.from.clone(),
            from_number: strip_suffixes(&raw.from).to_string(),
            ack,
            timestamp: raw.timestamp,
            chat_type: ChatKind::of(chat_id_of(raw), raw.broadcast),
        }
    }
}

/// The remote side of the conversation
///
/// For our own messages `from` is this account, so the chat is `to`.
fn chat_id_of(raw: &RawMessage) -> &str {
    match (&raw.to, raw.from_me) {
        (Some(to), true) if !to.is_empty() => to,
        _ => &raw.from,
    }
}

/// Converts raw messages into [`InboundEvent`]s
#[derive(Debug, Clone)]
pub struct InboundNormalizer {
    max_media_bytes: usize,
}

impl Default for InboundNormalizer {
    fn default() -> Self {
        Self {
            max_media_bytes: MAX_INBOUND_MEDIA_BYTES,
        }
    }
}

impl InboundNormalizer {
    /// Normalize a raw message
    ///
    /// When the message declares media and a fetcher is available, the media
    /// is downloaded and included if its decoded size is within the limit.
    /// Oversized or failed downloads leave `media` absent but keep
    /// `hasMedia: true`; they never fail normalization.
    pub async fn normalize(
        &self,
        raw: &RawMessage,
        fetcher: Option<&dyn MediaFetcher>,
    ) -> InboundEvent {
        let media = if raw.has_media {
            match fetcher {
                Some(fetcher) => self.fetch_media(raw, fetcher).await,
                None => {
                    tracing::debug!(message_id = %raw.id, "no media fetcher, skipping download");
                    None
                }
            }
        } else {
            None
        };

        let chat_id = chat_id_of(raw);
        let links = raw
            .links
            .clone()
            .unwrap_or_else(|| detect_links(&raw.body));

        InboundEvent {
            message_id: raw.id.clone(),
            from: raw.from.clone(),
            from_number: strip_suffixes(&raw.from).to_string(),
            to: raw.to.clone(),
            author: raw.author.clone(),
            participant: raw.participant.clone().or_else(|| raw.author.clone()),
            body: raw.body.clone(),
            content_type: raw.message_type.clone(),
            timestamp: raw.timestamp,
            ack: raw.ack,
            chat: ChatInfo {
                id: chat_id.to_string(),
                kind: ChatKind::of(chat_id, raw.broadcast),
            },
            from_me: raw.from_me,
            has_media: raw.has_media,
            media,
            has_quoted_msg: raw.has_quoted_msg,
            has_reaction: raw.has_reaction,
            has_group_mentions: !raw.group_mentions.is_empty(),
            is_forwarded: raw.is_forwarded,
            is_gif: raw.is_gif,
            is_starred: raw.is_starred,
            is_status: raw.is_status,
            is_ephemeral: raw.is_ephemeral,
            group_mentions: raw.group_mentions.clone(),
            mentioned_ids: raw.mentioned_ids.clone(),
            links,
            vcards: raw.vcards.clone(),
            location: raw.location.clone(),
            duration: raw.duration.clone(),
            device_type: raw.device_type.clone(),
            forwarding_score: raw.forwarding_score,
        }
    }

    async fn fetch_media(&self, raw: &RawMessage, fetcher: &dyn MediaFetcher) -> Option<InboundMedia> {
        let downloaded = match fetcher.download_media(&raw.id).await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(message_id = %raw.id, error = %e, "media download failed");
                return None;
            }
        };

        let size = match BASE64.decode(downloaded.data.as_bytes()) {
            Ok(bytes) => bytes.len(),
            Err(e) => {
                tracing::warn!(message_id = %raw.id, error = %e, "media payload is not valid base64");
                return None;
            }
        };

        if size > self.max_media_bytes {
            tracing::info!(
                message_id = %raw.id,
                size,
                limit = self.max_media_bytes,
                "media too large, forwarding without payload"
            );
            return None;
        }

        Some(InboundMedia {
            mimetype: downloaded.mime_type,
            data: downloaded.data,
            filename: downloaded.filename,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::session::DownloadedMedia;
    use crate::{Error, Result};

    struct FixedMedia(Vec<u8>);

    #[async_trait]
    impl MediaFetcher for FixedMedia {
        async fn download_media(&self, _message_id: &str) -> Result<DownloadedMedia> {
            Ok(DownloadedMedia {
                mime_type: "image/jpeg".to_string(),
                data: BASE64.encode(&self.0),
                filename: Some("photo.jpg".to_string()),
            })
        }
    }

    struct FailingMedia;

    #[async_trait]
    impl MediaFetcher for FailingMedia {
        async fn download_media(&self, _message_id: &str) -> Result<DownloadedMedia> {
            Err(Error::Session("media expired".to_string()))
        }
    }

    fn raw(value: Value) -> RawMessage {
        serde_json::from_value(value).unwrap()
    }

    fn media_message() -> RawMessage {
        raw(json!({
            "id": "false_919876543210@c.us_IMG",
            "from": "919876543210@c.us",
            "body": "Check this image!",
            "type": "image",
            "hasMedia": true
        }))
    }

    #[tokio::test]
    async fn private_text_message() {
        let event = InboundNormalizer::default()
            .normalize(
                &raw(json!({
                    "id": "false_919876543210@c.us_ABC",
                    "from": "919876543210@c.us",
                    "to": "10987654321@c.us",
                    "body": "Hello! How are you?",
                    "type": "chat",
                    "timestamp": 1_234_567_890,
                    "ack": 1
                })),
                None,
            )
            .await;

        assert_eq!(event.from_number, "919876543210");
        assert_eq!(event.timestamp, 1_234_567_890);
        assert_eq!(event.ack, Some(1));
        assert!(event.chat.is_private());
        assert!(!event.chat.is_group());
        assert!(!event.chat.is_broadcast());
        assert!(event.links.is_empty());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "chat");
        assert_eq!(json["chat"]["isPrivate"], true);
        assert_eq!(json["hasMedia"], false);
        assert!(json.get("media").is_none());
    }

    #[tokio::test]
    async fn group_message_keeps_author() {
        let event = InboundNormalizer::default()
            .normalize(
                &raw(json!({
                    "id": "g1",
                    "from": "123456789-1234567890@g.us",
                    "author": "919876543210@c.us",
                    "body": "This is a group message",
                    "mentionedIds": ["919876543211@c.us"]
                })),
                None,
            )
            .await;

        assert_eq!(event.from_number, "123456789-1234567890");
        assert!(event.chat.is_group());
        assert!(!event.chat.is_private());
        assert_eq!(event.participant.as_deref(), Some("919876543210@c.us"));
        assert_eq!(event.mentioned_ids, vec!["919876543211@c.us"]);
    }

    #[tokio::test]
    async fn broadcast_from_flag_or_suffix() {
        let normalizer = InboundNormalizer::default();

        let flagged = normalizer
            .normalize(&raw(json!({ "from": "1@c.us", "broadcast": true })), None)
            .await;
        assert!(flagged.chat.is_broadcast());
        assert!(!flagged.chat.is_private());

        let status = normalizer
            .normalize(&raw(json!({ "from": "status@broadcast" })), None)
            .await;
        assert!(status.chat.is_broadcast());
        assert!(!status.chat.is_group());
    }

    #[tokio::test]
    async fn own_message_uses_recipient_chat() {
        let event = InboundNormalizer::default()
            .normalize(
                &raw(json!({ "from": "1@c.us", "to": "2@g.us", "fromMe": true })),
                None,
            )
            .await;
        assert_eq!(event.chat.id, "2@g.us");
        assert!(event.chat.is_group());
    }

    #[tokio::test]
    async fn media_exactly_at_limit_is_included() {
        let fetcher = FixedMedia(vec![0u8; MAX_INBOUND_MEDIA_BYTES]);
        let event = InboundNormalizer::default()
            .normalize(&media_message(), Some(&fetcher))
            .await;

        let media = event.media.expect("media within limit");
        assert_eq!(media.size, MAX_INBOUND_MEDIA_BYTES);
        assert_eq!(media.mimetype, "image/jpeg");
        assert!(event.has_media);
    }

    #[tokio::test]
    async fn media_one_byte_over_is_omitted() {
        let fetcher = FixedMedia(vec![0u8; MAX_INBOUND_MEDIA_BYTES + 1]);
        let event = InboundNormalizer::default()
            .normalize(&media_message(), Some(&fetcher))
            .await;

        assert!(event.media.is_none());
        assert!(event.has_media);

        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("media").is_none());
        assert_eq!(json["hasMedia"], true);
    }

    #[tokio::test]
    async fn failed_download_still_normalizes() {
        let event = InboundNormalizer::default()
            .normalize(&media_message(), Some(&FailingMedia))
            .await;

        assert!(event.media.is_none());
        assert!(event.has_media);
        assert_eq!(event.body, "Check this image!");
    }

    #[tokio::test]
    async fn media_not_fetched_when_absent() {
        let mut msg = media_message();
        msg.has_media = false;
        let event = InboundNormalizer::default()
            .normalize(&msg, Some(&FailingMedia))
            .await;
        assert!(event.media.is_none());
        assert!(!event.has_media);
    }

    #[tokio::test]
    async fn links_detected_when_not_supplied() {
        let event = InboundNormalizer::default()
            .normalize(&raw(json!({ "from": "1@c.us", "body": "see https://example.com." })), None)
            .await;
        assert_eq!(event.links, vec!["https://example.com"]);
    }

    #[test]
    fn ack_event_payload() {
        let msg = raw(json!({ "id": "m1", "from": "123@g.us", "timestamp": 42 }));
        let ack = AckEvent::new(&msg, 3);
        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["event"], "message:ack");
        assert_eq!(json["fromNumber"], "123");
        assert_eq!(json["ack"], 3);
        assert_eq!(json["chatType"], "group");
    }
}
