//! Send options: lenient caller input resolved into a total record
//!
//! Callers send loosely-typed JSON. Every recognized option is read
//! leniently (a wrong-typed value counts as absent) and [`resolve`] fills
//! the gaps with defaults, so nothing past this module ever handles an
//! unset option.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::directive::MessageKind;

/// Caller-supplied options, every field optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialSendOptions {
    pub link_preview: Option<bool>,
    pub send_seen: Option<bool>,
    pub parse_vcards: Option<bool>,
    pub send_audio_as_voice: Option<bool>,
    pub send_video_as_gif: Option<bool>,
    pub send_media_as_sticker: Option<bool>,
    pub send_media_as_document: Option<bool>,
    pub send_media_as_hd: Option<bool>,
    pub is_view_once: Option<bool>,
    pub mentions: Option<Vec<String>>,
    pub group_mentions: Option<Vec<String>>,
    pub quoted_message_id: Option<String>,
    pub sticker_author: Option<String>,
    pub sticker_name: Option<String>,
    pub sticker_categories: Option<Vec<String>>,
    pub ignore_quote_errors: Option<bool>,
    pub wait_until_msg_sent: Option<bool>,
    pub caption: Option<String>,
}

impl PartialSendOptions {
    /// Read options from an arbitrary JSON value
    ///
    /// Anything other than an object yields empty options.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let get = |key: &str| obj.get(key);

        Self {
            link_preview: get("linkPreview").and_then(lenient_bool),
            send_seen: get("sendSeen").and_then(lenient_bool),
            parse_vcards: get("parseVCards").and_then(lenient_bool),
            send_audio_as_voice: get("sendAudioAsVoice").and_then(lenient_bool),
            send_video_as_gif: get("sendVideoAsGif").and_then(lenient_bool),
            send_media_as_sticker: get("sendMediaAsSticker").and_then(lenient_bool),
            send_media_as_document: get("sendMediaAsDocument").and_then(lenient_bool),
            send_media_as_hd: get("sendMediaAsHd").and_then(lenient_bool),
            is_view_once: get("isViewOnce").and_then(lenient_bool),
            mentions: get("mentions").and_then(lenient_ids),
            group_mentions: get("groupMentions").and_then(lenient_ids),
            quoted_message_id: get("quotedMessageId").and_then(lenient_string),
            sticker_author: get("stickerAuthor").and_then(lenient_string),
            sticker_name: get("stickerName").and_then(lenient_string),
            sticker_categories: get("stickerCategories").and_then(lenient_ids),
            ignore_quote_errors: get("ignoreQuoteErrors").and_then(lenient_bool),
            wait_until_msg_sent: get("waitUntilMsgSent").and_then(lenient_bool),
            caption: get("caption").and_then(lenient_string),
        }
    }
}

impl<'de> Deserialize<'de> for PartialSendOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// Booleans, plus the strings "true"/"false"
fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// Non-empty strings
fn lenient_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// A list of ids; a lone string is a one-element list and objects
/// contribute their `id` field (`{ "subject": .., "id": .. }` group mentions)
fn lenient_ids(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(_) => lenient_string(value).map(|s| vec![s]),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(obj) => obj.get("id").and_then(lenient_string),
                    other => lenient_string(other),
                })
                .collect(),
        ),
        _ => None,
    }
}

/// Fully resolved send options
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOptions {
    pub link_preview: bool,
    pub send_seen: bool,
    #[serde(rename = "parseVCards")]
    pub parse_vcards: bool,
    pub send_audio_as_voice: bool,
    pub send_video_as_gif: bool,
    pub send_media_as_sticker: bool,
    pub send_media_as_document: bool,
    pub send_media_as_hd: bool,
    pub is_view_once: bool,
    pub mentions: Vec<String>,
    pub group_mentions: Vec<String>,
    pub quoted_message_id: Option<String>,
    pub sticker_author: Option<String>,
    pub sticker_name: Option<String>,
    pub sticker_categories: Vec<String>,
    pub ignore_quote_errors: bool,
    pub wait_until_msg_sent: bool,
    pub caption: Option<String>,
}

/// Merge caller options with defaults for the given message kind
///
/// Media-only flags are always off for text sends, and text sends never
/// mark the chat seen. `send_media_as_hd` is on for media unless the caller
/// passes an explicit `false`. Sticker metadata is dropped unless the media
/// goes out as a sticker.
#[must_use]
pub fn resolve(partial: &PartialSendOptions, kind: MessageKind) -> SendOptions {
    let is_media = kind == MessageKind::Media;
    let media_flag = |flag: Option<bool>| is_media && flag.unwrap_or(false);
    let as_sticker = media_flag(partial.send_media_as_sticker);

    SendOptions {
        link_preview: partial.link_preview != Some(false),
        send_seen: media_flag(partial.send_seen),
        parse_vcards: partial.parse_vcards.unwrap_or(true),
        send_audio_as_voice: media_flag(partial.send_audio_as_voice),
        send_video_as_gif: media_flag(partial.send_video_as_gif),
        send_media_as_sticker: as_sticker,
        send_media_as_document: media_flag(partial.send_media_as_document),
        send_media_as_hd: is_media && partial.send_media_as_hd != Some(false),
        is_view_once: media_flag(partial.is_view_once),
        mentions: partial.mentions.clone().unwrap_or_default(),
        group_mentions: partial.group_mentions.clone().unwrap_or_default(),
        quoted_message_id: partial.quoted_message_id.clone(),
        sticker_author: partial.sticker_author.clone().filter(|_| as_sticker),
        sticker_name: partial.sticker_name.clone().filter(|_| as_sticker),
        sticker_categories: if as_sticker {
            partial.sticker_categories.clone().unwrap_or_default()
        } else {
            Vec::new()
        },
        ignore_quote_errors: partial.ignore_quote_errors.unwrap_or(true),
        wait_until_msg_sent: partial.wait_until_msg_sent.unwrap_or(false),
        caption: if is_media {
            partial.caption.clone()
        } else {
            None
        },
    }
}
