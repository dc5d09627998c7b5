//! Raw message shape as emitted by the session
//!
//! Field names follow the platform's own message object. Id-bearing fields
//! arrive either as plain strings or as objects carrying `_serialized`, so
//! they are read leniently.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A message as the session reports it
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawMessage {
    #[serde(deserialize_with = "serialized_id")]
    pub id: String,
    #[serde(deserialize_with = "or_default")]
    pub from: String,
    pub to: Option<String>,
    pub author: Option<String>,
    pub participant: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub body: String,
    #[serde(rename = "type", deserialize_with = "or_default")]
    pub message_type: String,
    #[serde(deserialize_with = "or_default")]
    pub timestamp: i64,
    pub ack: Option<i64>,
    #[serde(deserialize_with = "or_default")]
    pub from_me: bool,
    #[serde(deserialize_with = "or_default")]
    pub has_media: bool,
    #[serde(deserialize_with = "or_default")]
    pub has_quoted_msg: bool,
    #[serde(deserialize_with = "or_default")]
    pub has_reaction: bool,
    #[serde(deserialize_with = "or_default")]
    pub is_forwarded: bool,
    #[serde(deserialize_with = "or_default")]
    pub is_gif: bool,
    #[serde(deserialize_with = "or_default")]
    pub is_starred: bool,
    #[serde(deserialize_with = "or_default")]
    pub is_status: bool,
    #[serde(deserialize_with = "or_default")]
    pub is_ephemeral: bool,
    #[serde(deserialize_with = "or_default")]
    pub broadcast: bool,
    #[serde(deserialize_with = "or_default")]
    pub forwarding_score: u32,
    #[serde(deserialize_with = "id_list")]
    pub mentioned_ids: Vec<String>,
    #[serde(deserialize_with = "group_mention_list")]
    pub group_mentions: Vec<String>,
    #[serde(deserialize_with = "link_list")]
    pub links: Option<Vec<String>>,
    #[serde(rename = "vCards", deserialize_with = "or_default")]
    pub vcards: Vec<String>,
    pub location: Option<Value>,
    pub duration: Option<Value>,
    pub device_type: Option<String>,
}

/// First string found at `value`, or under any of `keys`, recursively
fn extract_string(value: &Value, keys: &[&str]) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(obj) => keys
            .iter()
            .find_map(|key| obj.get(*key).and_then(|inner| extract_string(inner, keys))),
        _ => None,
    }
}

fn string_list(value: &Value, keys: &[&str]) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| extract_string(item, keys))
            .collect(),
        _ => Vec::new(),
    }
}

/// Treat an explicit `null` like a missing field
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn serialized_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(extract_string(&value, &["_serialized", "id"]).unwrap_or_default())
}

fn id_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(string_list(&value, &["_serialized", "id"]))
}

fn group_mention_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(string_list(&value, &["groupJid", "id", "_serialized"]))
}

fn link_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(string_list(&other, &["link", "url"])),
    })
}
