//! Fully resolved outbound message directives

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::options::{PartialSendOptions, SendOptions, resolve};

/// Kind of outbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text
    Text,
    /// Image, video, audio, document or sticker, with optional caption
    Media,
}

impl MessageKind {
    /// Lowercase name used in responses
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Media => "media",
        }
    }
}

/// Where media for a send comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    /// Local file path
    Path(PathBuf),
    /// Remote `http(s)` URL
    Url(String),
    /// Bytes supplied inline
    Bytes {
        data: Vec<u8>,
        mime_type: String,
        filename: Option<String>,
    },
}

impl MediaRef {
    /// Interpret a caller-supplied `mediaUrl`
    ///
    /// `http`/`https` URLs are fetched remotely, `file://` URLs and anything
    /// else are treated as local paths.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match url::Url::parse(input) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Url(input.to_string()),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_or_else(|()| Self::Path(PathBuf::from(input)), Self::Path),
            _ => Self::Path(PathBuf::from(input)),
        }
    }

    /// Short description for logs and failure records
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
            Self::Bytes {
                filename, data, ..
            } => format!(
                "{} ({} bytes)",
                filename.as_deref().unwrap_or("inline media"),
                data.len()
            ),
        }
    }
}

/// A message ready to hand to the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendDirective {
    pub kind: MessageKind,
    pub body: Option<String>,
    pub media: Option<MediaRef>,
    pub options: SendOptions,
}

impl SendDirective {
    /// Text directive with resolved options
    #[must_use]
    pub fn text(body: impl Into<String>, partial: &PartialSendOptions) -> Self {
        Self {
            kind: MessageKind::Text,
            body: Some(body.into()),
            media: None,
            options: resolve(partial, MessageKind::Text),
        }
    }

    /// Media directive with resolved options
    ///
    /// The body doubles as the caption unless the options carry one.
    #[must_use]
    pub fn media(media: MediaRef, body: Option<String>, partial: &PartialSendOptions) -> Self {
        let body = body.filter(|b| !b.is_empty());
        let mut options = resolve(partial, MessageKind::Media);
        if options.caption.is_none() {
            options.caption.clone_from(&body);
        }
        Self {
            kind: MessageKind::Media,
            body,
            media: Some(media),
            options,
        }
    }
}
