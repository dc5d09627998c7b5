//! Media loading for outbound sends
//!
//! Resolves a [`MediaRef`] to bytes before the session is touched, so an
//! unreadable file or dead URL fails as `MediaUnavailable` without a send
//! attempt.

use std::path::Path;

use serde::Serialize;

use super::directive::MediaRef;
use crate::{Error, Result};

/// Fallback MIME type for unknown content
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Media bytes ready for the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub filename: Option<String>,
}

impl MediaPayload {
    /// Broad media category from the MIME type
    #[must_use]
    pub fn media_type(&self) -> MediaType {
        MediaType::from_mime(&self.mime_type)
    }
}

/// Broad category of a media payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaType {
    /// Determine media type from MIME type
    #[must_use]
    pub fn from_mime(mime_type: &str) -> Self {
        let lower = mime_type.to_lowercase();
        if lower.starts_with("image/") {
            Self::Image
        } else if lower.starts_with("video/") {
            Self::Video
        } else if lower.starts_with("audio/") {
            Self::Audio
        } else {
            Self::Document
        }
    }
}

/// Guess a MIME type from a file name or URL path
#[must_use]
pub fn mime_from_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("3gp") => "video/3gpp",
        Some("mov") => "video/quicktime",
        Some("mp3") => "audio/mpeg",
        Some("ogg" | "opus") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        Some("aac") => "audio/aac",
        Some("wav") => "audio/wav",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("vcf") => "text/vcard",
        Some("zip") => "application/zip",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => OCTET_STREAM,
    }
}

/// Loads media from disk or the network
#[derive(Debug, Clone, Default)]
pub struct MediaLoader {
    client: reqwest::Client,
}

impl MediaLoader {
    /// Create a loader using the given HTTP client
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Resolve a media reference to bytes
    ///
    /// # Errors
    ///
    /// Returns `MediaUnavailable` if the file cannot be read or the download fails
    pub async fn load(&self, media: &MediaRef) -> Result<MediaPayload> {
        match media {
            MediaRef::Path(path) => load_file(path).await,
            MediaRef::Url(url) => self.download(url).await,
            MediaRef::Bytes {
                data,
                mime_type,
                filename,
            } => {
                if data.is_empty() {
                    return Err(Error::MediaUnavailable("inline media is empty".to_string()));
                }
                Ok(MediaPayload {
                    data: data.clone(),
                    mime_type: mime_type.clone(),
                    filename: filename.clone(),
                })
            }
        }
    }

    async fn download(&self, url: &str) -> Result<MediaPayload> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::MediaUnavailable(format!("download failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::MediaUnavailable(format!(
                "download failed: {}",
                response.status()
            )));
        }

        let header_mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty() && v != OCTET_STREAM);

        let filename = url::Url::parse(url).ok().and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(ToString::to_string))
                .filter(|s| !s.is_empty())
        });

        let data = response
            .bytes()
            .await
            .map_err(|e| Error::MediaUnavailable(format!("read failed: {e}")))?;

        let mime_type = header_mime.unwrap_or_else(|| {
            mime_from_name(filename.as_deref().unwrap_or_default()).to_string()
        });

        tracing::debug!(url, bytes = data.len(), mime = %mime_type, "downloaded media");

        Ok(MediaPayload {
            data: data.to_vec(),
            mime_type,
            filename,
        })
    }
}

async fn load_file(path: &Path) -> Result<MediaPayload> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| Error::MediaUnavailable(format!("{}: {e}", path.display())))?;

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(ToString::to_string);

    Ok(MediaPayload {
        data,
        mime_type: mime_from_name(&path.to_string_lossy()).to_string(),
        filename,
    })
}
