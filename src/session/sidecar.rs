//! Session adapter for a REST sidecar
//!
//! The authenticated WhatsApp Web connection lives in a sidecar process that
//! exposes a small REST API. Sends and media downloads are plain requests;
//! session events are polled and pushed into the inbound event channel.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use super::{
    ClientSession, DownloadedMedia, MediaFetcher, MessageContent, PlatformEvent, SentMessage,
    SharedSessionState,
};
use crate::messaging::SendOptions;
use crate::{Error, Result};

/// Status reported by `GET {base}/status`
#[derive(Debug, Clone, Deserialize)]
pub struct SidecarStatus {
    pub ready: bool,
    #[serde(default)]
    pub qr: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    chat_id: &'a str,
    content: WireContent<'a>,
    options: &'a SendOptions,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireContent<'a> {
    Text {
        body: &'a str,
    },
    Media {
        mimetype: &'a str,
        data: String,
        filename: Option<&'a str>,
    },
}

impl<'a> From<&'a MessageContent> for WireContent<'a> {
    fn from(content: &'a MessageContent) -> Self {
        match content {
            MessageContent::Text(body) => Self::Text { body },
            MessageContent::Media(payload) => Self::Media {
                mimetype: &payload.mime_type,
                data: BASE64.encode(&payload.data),
                filename: payload.filename.as_deref(),
            },
        }
    }
}

/// [`ClientSession`] backed by the sidecar REST API
#[derive(Debug, Clone)]
pub struct SidecarSession {
    /// Base URL, without trailing slash
    api_url: String,
    client: Client,
    state: SharedSessionState,
}

impl SidecarSession {
    /// Create an adapter for the sidecar at `api_url`
    ///
    /// Readiness is read from `state`, which the event loop keeps current.
    #[must_use]
    pub fn new(api_url: impl Into<String>, state: SharedSessionState) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
            state,
        }
    }

    /// Query the sidecar status and seed the shared state with it
    ///
    /// # Errors
    ///
    /// Returns error if the sidecar is unreachable or answers with an error
    pub async fn probe_status(&self) -> Result<SidecarStatus> {
        let url = format!("{}/status", self.api_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Session(format!("sidecar not reachable: {e}")))?;

        let status: SidecarStatus = check(response, Error::Session).await?.json().await?;
        self.state.seed(status.ready, status.qr.clone());
        tracing::info!(ready = status.ready, qr_pending = status.qr.is_some(), "sidecar status");
        Ok(status)
    }

    /// Fetch pending events
    ///
    /// Events this bridge does not know are skipped.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a JSON array
    pub async fn poll_events(&self) -> Result<Vec<PlatformEvent>> {
        let url = format!("{}/events", self.api_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Session(format!("event poll error: {e}")))?;

        let items: Vec<Value> = check(response, Error::Session).await?.json().await?;
        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<PlatformEvent>(item) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!(error = %e, "dropping session event that failed to parse");
                    None
                }
            })
            .collect())
    }

    /// Spawn a background task that polls for events every `interval`
    ///
    /// Events go into `tx` in the order the sidecar returned them. The task
    /// ends when the receiving side is dropped.
    pub fn start_polling(
        &self,
        tx: mpsc::Sender<PlatformEvent>,
        interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let poller = self.clone();

        tokio::spawn(async move {
            loop {
                match poller.poll_events().await {
                    Ok(events) => {
                        if !events.is_empty() {
                            tracing::debug!(count = events.len(), "session events received");
                        }
                        for event in events {
                            if tx.send(event).await.is_err() {
                                tracing::debug!("event channel closed, stopping poller");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "session poll error");
                    }
                }

                tokio::time::sleep(interval).await;
            }
        })
    }
}

/// Turn a non-2xx response into an error carrying the sidecar's reason
async fn check(response: Response, wrap: fn(String) -> Error) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let reason = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else {
                body
            }
        });
    Err(wrap(reason))
}

#[async_trait]
impl MediaFetcher for SidecarSession {
    async fn download_media(&self, message_id: &str) -> Result<DownloadedMedia> {
        let url = format!(
            "{}/messages/{}/media",
            self.api_url,
            urlencoding::encode(message_id)
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Session(format!("media download error: {e}")))?;

        Ok(check(response, Error::Session).await?.json().await?)
    }
}

#[async_trait]
impl ClientSession for SidecarSession {
    fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    async fn send(
        &self,
        chat_id: &str,
        content: &MessageContent,
        options: &SendOptions,
    ) -> Result<SentMessage> {
        let url = format!("{}/messages", self.api_url);
        let request = SendRequest {
            chat_id,
            content: WireContent::from(content),
            options,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Send(e.to_string()))?;

        let sent: SentMessage = check(response, Error::Send)
            .await?
            .json()
            .await
            .map_err(|e| Error::Send(format!("unexpected send response: {e}")))?;

        tracing::debug!(chat_id, message_id = %sent.id, "sidecar accepted message");
        Ok(sent)
    }
}
