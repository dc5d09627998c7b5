//! Shared test utilities

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use base64::Engine as _;
use tokio::sync::Mutex;
use wa_bridge::messaging::SendOptions;
use wa_bridge::session::{
    ClientSession, DownloadedMedia, MediaFetcher, MessageContent, SentMessage,
};
use wa_bridge::{Error, Result};

/// A send as the mock session saw it
#[derive(Debug, Clone)]
pub struct RecordedSend {
    pub chat_id: String,
    pub content: MessageContent,
    pub options: SendOptions,
}

/// Mock session recording every send
pub struct MockSession {
    ready: AtomicBool,
    /// Chat ids whose sends fail
    failing: Vec<String>,
    /// Payload returned for media downloads
    media: Option<Vec<u8>>,
    pub sent: Arc<Mutex<Vec<RecordedSend>>>,
}

impl MockSession {
    pub fn ready() -> Self {
        Self {
            ready: AtomicBool::new(true),
            failing: Vec::new(),
            media: None,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn not_ready() -> Self {
        let session = Self::ready();
        session.set_ready(false);
        session
    }

    #[must_use]
    pub fn failing_for(mut self, chat_id: &str) -> Self {
        self.failing.push(chat_id.to_string());
        self
    }

    #[must_use]
    pub fn with_media(mut self, data: Vec<u8>) -> Self {
        self.media = Some(data);
        self
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub async fn sent_messages(&self) -> Vec<RecordedSend> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl MediaFetcher for MockSession {
    async fn download_media(&self, _message_id: &str) -> Result<DownloadedMedia> {
        let data = self
            .media
            .as_ref()
            .ok_or_else(|| Error::Session("media no longer available".to_string()))?;
        Ok(DownloadedMedia {
            mime_type: "image/jpeg".to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(data),
            filename: None,
        })
    }
}

#[async_trait]
impl ClientSession for MockSession {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn send(
        &self,
        chat_id: &str,
        content: &MessageContent,
        options: &SendOptions,
    ) -> Result<SentMessage> {
        self.sent.lock().await.push(RecordedSend {
            chat_id: chat_id.to_string(),
            content: content.clone(),
            options: options.clone(),
        });

        if self.failing.iter().any(|f| f == chat_id) {
            return Err(Error::Send("Evaluation failed: invalid wid".to_string()));
        }

        Ok(SentMessage {
            id: format!("true_{chat_id}_3EB0C767D26A1D"),
            ack: Some(0),
            timestamp: Some(1_700_000_000),
        })
    }
}

/// Bodies recorded by a local webhook receiver
pub type Received = Arc<Mutex<Vec<serde_json::Value>>>;

/// Start a receiver on `/hook` that records every JSON body
///
/// Each request waits `delay` and then answers with `status`.
pub async fn start_receiver_with(
    status: axum::http::StatusCode,
    delay: std::time::Duration,
) -> (String, Received) {
    use axum::{Json, Router, extract::State, routing::post};

    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/hook",
            post(
                move |State(received): State<Received>, Json(body): Json<serde_json::Value>| async move {
                    received.lock().await.push(body);
                    tokio::time::sleep(delay).await;
                    status
                },
            ),
        )
        .with_state(Arc::clone(&received));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/hook"), received)
}

/// Start a receiver that answers 200 immediately
pub async fn start_receiver() -> (String, Received) {
    start_receiver_with(axum::http::StatusCode::OK, std::time::Duration::ZERO).await
}

/// Wait until `count` bodies have arrived
pub async fn wait_for(received: &Received, count: usize) -> Vec<serde_json::Value> {
    for _ in 0..100 {
        {
            let bodies = received.lock().await;
            if bodies.len() >= count {
                return bodies.clone();
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("expected {count} forwarded events");
}
