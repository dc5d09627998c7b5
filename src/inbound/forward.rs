//! Best-effort delivery of events to the configured webhook
//!
//! Forwarding never fails its caller: transport errors, timeouts and
//! non-2xx responses are logged and dropped. There is no retry or queue.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::config::{FORWARD_TIMEOUT, ForwardConfig};
use crate::{Error, Result};

/// Posts JSON payloads to the forward URL
#[derive(Debug, Clone)]
pub struct WebhookForwarder {
    url: Option<String>,
    client: Client,
}

impl WebhookForwarder {
    /// Create a forwarder; `None` disables forwarding entirely
    #[must_use]
    pub fn new(url: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to build forward client, using defaults");
                Client::new()
            });
        Self { url, client }
    }

    /// Forwarder that drops every payload
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(None, FORWARD_TIMEOUT)
    }

    /// Build from configuration
    #[must_use]
    pub fn from_config(config: &ForwardConfig) -> Self {
        Self::new(config.url.clone(), config.timeout)
    }

    /// Whether a forward URL is configured
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Forward one payload, logging any failure
    pub async fn forward<T: Serialize + ?Sized>(&self, payload: &T) {
        let Some(url) = &self.url else {
            return;
        };

        match self.post(url, payload).await {
            Ok(()) => tracing::debug!(url = %url, "event forwarded"),
            Err(e) => tracing::warn!(url = %url, error = %e, "event forwarding failed"),
        }
    }

    /// Forward on a background task so the caller does not wait
    pub fn forward_detached<T: Serialize + Send + Sync + 'static>(&self, payload: T) {
        if !self.is_enabled() {
            return;
        }
        let forwarder = self.clone();
        tokio::spawn(async move {
            forwarder.forward(&payload).await;
        });
    }

    async fn post<T: Serialize + ?Sized>(&self, url: &str, payload: &T) -> Result<()> {
        let response = self.client.post(url).json(payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Forward(format!("{status} - {body}")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn disabled_forwarder_is_noop() {
        let forwarder = WebhookForwarder::disabled();
        assert!(!forwarder.is_enabled());
        tokio_test::block_on(forwarder.forward(&json!({ "event": "x" })));
    }

    #[tokio::test]
    async fn detached_forward_runs_on_a_spawned_task() {
        let forwarder = WebhookForwarder::new(
            Some("http://127.0.0.1:9/hook".to_string()),
            Duration::from_millis(200),
        );
        forwarder.forward_detached(json!({ "event": "message:ack" }));
        forwarder.forward_detached(crate::inbound::AckEvent::new(
            &serde_json::from_value(json!({ "id": "m1", "from": "1@c.us" })).unwrap(),
            1,
        ));
        WebhookForwarder::disabled().forward_detached(json!({ "event": "x" }));
    }

    #[tokio::test]
    async fn unreachable_url_does_not_fail() {
        // Port 9 (discard) on localhost is not expected to accept HTTP
        let forwarder = WebhookForwarder::new(
            Some("http://127.0.0.1:9/hook".to_string()),
            Duration::from_millis(200),
        );
        assert!(forwarder.is_enabled());
        forwarder.forward(&json!({ "event": "x" })).await;
    }

    #[test]
    fn from_config_copies_url() {
        let config = ForwardConfig {
            url: Some("https://example.com/hook".to_string()),
            timeout: FORWARD_TIMEOUT,
            sent_events: false,
        };
        assert!(WebhookForwarder::from_config(&config).is_enabled());
    }
}
