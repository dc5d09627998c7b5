//! HTTP API server for the bridge

pub mod health;
pub mod qr;
pub mod webhook;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::config::DEFAULT_WEBHOOK_PATH;
use crate::inbound::WebhookForwarder;
use crate::messaging::{BulkDispatcher, MediaLoader, OutboundDispatcher};
use crate::session::{ClientSession, SharedSessionState};

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: OutboundDispatcher,
    pub bulk: BulkDispatcher,
    /// Pending pairing code
    pub session_state: SharedSessionState,
    /// Used for `message:sent` notifications
    pub forwarder: WebhookForwarder,
    pub verify_token: String,
    pub forward_sent_events: bool,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    session: Arc<dyn ClientSession>,
    session_state: SharedSessionState,
    port: u16,
    webhook_path: String,
    verify_token: String,
    forwarder: WebhookForwarder,
    forward_sent_events: bool,
    media_loader: MediaLoader,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub fn new(session: Arc<dyn ClientSession>, session_state: SharedSessionState, port: u16) -> Self {
        Self {
            session,
            session_state,
            port,
            webhook_path: DEFAULT_WEBHOOK_PATH.to_string(),
            verify_token: crate::config::DEFAULT_VERIFY_TOKEN.to_string(),
            forwarder: WebhookForwarder::disabled(),
            forward_sent_events: false,
            media_loader: MediaLoader::default(),
        }
    }

    /// Set the path of the send/verify route
    #[must_use]
    pub fn webhook_path(mut self, path: impl Into<String>) -> Self {
        self.webhook_path = path.into();
        self
    }

    /// Set the token expected by the verification handshake
    #[must_use]
    pub fn verify_token(mut self, token: impl Into<String>) -> Self {
        self.verify_token = token.into();
        self
    }

    /// Set the forwarder used for `message:sent` notifications
    #[must_use]
    pub fn forwarder(mut self, forwarder: WebhookForwarder) -> Self {
        self.forwarder = forwarder;
        self
    }

    /// Forward a notification after every single send
    #[must_use]
    pub const fn forward_sent_events(mut self, enabled: bool) -> Self {
        self.forward_sent_events = enabled;
        self
    }

    /// Set the loader for outbound media
    #[must_use]
    pub fn media_loader(mut self, loader: MediaLoader) -> Self {
        self.media_loader = loader;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let dispatcher = OutboundDispatcher::new(self.session).with_loader(self.media_loader);

        let state = Arc::new(ApiState {
            bulk: BulkDispatcher::new(dispatcher.clone()),
            dispatcher,
            session_state: self.session_state,
            forwarder: self.forwarder,
            verify_token: self.verify_token,
            forward_sent_events: self.forward_sent_events,
        });

        ApiServer {
            state,
            port: self.port,
            webhook_path: self.webhook_path,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    webhook_path: String,
}

impl ApiServer {
    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let router = Router::new()
            .merge(webhook::router(self.state.clone(), &self.webhook_path))
            .merge(qr::router(self.state.clone()))
            .merge(health::router(self.state.clone()));

        // CORS layer for cross-origin callers
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, webhook_path = %self.webhook_path, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
