//! Daemon - the main bridge service
//!
//! Wires the session sidecar, the inbound event loop and the HTTP API, then
//! runs until interrupted.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::ApiServerBuilder;
use crate::inbound::{WebhookForwarder, event_channel, run_event_loop};
use crate::session::{ClientSession, SessionState, SidecarSession};
use crate::{Config, Error, Result};

/// The bridge daemon
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a new daemon instance
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the daemon until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if the API server fails to bind or stops unexpectedly
    pub async fn run(self) -> Result<()> {
        let config = self.config;
        tracing::info!(
            port = config.server.port,
            webhook_path = %config.server.webhook_path,
            session_api = %config.session.api_url,
            "daemon running"
        );

        let state = SessionState::shared();
        let sidecar = Arc::new(SidecarSession::new(
            config.session.api_url.clone(),
            Arc::clone(&state),
        ));

        // The sidecar may still be starting; polling picks up its events later
        if let Err(e) = sidecar.probe_status().await {
            tracing::warn!(error = %e, "session status unavailable, waiting for events");
        }

        let (event_tx, event_rx) = event_channel();
        let poller = sidecar.start_polling(event_tx, config.session.poll_interval);

        let forwarder = WebhookForwarder::from_config(&config.forward);
        if !forwarder.is_enabled() {
            tracing::info!("no forward webhook configured, inbound events will be dropped");
        }

        let session: Arc<dyn ClientSession> = sidecar;
        let event_loop = tokio::spawn(run_event_loop(
            event_rx,
            Arc::clone(&session),
            Arc::clone(&state),
            forwarder.clone(),
        ));

        let server = ApiServerBuilder::new(session, state, config.server.port)
            .webhook_path(config.server.webhook_path)
            .verify_token(config.server.verify_token)
            .forwarder(forwarder)
            .forward_sent_events(config.forward.sent_events)
            .build()
            .spawn();

        // Set up shutdown signal
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(()).await;
            }
        });

        let outcome = tokio::select! {
            _ = shutdown_rx.recv() => {
                tracing::info!("shutdown requested");
                Ok(())
            }
            joined = server => match joined {
                Ok(result) => result,
                Err(e) => Err(Error::Config(format!("API server task failed: {e}"))),
            },
        };

        poller.abort();
        event_loop.abort();

        tracing::info!("daemon stopped");
        outcome
    }
}
