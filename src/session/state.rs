//! Session lifecycle state shared with the dispatch layer

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::PlatformEvent;

/// Shared handle to [`SessionState`]
pub type SharedSessionState = Arc<SessionState>;

/// Ready flag and pending pairing code
///
/// Written only from lifecycle events; readers never wait on writers.
#[derive(Debug, Default)]
pub struct SessionState {
    ready: AtomicBool,
    qr: RwLock<Option<String>>,
}

impl SessionState {
    /// Create a shared state handle, initially not ready
    #[must_use]
    pub fn shared() -> SharedSessionState {
        Arc::new(Self::default())
    }

    /// Whether the session is ready to send
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// The QR payload waiting to be scanned, if any
    pub fn pending_qr(&self) -> Option<String> {
        self.qr
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply a lifecycle event; message events are ignored
    ///
    /// Returns `true` if the event changed lifecycle state.
    pub fn apply(&self, event: &PlatformEvent) -> bool {
        match event {
            PlatformEvent::Qr { code } => {
                tracing::info!("pairing code issued, scan via GET /qr");
                self.set_qr(Some(code.clone()));
                true
            }
            PlatformEvent::Authenticated => {
                tracing::info!("session authenticated");
                true
            }
            PlatformEvent::Ready => {
                tracing::info!("session ready");
                self.ready.store(true, Ordering::Release);
                self.set_qr(None);
                true
            }
            PlatformEvent::AuthFailure { message } => {
                tracing::error!(%message, "session authentication failure");
                self.ready.store(false, Ordering::Release);
                true
            }
            PlatformEvent::Disconnected { reason } => {
                tracing::warn!(reason = reason.as_deref().unwrap_or("unknown"), "session disconnected");
                self.ready.store(false, Ordering::Release);
                true
            }
            PlatformEvent::Message(_)
            | PlatformEvent::MessageCreate(_)
            | PlatformEvent::MessageAck { .. }
            | PlatformEvent::GroupJoin(_) => false,
        }
    }

    /// Seed state from a status probe
    pub fn seed(&self, ready: bool, qr: Option<String>) {
        self.ready.store(ready, Ordering::Release);
        self.set_qr(if ready { None } else { qr });
    }

    fn set_qr(&self, qr: Option<String>) {
        *self.qr.write().unwrap_or_else(PoisonError::into_inner) = qr;
    }
}
