//! Inbound event handling
//!
//! Session events arrive on a bounded channel and are consumed by a single
//! loop. Lifecycle events update [`SessionState`]; received messages are
//! normalized and forwarded to the configured webhook.

mod forward;
mod links;
mod normalize;
mod raw;

use std::sync::Arc;

use tokio::sync::mpsc;

pub use forward::WebhookForwarder;
pub use links::detect_links;
pub use normalize::{
    AckEvent, ChatInfo, InboundEvent, InboundMedia, InboundNormalizer, MAX_INBOUND_MEDIA_BYTES,
};
pub use raw::RawMessage;

use crate::session::{ClientSession, MediaFetcher, PlatformEvent, SessionState};

/// Capacity of the inbound event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Create the inbound event channel
#[must_use]
pub fn event_channel() -> (mpsc::Sender<PlatformEvent>, mpsc::Receiver<PlatformEvent>) {
    mpsc::channel(EVENT_CHANNEL_CAPACITY)
}

/// Consume session events until every sender is dropped
///
/// Events are handled one at a time in arrival order. Forwarding is
/// detached, so a slow webhook never holds up the next event.
pub async fn run_event_loop(
    mut rx: mpsc::Receiver<PlatformEvent>,
    session: Arc<dyn ClientSession>,
    state: Arc<SessionState>,
    forwarder: WebhookForwarder,
) {
    let normalizer = InboundNormalizer::default();
    let fetcher: &dyn MediaFetcher = &*session;

    while let Some(event) = rx.recv().await {
        tracing::trace!(event = event.name(), "session event");

        if state.apply(&event) {
            continue;
        }

        match event {
            PlatformEvent::Message(raw) => {
                let normalized = normalizer.normalize(&raw, Some(fetcher)).await;
                tracing::info!(
                    message_id = %normalized.message_id,
                    from = %normalized.from_number,
                    kind = %normalized.content_type,
                    has_media = normalized.has_media,
                    "message received"
                );
                forwarder.forward_detached(normalized);
            }
            PlatformEvent::MessageAck { message, ack } => {
                tracing::debug!(message_id = %message.id, ack, "delivery state changed");
                forwarder.forward_detached(AckEvent::new(&message, ack));
            }
            PlatformEvent::MessageCreate(raw) => {
                tracing::debug!(message_id = %raw.id, from_me = raw.from_me, "message created");
            }
            PlatformEvent::GroupJoin(notification) => {
                tracing::info!(?notification, "group join");
            }
            // Lifecycle events were consumed by `SessionState::apply`
            _ => {}
        }
    }

    tracing::debug!("session event stream closed");
}
