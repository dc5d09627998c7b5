//! wa-bridge - HTTP and webhook bridge for a WhatsApp Web session
//!
//! This library provides the core of the bridge:
//! - Outbound sends (single, group, bulk) with resolved send options
//! - Normalization of received messages into a stable webhook schema
//! - Best-effort forwarding of events to an external webhook
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     HTTP API                          │
//! │   POST /webhook  │  GET /webhook  │  /qr  │  /health  │
//! └────────────────────┬─────────────────────────────────┘
//!                      │
//! ┌────────────────────▼─────────────────────────────────┐
//! │                   Messaging                           │
//! │   Options  │  Targets  │  Media  │  Dispatch  │ Bulk  │
//! └────────────────────┬─────────────────────────────────┘
//!                      │            ▲
//! ┌────────────────────▼────────────┴────────────────────┐
//! │                    Session                            │
//! │   ClientSession  │  SessionState  │  Sidecar poller   │
//! └────────────────────┬─────────────────────────────────┘
//!                      │ events
//! ┌────────────────────▼─────────────────────────────────┐
//! │                    Inbound                            │
//! │   Event loop  │  Normalizer  │  Webhook forwarder     │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod daemon;
pub mod error;
pub mod inbound;
pub mod messaging;
pub mod session;

pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use inbound::{InboundEvent, InboundNormalizer, WebhookForwarder};
pub use messaging::{
    BulkDispatcher, BulkSummary, OutboundDispatcher, SendDirective, SendOptions, SendResult, Target,
};
pub use session::{ClientSession, MediaFetcher, PlatformEvent, SessionState};
