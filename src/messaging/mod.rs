//! Outbound messaging
//!
//! Caller input is turned into a [`SendDirective`] with fully resolved
//! [`SendOptions`], then handed to the [`OutboundDispatcher`] for a single
//! target or the [`BulkDispatcher`] for many.

pub mod bulk;
pub mod directive;
pub mod dispatch;
pub mod media;
pub mod options;
pub mod target;

pub use bulk::{BulkDispatcher, BulkSummary};
pub use directive::{MediaRef, MessageKind, SendDirective};
pub use dispatch::{OutboundDispatcher, SendFailure, SendReceipt, SendResult, SentNotification};
pub use media::{MediaLoader, MediaPayload, MediaType};
pub use options::{PartialSendOptions, SendOptions, resolve};
pub use target::{ChatKind, Target, strip_suffixes};
