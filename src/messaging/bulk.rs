//! Sequential fan-out of one directive to many targets

use serde::Serialize;

use super::directive::SendDirective;
use super::dispatch::{OutboundDispatcher, SendFailure, SendResult};
use super::target::Target;

/// Aggregate outcome of a bulk send
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// One entry per target, in input order
    pub results: Vec<SendResult>,
}

impl From<Vec<SendResult>> for BulkSummary {
    fn from(results: Vec<SendResult>) -> Self {
        let successful = results.iter().filter(|r| r.is_ok()).count();
        Self {
            total: results.len(),
            successful,
            failed: results.len() - successful,
            results,
        }
    }
}

/// Sends to each target in turn
///
/// Sends are strictly sequential so a single session never sees parallel
/// sends. A failing target becomes a `Failed` entry and never stops the
/// remaining targets. There is no retry.
#[derive(Clone)]
pub struct BulkDispatcher {
    dispatcher: OutboundDispatcher,
}

impl BulkDispatcher {
    #[must_use]
    pub const fn new(dispatcher: OutboundDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Send `directive` to every target
    ///
    /// The returned vector has exactly one result per target, positionally
    /// matching `targets`.
    pub async fn send_bulk(&self, targets: &[Target], directive: &SendDirective) -> Vec<SendResult> {
        let mut results = Vec::with_capacity(targets.len());

        for (index, target) in targets.iter().enumerate() {
            let result = match self.dispatcher.send(target, directive).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!(index, target = %target, error = %e, retryable = e.is_retryable(), "bulk send failed");
                    SendResult::Failed(SendFailure::new(target, e.to_string()))
                }
            };
            results.push(result);
        }

        tracing::info!(
            total = results.len(),
            successful = results.iter().filter(|r| r.is_ok()).count(),
            "bulk send complete"
        );
        results
    }
}
