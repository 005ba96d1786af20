use crate::envelope::RequestEnvelope;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// How one delivery attempt against the downstream API ended. The
/// distinction matters to the outcome policy: an explicit rejection by the
/// remote service is worth retrying, a failure inside our own call is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    // downstream answered with a 2xx status
    Delivered,

    // downstream answered with anything outside [200, 300)
    Rejected(u16),

    // the call itself failed: connection refused, timeout, cancellation
    Failed(String),
}

#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Perform one outbound call for a decoded envelope. Invoked
    /// concurrently from independent message-handling tasks, so
    /// implementations must not keep mutable state across calls. An
    /// in-flight call must abort promptly once `cancel` fires.
    async fn forward(&self, envelope: &RequestEnvelope, cancel: &CancellationToken)
        -> AttemptOutcome;
}
