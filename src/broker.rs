use crate::message::{DeliveryTag, InboundMessage};
use async_trait::async_trait;
use thiserror::Error;

/// Broker-side failures. Everything here is fatal to the relay: there is no
/// reconnect loop, the process exits and the host supervisor restarts it.
/// The one exception is `Resolve`, which is logged per delivery and leaves
/// the message unacknowledged for redelivery.
#[derive(Debug, Clone, Error)]
pub enum BrokerError {
    #[error("broker connection failed: {0}")]
    Connect(String),

    #[error("queue declaration failed: {0}")]
    Declare(String),

    #[error("consumer registration failed: {0}")]
    Subscribe(String),

    #[error("message stream failed: {0}")]
    Receive(String),

    #[error("acknowledgment failed: {0}")]
    Resolve(String),

    #[error("broker shutdown failed: {0}")]
    Close(String),
}

// This trait abstracts the inbound half of the broker channel: a durable,
// ordered stream of deliveries. Implementations own the underlying consumer
// registration.
#[async_trait]
pub trait MessageSource: Send {
    /// Wait for the next delivery. `Ok(None)` means the broker ended the
    /// subscription, which the relay treats the same as a stream failure.
    async fn next_delivery(&mut self) -> Result<Option<InboundMessage>, BrokerError>;
}

// This trait abstracts the outbound half of the broker channel. The channel
// protocol is not safe for interleaved calls from several tasks, so exactly
// one owner issues these calls, strictly one at a time.
#[async_trait]
pub trait Acknowledger: Send {
    async fn ack(&mut self, tag: DeliveryTag) -> Result<(), BrokerError>;

    async fn nack(&mut self, tag: DeliveryTag, requeue: bool) -> Result<(), BrokerError>;
}
