//! Delivers queued JSON messages to an HTTP API with at-least-once
//! semantics: every delivery ends acknowledged, requeued for another
//! attempt, or discarded as unprocessable.

pub mod config;
pub mod impls;
pub mod logging;

mod broker;
mod envelope;
mod forwarder;
mod message;
mod outcome;
mod relay;

#[cfg(test)]
pub(crate) mod test_utils;

pub use broker::{Acknowledger, BrokerError, MessageSource};
pub use envelope::{DecodeError, HttpMethod, RequestEnvelope};
pub use forwarder::{AttemptOutcome, Forwarder};
pub use message::{DeliveryTag, InboundMessage};
pub use outcome::{classify, Disposition};
pub use relay::{Relay, RelayError};
