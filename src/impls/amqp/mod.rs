mod client;
mod message;

pub use client::{AmqpAcknowledger, AmqpBroker, AmqpSource};
