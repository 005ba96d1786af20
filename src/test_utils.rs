use crate::{
    Acknowledger, AttemptOutcome, BrokerError, DeliveryTag, Forwarder, InboundMessage,
    MessageSource, RequestEnvelope,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub(crate) struct MockForwarder {
    outcome: AttemptOutcome,
    delay: Option<Duration>,
    calls: Mutex<Vec<RequestEnvelope>>,
}

impl MockForwarder {
    pub(crate) fn returning(outcome: AttemptOutcome) -> Self {
        Self {
            outcome,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn returning_after(delay: Duration, outcome: AttemptOutcome) -> Self {
        Self {
            outcome,
            delay: Some(delay),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<RequestEnvelope> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Forwarder for MockForwarder {
    async fn forward(
        &self,
        envelope: &RequestEnvelope,
        _cancel: &CancellationToken,
    ) -> AttemptOutcome {
        self.calls.lock().unwrap().push(envelope.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution {
    Ack,
    NackRequeue,
    NackDiscard,
}

/// Records every ack/nack in arrival order. Clones share the log, so a test
/// can hand one clone to the relay and read through another.
#[derive(Clone)]
pub(crate) struct MockAcknowledger {
    resolutions: Arc<Mutex<Vec<(DeliveryTag, Resolution)>>>,
}

impl MockAcknowledger {
    pub(crate) fn new() -> Self {
        Self {
            resolutions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn resolutions(&self) -> Vec<(DeliveryTag, Resolution)> {
        self.resolutions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Acknowledger for MockAcknowledger {
    async fn ack(&mut self, tag: DeliveryTag) -> Result<(), BrokerError> {
        self.resolutions.lock().unwrap().push((tag, Resolution::Ack));
        Ok(())
    }

    async fn nack(&mut self, tag: DeliveryTag, requeue: bool) -> Result<(), BrokerError> {
        let resolution = if requeue {
            Resolution::NackRequeue
        } else {
            Resolution::NackDiscard
        };
        self.resolutions.lock().unwrap().push((tag, resolution));
        Ok(())
    }
}

/// Plays back a scripted sequence of deliveries, then either pends forever
/// (a healthy but idle queue) or reports whatever ending the script holds.
pub(crate) struct ScriptedSource {
    items: VecDeque<Result<Option<InboundMessage>, BrokerError>>,
    pend_when_empty: bool,
}

impl ScriptedSource {
    pub(crate) fn deliveries(messages: Vec<InboundMessage>) -> Self {
        Self {
            items: messages.into_iter().map(|m| Ok(Some(m))).collect(),
            pend_when_empty: true,
        }
    }

    pub(crate) fn closing_after(messages: Vec<InboundMessage>) -> Self {
        Self {
            items: messages.into_iter().map(|m| Ok(Some(m))).collect(),
            pend_when_empty: false,
        }
    }

    pub(crate) fn failing_after(messages: Vec<InboundMessage>, error: BrokerError) -> Self {
        let mut items: VecDeque<_> = messages.into_iter().map(|m| Ok(Some(m))).collect();
        items.push_back(Err(error));
        Self {
            items,
            pend_when_empty: true,
        }
    }
}

#[async_trait]
impl MessageSource for ScriptedSource {
    async fn next_delivery(&mut self) -> Result<Option<InboundMessage>, BrokerError> {
        match self.items.pop_front() {
            Some(item) => item,
            None if self.pend_when_empty => std::future::pending().await,
            None => Ok(None),
        }
    }
}
