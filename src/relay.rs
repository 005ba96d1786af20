use crate::broker::{Acknowledger, BrokerError, MessageSource};
use crate::envelope::{DecodeError, RequestEnvelope};
use crate::forwarder::{AttemptOutcome, Forwarder};
use crate::message::{DeliveryTag, InboundMessage};
use crate::outcome::{classify, Disposition};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Failures that end the consumer loop. Per-message problems never surface
/// here; they are resolved against the broker and the loop keeps going.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Stream(#[from] BrokerError),

    #[error("message stream closed by the broker")]
    StreamClosed,
}

pub struct Relay {
    forwarder: Arc<dyn Forwarder>,
}

impl Relay {
    pub fn new(forwarder: Arc<dyn Forwarder>) -> Self {
        Self { forwarder }
    }

    /// Consume deliveries until `shutdown` fires or the stream fails.
    ///
    /// Each delivery is handled on its own task, so attempts run
    /// concurrently and may resolve out of arrival order. All ack/nack
    /// traffic is funneled to a single resolver task that owns the
    /// [`Acknowledger`], because the channel protocol does not tolerate
    /// interleaved calls from several tasks.
    ///
    /// On shutdown the relay stops pulling deliveries, waits for in-flight
    /// handlers (their forward calls observe the cancellation token), lets
    /// the resolver flush every queued disposition, and only then returns.
    pub async fn run(
        &self,
        mut source: Box<dyn MessageSource>,
        acknowledger: Box<dyn Acknowledger>,
        shutdown: CancellationToken,
    ) -> Result<(), RelayError> {
        let (decisions_tx, decisions_rx) = mpsc::unbounded_channel();
        let resolver = tokio::spawn(resolve_loop(acknowledger, decisions_rx));
        let handlers = TaskTracker::new();

        log::debug!("Consumer loop started");
        let mut stream_failure = None;
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                next = source.next_delivery() => match next {
                    Ok(Some(message)) => {
                        handlers.spawn(process_delivery(
                            Arc::clone(&self.forwarder),
                            message,
                            decisions_tx.clone(),
                            shutdown.child_token(),
                        ));
                    }
                    Ok(None) => {
                        log::error!("Message stream ended while consuming");
                        stream_failure = Some(RelayError::StreamClosed);
                        break;
                    }
                    Err(err) => {
                        log::error!("Message stream failed: error={err}");
                        stream_failure = Some(RelayError::Stream(err));
                        break;
                    }
                },
            }
        }

        log::info!("Draining in-flight deliveries");
        handlers.close();
        handlers.wait().await;

        // Handler-held senders are gone once the tracker is drained;
        // dropping ours lets the resolver flush the backlog and stop.
        drop(decisions_tx);
        if resolver.await.is_err() {
            log::error!("Resolver task panicked during drain");
        }
        log::info!("Consumer loop stopped");

        match stream_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Handle one delivery from raw bytes to a resolved disposition. Nothing
/// escapes this task: errors are classified, panics are caught and resolved
/// as a discard for this message alone.
async fn process_delivery(
    forwarder: Arc<dyn Forwarder>,
    message: InboundMessage,
    decisions: mpsc::UnboundedSender<(DeliveryTag, Disposition)>,
    cancel: CancellationToken,
) {
    let tag = message.delivery_tag;
    let attempt = AssertUnwindSafe(attempt_delivery(
        forwarder.as_ref(),
        &message.payload,
        &cancel,
    ))
    .catch_unwind()
    .await;

    let disposition = match attempt {
        Ok(result) => {
            if let Err(err) = &result {
                log::error!("Message processing failed: error={err}, tag={tag}");
            }
            classify(&result)
        }
        Err(panic) => {
            log::error!(
                "Message handler panicked: panic={}, tag={tag}",
                panic_reason(panic.as_ref())
            );
            Disposition::Discard
        }
    };

    if decisions.send((tag, disposition)).is_err() {
        log::error!("Resolver gone before delivery could be resolved: tag={tag}");
    }
}

async fn attempt_delivery(
    forwarder: &dyn Forwarder,
    payload: &[u8],
    cancel: &CancellationToken,
) -> Result<AttemptOutcome, DecodeError> {
    let envelope = RequestEnvelope::decode(payload)?;
    let outcome = forwarder.forward(&envelope, cancel).await;
    match &outcome {
        AttemptOutcome::Delivered => {
            log::info!("Processed message with {}", envelope.method);
        }
        AttemptOutcome::Rejected(status) => {
            log::warn!("API rejected message: status={status}");
        }
        AttemptOutcome::Failed(reason) => {
            log::error!("Delivery attempt failed: reason={reason}");
        }
    }
    Ok(outcome)
}

/// Apply dispositions against the broker, strictly one at a time. Runs until
/// every sender is dropped, which happens only after the handler tracker is
/// drained, so no resolved delivery is left behind on shutdown.
async fn resolve_loop(
    mut acknowledger: Box<dyn Acknowledger>,
    mut decisions: mpsc::UnboundedReceiver<(DeliveryTag, Disposition)>,
) {
    while let Some((tag, disposition)) = decisions.recv().await {
        let applied = match disposition {
            Disposition::Ack => acknowledger.ack(tag).await,
            Disposition::Requeue => acknowledger.nack(tag, true).await,
            Disposition::Discard => acknowledger.nack(tag, false).await,
        };
        if let Err(err) = applied {
            log::error!("Failed to resolve delivery: tag={tag}, error={err}");
        }
    }
}

fn panic_reason(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "opaque panic payload"
    }
}
