use crate::envelope::DecodeError;
use crate::forwarder::AttemptOutcome;

/// What the relay tells the broker about one delivery. Computed exactly once
/// per inbound message and applied exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    // processed; the broker may drop the message for good
    Ack,

    // reject and ask the broker to redeliver
    Requeue,

    // reject without redelivery
    Discard,
}

/// Map the result of one delivery attempt to a disposition.
///
/// Malformed input can never succeed, so decode errors are discarded rather
/// than cycling as poison messages. A non-2xx answer means the downstream
/// service saw the request and refused it, which is assumed transient. A
/// transport-level failure is treated as non-retryable so that bugs in our
/// own call path are not hidden behind endless requeues.
// TODO: carry an attempt counter in message headers and route exhausted
// messages to a dead-letter queue; today a permanently failing endpoint
// cycles the same message forever.
pub fn classify(result: &Result<AttemptOutcome, DecodeError>) -> Disposition {
    match result {
        Err(_) => Disposition::Discard,
        Ok(AttemptOutcome::Delivered) => Disposition::Ack,
        Ok(AttemptOutcome::Rejected(_)) => Disposition::Requeue,
        Ok(AttemptOutcome::Failed(_)) => Disposition::Discard,
    }
}
