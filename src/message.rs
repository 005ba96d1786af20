/// Token identifying one delivery attempt. Only the broker backend that
/// produced it can interpret it; everything else passes it through.
pub type DeliveryTag = u64;

/// One inbound delivery as handed over by the broker: the raw payload plus
/// the tag that must be surrendered through exactly one ack or nack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub delivery_tag: DeliveryTag,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(delivery_tag: DeliveryTag, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            delivery_tag,
            payload: payload.into(),
        }
    }
}
