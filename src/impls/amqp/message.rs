use crate::InboundMessage;
use lapin::message::Delivery;

impl From<Delivery> for InboundMessage {
    fn from(value: Delivery) -> Self {
        InboundMessage::new(value.delivery_tag, value.data)
    }
}
