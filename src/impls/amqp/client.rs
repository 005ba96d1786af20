use crate::config::BrokerSettings;
use crate::{Acknowledger, BrokerError, DeliveryTag, InboundMessage, MessageSource};
use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, Consumer};
use uuid::Uuid;

// AMQP reply-success, sent with every orderly close.
const REPLY_SUCCESS: u16 = 200;

pub struct AmqpBroker {
    connection: Connection,
    channel: Channel,
    queue: String,
}

impl AmqpBroker {
    /// Open a connection plus one channel and declare the queue as durable,
    /// so queued messages survive a broker restart.
    pub async fn connect(settings: &BrokerSettings) -> Result<Self, BrokerError> {
        let connection = Connection::connect(&settings.amqp_uri(), ConnectionProperties::default())
            .await
            .map_err(|err| BrokerError::Connect(err.to_string()))?;
        let channel = connection
            .create_channel()
            .await
            .map_err(|err| BrokerError::Connect(err.to_string()))?;
        channel
            .queue_declare(
                &settings.queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|err| BrokerError::Declare(err.to_string()))?;
        log::info!(
            "Connected to broker: host={}, queue={}",
            settings.host,
            settings.queue
        );
        Ok(Self {
            connection,
            channel,
            queue: settings.queue.clone(),
        })
    }

    /// Start a manual-ack subscription on the declared queue.
    pub async fn subscribe(&self) -> Result<AmqpSource, BrokerError> {
        let tag = format!("message-relay-{}", Uuid::new_v4());
        let consumer = self
            .channel
            .basic_consume(
                &self.queue,
                &tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|err| BrokerError::Subscribe(err.to_string()))?;
        log::info!("Consuming: queue={}, consumer_tag={tag}", self.queue);
        Ok(AmqpSource { consumer })
    }

    /// Ack/nack handle on this broker's channel. Delivery tags from
    /// [`subscribe`](Self::subscribe) are scoped to that same channel.
    pub fn acknowledger(&self) -> AmqpAcknowledger {
        AmqpAcknowledger {
            channel: self.channel.clone(),
        }
    }

    pub async fn close(self) -> Result<(), BrokerError> {
        self.channel
            .close(REPLY_SUCCESS, "shutting down")
            .await
            .map_err(|err| BrokerError::Close(err.to_string()))?;
        self.connection
            .close(REPLY_SUCCESS, "shutting down")
            .await
            .map_err(|err| BrokerError::Close(err.to_string()))?;
        Ok(())
    }
}

pub struct AmqpSource {
    consumer: Consumer,
}

#[async_trait]
impl MessageSource for AmqpSource {
    async fn next_delivery(&mut self) -> Result<Option<InboundMessage>, BrokerError> {
        match self.consumer.next().await {
            Some(Ok(delivery)) => Ok(Some(InboundMessage::from(delivery))),
            Some(Err(err)) => Err(BrokerError::Receive(err.to_string())),
            None => Ok(None),
        }
    }
}

pub struct AmqpAcknowledger {
    channel: Channel,
}

#[async_trait]
impl Acknowledger for AmqpAcknowledger {
    async fn ack(&mut self, tag: DeliveryTag) -> Result<(), BrokerError> {
        self.channel
            .basic_ack(tag, BasicAckOptions::default())
            .await
            .map_err(|err| BrokerError::Resolve(err.to_string()))
    }

    async fn nack(&mut self, tag: DeliveryTag, requeue: bool) -> Result<(), BrokerError> {
        self.channel
            .basic_nack(
                tag,
                BasicNackOptions {
                    requeue,
                    ..BasicNackOptions::default()
                },
            )
            .await
            .map_err(|err| BrokerError::Resolve(err.to_string()))
    }
}
