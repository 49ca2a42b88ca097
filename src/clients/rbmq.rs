use std::collections::HashMap;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use lapin::{
    Channel, Connection, ConnectionProperties, Consumer, ExchangeKind,
    message::Delivery,
    options::{
        BasicAckOptions, BasicConsumeOptions, BasicQosOptions, ExchangeDeclareOptions,
        QueueBindOptions, QueueDeclareOptions,
    },
    types::{AMQPValue, FieldTable},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{clients::health::ConnectivityCheck, config::Config, models::message::InboundMessage};

/// Confirms a delivery so the broker does not redeliver it.
#[async_trait]
pub trait DeliveryAcker: Send + Sync {
    async fn acknowledge(&self, delivery_tag: u64) -> Result<(), Error>;
}

pub struct RabbitMqClient {
    connection: Connection,
    channel: Channel,
    queue_name: String,
}

impl RabbitMqClient {
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        info!("Connecting to RabbitMQ");

        let connection = Connection::connect(&config.rabbitmq_url, ConnectionProperties::default())
            .await
            .map_err(|e| anyhow!("Failed to connect to RabbitMQ: {}", e))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| anyhow!("RabbitMQ channel creation failed: {}", e))?;

        channel
            .basic_qos(config.prefetch_count, BasicQosOptions::default())
            .await
            .map_err(|e| anyhow!("Failed to set up QoS: {}", e))?;

        channel
            .queue_declare(
                &config.queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| anyhow!("Failed to declare queue: {}", e))?;

        if let Some(exchange_name) = config.exchange_name.as_deref().filter(|n| !n.is_empty()) {
            channel
                .exchange_declare(
                    exchange_name,
                    ExchangeKind::Topic,
                    ExchangeDeclareOptions {
                        durable: true,
                        ..Default::default()
                    },
                    FieldTable::default(),
                )
                .await
                .map_err(|e| anyhow!("Failed to declare topic exchange: {}", e))?;

            channel
                .queue_bind(
                    &config.queue_name,
                    exchange_name,
                    &config.routing_key,
                    QueueBindOptions::default(),
                    FieldTable::default(),
                )
                .await
                .map_err(|e| anyhow!("Failed to bind queue to exchange: {}", e))?;

            info!(
                exchange = %exchange_name,
                routing_key = %config.routing_key,
                "Queue bound to topic exchange"
            );
        }

        info!(queue = %config.queue_name, "RabbitMQ channel ready");

        Ok(Self {
            connection,
            channel,
            queue_name: config.queue_name.clone(),
        })
    }

    pub async fn create_consumer(&self) -> Result<Consumer, Error> {
        let consumer_tag = format!("push-webhooks-{}", Uuid::new_v4());

        let consumer = self
            .channel
            .basic_consume(
                &self.queue_name,
                &consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| anyhow!("Failed to create consumer: {}", e))?;

        info!(queue = %self.queue_name, consumer_tag = %consumer_tag, "Consumer created");

        Ok(consumer)
    }

    pub async fn close(&self) -> Result<(), Error> {
        self.channel.close(200, "shutting down").await?;
        self.connection.close(200, "shutting down").await?;
        Ok(())
    }
}

#[async_trait]
impl DeliveryAcker for RabbitMqClient {
    async fn acknowledge(&self, delivery_tag: u64) -> Result<(), Error> {
        self.channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await
            .map_err(|e| anyhow!("Failed to acknowledge message: {}", e))?;

        Ok(())
    }
}

#[async_trait]
impl ConnectivityCheck for RabbitMqClient {
    async fn connectivity_check(&self) -> Result<String, Error> {
        if !self.connection.status().connected() {
            return Err(anyhow!("error connecting to the queue: connection is not open"));
        }
        if !self.channel.status().connected() {
            return Err(anyhow!("error connecting to the queue: channel is not open"));
        }
        Ok("Connected to RabbitMQ".to_string())
    }
}

/// Converts an AMQP delivery into the message shape the handler works on.
pub fn inbound_message(delivery: &Delivery) -> InboundMessage {
    let headers = delivery
        .properties
        .headers()
        .as_ref()
        .map(header_map)
        .unwrap_or_default();

    InboundMessage::new(headers, delivery.data.clone())
}

/// Keeps string-valued headers only.
pub fn header_map(table: &FieldTable) -> HashMap<String, String> {
    table
        .inner()
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                AMQPValue::LongString(s) => String::from_utf8_lossy(s.as_bytes()).into_owned(),
                AMQPValue::ShortString(s) => s.as_str().to_string(),
                other => {
                    debug!(header = %key.as_str(), value = ?other, "Skipping non-string header");
                    return None;
                }
            };
            Some((key.as_str().to_string(), value))
        })
        .collect()
}
