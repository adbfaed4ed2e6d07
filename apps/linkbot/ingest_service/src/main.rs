use actix_web::{App, HttpResponse, HttpServer, web};
use chrono::Utc;
use common::RabbitMQConfig;
use common::config::{ChannelDirectory, Settings};
use common::fetcher::{HttpFetcher, MetadataFetcher};
use common::ingest::handle_message;
use common::{ChatMessage, ServiceError};
use futures::StreamExt;
use lapin::ExchangeKind;
use lapin::{Channel, Connection, ConnectionProperties, Consumer, options::*, types::FieldTable};
use sea_orm::DatabaseConnection;
use serde_json::from_slice;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
struct IngestService {
    db: DatabaseConnection,
    rabbit_channel: Channel,
    channels: Arc<ChannelDirectory>,
    fetcher: Arc<HttpFetcher>,
    num_consumers: u32,
}

/// What to do with a delivery once it has been handled.
enum Outcome {
    Ack,
    Requeue,
}

impl IngestService {
    async fn new(settings: &Settings) -> Result<Self, ServiceError> {
        let db = common::db::connect(settings).await?;

        let channels = settings.channel_directory();
        if channels.is_empty() {
            warn!("No channels configured, every message will be ignored");
        }

        let rabbit_conn =
            Connection::connect(&settings.rabbitmq_url, ConnectionProperties::default()).await?;
        let rabbit_channel = rabbit_conn.create_channel().await?;

        // Declare exchanges and queues
        info!("Declaring RabbitMQ exchanges and queues...");
        rabbit_channel
            .exchange_declare(
                RabbitMQConfig::CHAT_MESSAGES_EXCHANGE,
                ExchangeKind::Direct,
                ExchangeDeclareOptions::default(),
                FieldTable::default(),
            )
            .await?;

        rabbit_channel
            .queue_declare(
                RabbitMQConfig::CHAT_MESSAGES_QUEUE,
                QueueDeclareOptions::default(),
                FieldTable::default(),
            )
            .await?;

        rabbit_channel
            .queue_bind(
                RabbitMQConfig::CHAT_MESSAGES_QUEUE,
                RabbitMQConfig::CHAT_MESSAGES_EXCHANGE,
                RabbitMQConfig::CHAT_MESSAGES_ROUTING_KEY,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        Ok(Self {
            db,
            rabbit_channel,
            channels: Arc::new(channels),
            fetcher: Arc::new(HttpFetcher::new()?),
            num_consumers: settings.num_consumers.max(1),
        })
    }

    async fn start(&self) -> Result<(), ServiceError> {
        let mut handles = Vec::new();

        for i in 0..self.num_consumers {
            let channel = self.rabbit_channel.clone();
            let service = self.clone();

            let handle = tokio::spawn(async move {
                // Scrapes are slow, keep only a few messages in flight per consumer
                channel.basic_qos(5, BasicQosOptions::default()).await?;

                let consumer = channel
                    .basic_consume(
                        RabbitMQConfig::CHAT_MESSAGES_QUEUE,
                        &format!("ingest_consumer_{}_{}", i, uuid::Uuid::new_v4()),
                        BasicConsumeOptions::default(),
                        FieldTable::default(),
                    )
                    .await?;

                service.process_messages(consumer).await
            });

            handles.push(handle);
        }

        // Wait for all consumers to complete (or error)
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => (),
                Ok(Err(e)) => error!("Consumer error: {:?}", e),
                Err(e) => error!("Join error: {:?}", e),
            }
        }

        Ok(())
    }

    async fn process_messages(&self, mut consumer: Consumer) -> Result<(), ServiceError> {
        while let Some(delivery) = consumer.next().await {
            let delivery = match delivery {
                Ok(delivery) => delivery,
                Err(e) => {
                    error!("Error receiving message: {}", e);
                    continue;
                }
            };

            match self.handle_delivery(&delivery.data).await {
                Outcome::Ack => delivery.ack(BasicAckOptions::default()).await?,
                Outcome::Requeue => {
                    delivery
                        .nack(BasicNackOptions {
                            requeue: true,
                            ..Default::default()
                        })
                        .await?
                }
            }
        }

        Ok(())
    }

    async fn handle_delivery(&self, data: &[u8]) -> Outcome {
        let message: ChatMessage = match from_slice(data) {
            Ok(message) => message,
            Err(e) => {
                // Redelivering a payload we cannot decode would loop forever
                error!("Dropping undecodable message: {}", e);
                return Outcome::Ack;
            }
        };

        let Some(channel_name) = self.channels.name_of(message.channel_id) else {
            warn!("Ignoring message from unknown channel {}", message.channel_id);
            return Outcome::Ack;
        };

        info!(
            "Processing message {} from {} in #{} at {}",
            message.message_id,
            message.sender.display_name(),
            channel_name,
            message.date
        );

        let fetcher: &dyn MetadataFetcher = self.fetcher.as_ref();
        match handle_message(&self.db, fetcher, &message).await {
            Ok(stored) => {
                info!(
                    "Stored {} entries from message {} in #{}",
                    stored, message.message_id, channel_name
                );
                Outcome::Ack
            }
            Err(e) => {
                error!("Error processing message {}: {}", message.message_id, e);
                Outcome::Requeue
            }
        }
    }
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": Utc::now()
    }))
}

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    common::logger::init();

    let settings = Settings::new()?;
    let service = IngestService::new(&settings).await?;
    let service_handle = service.start();
    let health_server =
        HttpServer::new(|| App::new().route("/health", web::get().to(health_check)))
            .bind(("0.0.0.0", settings.health_port))?
            .run();

    // Run both the main service and health check server
    tokio::select! {
        result = health_server => {
            if let Err(e) = result {
                error!("Health server error: {:?}", e);
            }
        }
        result = service_handle => {
            if let Err(e) = result {
                error!("Service error: {:?}", e);
            }
        }
    }

    Ok(())
}
