// Copyright (c) 2025 - Cowboy AI, Inc.
//! NATS JetStream bus
//!
//! Publishing goes through JetStream so every message lands in the
//! file-backed `COURSE_UPDATES` stream before the broker acknowledges it.
//! Consumption uses a durable pull consumer with `AckPolicy::None`.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tracing::{debug, info};

use super::{BusChannel, BusConnector, Deliveries, EventSource};
use crate::errors::{with_deadline, InfrastructureError, InfrastructureResult};
use crate::jetstream::{declare_course_stream, ConsumerConfig, JetStreamConfig};
use crate::nats::{NatsClient, NatsConfig};

/// JetStream-backed bus for both publishing and consuming
#[derive(Debug, Clone, Default)]
pub struct NatsBus {
    nats: NatsConfig,
    stream: JetStreamConfig,
    consumer: ConsumerConfig,
}

impl NatsBus {
    pub fn new(nats: NatsConfig, stream: JetStreamConfig, consumer: ConsumerConfig) -> Self {
        Self {
            nats,
            stream,
            consumer,
        }
    }
}

/// Publishing channel holding one NATS connection
pub struct NatsChannel {
    client: NatsClient,
    jetstream: async_nats::jetstream::Context,
    stream: JetStreamConfig,
    declared: bool,
}

#[async_trait]
impl BusChannel for NatsChannel {
    async fn declare_queue(&mut self) -> InfrastructureResult<()> {
        if self.declared {
            return Ok(());
        }
        declare_course_stream(&self.jetstream, &self.stream).await?;
        self.declared = true;
        Ok(())
    }

    async fn publish(&mut self, payload: Bytes) -> InfrastructureResult<()> {
        let ack = self
            .jetstream
            .publish(self.stream.subject.clone(), payload)
            .await
            .map_err(|e| InfrastructureError::NatsPublish(e.to_string()))?;

        let ack = with_deadline("publish acknowledgement", self.client.request_timeout(), async {
            ack.await
                .map_err(|e| InfrastructureError::NatsPublish(e.to_string()))
        })
        .await?;

        debug!(stream = %ack.stream, sequence = ack.sequence, "Published course update");
        Ok(())
    }
}

impl Drop for NatsChannel {
    fn drop(&mut self) {
        debug!("Releasing NATS publishing channel");
    }
}

#[async_trait]
impl BusConnector for NatsBus {
    type Channel = NatsChannel;

    async fn connect(&self) -> InfrastructureResult<NatsChannel> {
        let client = NatsClient::connect(&self.nats).await?;
        let jetstream = client.jetstream();
        Ok(NatsChannel {
            client,
            jetstream,
            stream: self.stream.clone(),
            declared: false,
        })
    }
}

#[async_trait]
impl EventSource for NatsBus {
    async fn subscribe(&self) -> InfrastructureResult<Deliveries> {
        let client = NatsClient::connect(&self.nats).await?;
        let jetstream = client.jetstream();
        let stream = declare_course_stream(&jetstream, &self.stream).await?;

        let consumer = stream
            .get_or_create_consumer(
                &self.consumer.name,
                self.consumer.pull_config(&self.stream.subject),
            )
            .await
            .map_err(|e| InfrastructureError::NatsSubscribe(e.to_string()))?;

        let messages = consumer
            .messages()
            .await
            .map_err(|e| InfrastructureError::NatsSubscribe(e.to_string()))?;

        info!(
            stream = %self.stream.stream_name,
            consumer = %self.consumer.name,
            "Subscribed to course updates"
        );

        Ok(messages
            .map(|delivery| {
                delivery
                    .map(|msg| msg.payload.clone())
                    .map_err(|e| InfrastructureError::NatsSubscribe(e.to_string()))
            })
            .boxed())
    }
}
