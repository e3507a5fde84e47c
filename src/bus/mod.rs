// Copyright (c) 2025 - Cowboy AI, Inc.
//! Message bus capabilities
//!
//! The publisher side acquires a [`BusChannel`] from a [`BusConnector`],
//! declares the durable queue and publishes serialized events on it. The
//! channel is released when dropped, so every exit path (success, publish
//! error, task cancellation) gives it back.
//!
//! The consumer side obtains a stream of raw deliveries from an
//! [`EventSource`]. Deliveries are acknowledged on receipt; the stream ends
//! or yields an error when the subscription is lost.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::errors::InfrastructureResult;

pub mod memory;
pub mod nats;

pub use memory::InMemoryBus;
pub use nats::{NatsBus, NatsChannel};

/// Stream of raw deliveries from the durable queue
pub type Deliveries = BoxStream<'static, InfrastructureResult<Bytes>>;

/// Open publishing channel on the bus
#[async_trait]
pub trait BusChannel: Send {
    /// Declare the durable queue. Idempotent.
    async fn declare_queue(&mut self) -> InfrastructureResult<()>;

    /// Publish one persistent message, waiting for the broker's acknowledgement
    async fn publish(&mut self, payload: Bytes) -> InfrastructureResult<()>;
}

/// Factory for publishing channels
#[async_trait]
pub trait BusConnector: Send + Sync + 'static {
    type Channel: BusChannel + 'static;

    /// Single connection attempt; retries are the caller's concern
    async fn connect(&self) -> InfrastructureResult<Self::Channel>;
}

/// Subscription to the durable queue
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn subscribe(&self) -> InfrastructureResult<Deliveries>;
}
