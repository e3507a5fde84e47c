// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-process bus
//!
//! Behaves like a single durable queue: messages published while nobody is
//! subscribed are retained and handed to the next subscriber. Each message
//! goes to one subscriber (the oldest live one). [`InMemoryBus::set_offline`]
//! makes connects, publishes and subscribes fail, and
//! [`InMemoryBus::drop_subscribers`] ends every open delivery stream.

use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::mpsc;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{BusChannel, BusConnector, Deliveries, EventSource};
use crate::errors::{InfrastructureError, InfrastructureResult};

type Subscriber = mpsc::UnboundedSender<InfrastructureResult<Bytes>>;

#[derive(Debug, Default)]
struct Queue {
    backlog: VecDeque<Bytes>,
    subscribers: Vec<Subscriber>,
    published: usize,
}

impl Queue {
    fn deliver(&mut self, payload: Bytes) {
        let mut payload = Some(payload);
        self.subscribers.retain(|subscriber| {
            let Some(message) = payload.take() else {
                return !subscriber.is_closed();
            };
            match subscriber.unbounded_send(Ok(message)) {
                Ok(()) => true,
                Err(err) => {
                    if let Ok(message) = err.into_inner() {
                        payload = Some(message);
                    }
                    false
                }
            }
        });
        if let Some(payload) = payload {
            self.backlog.push_back(payload);
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    queue: Mutex<Queue>,
    offline: AtomicBool,
    connect_attempts: AtomicUsize,
    declarations: AtomicUsize,
    open_channels: AtomicUsize,
}

/// Cloneable handle to one in-process queue
#[derive(Debug, Clone, Default)]
pub struct InMemoryBus {
    shared: Arc<Shared>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a broker outage (or recovery)
    pub fn set_offline(&self, offline: bool) {
        self.shared.offline.store(offline, Ordering::SeqCst);
    }

    /// End every open delivery stream, as a broker restart would
    pub fn drop_subscribers(&self) {
        if let Ok(mut queue) = self.shared.queue.lock() {
            queue.subscribers.clear();
        }
    }

    /// Put a raw payload on the queue, bypassing serialization
    pub fn inject(&self, payload: impl Into<Bytes>) {
        if let Ok(mut queue) = self.shared.queue.lock() {
            queue.published += 1;
            queue.deliver(payload.into());
        }
    }

    /// Messages accepted by the queue so far
    pub fn published_count(&self) -> usize {
        self.shared.queue.lock().map(|q| q.published).unwrap_or(0)
    }

    /// Messages waiting for a subscriber
    pub fn backlog(&self) -> Vec<Bytes> {
        self.shared
            .queue
            .lock()
            .map(|q| q.backlog.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn connect_attempts(&self) -> usize {
        self.shared.connect_attempts.load(Ordering::SeqCst)
    }

    /// Queue declarations issued; a channel declares at most once
    pub fn declarations(&self) -> usize {
        self.shared.declarations.load(Ordering::SeqCst)
    }

    /// Publishing channels currently held
    pub fn open_channels(&self) -> usize {
        self.shared.open_channels.load(Ordering::SeqCst)
    }

    fn ensure_online(&self, operation: &str) -> InfrastructureResult<()> {
        if self.shared.offline.load(Ordering::SeqCst) {
            return Err(InfrastructureError::NatsConnection(format!(
                "bus offline during {operation}"
            )));
        }
        Ok(())
    }
}

/// Publishing channel on an [`InMemoryBus`]
#[derive(Debug)]
pub struct InMemoryChannel {
    bus: InMemoryBus,
    declared: bool,
}

impl Drop for InMemoryChannel {
    fn drop(&mut self) {
        self.bus.shared.open_channels.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BusChannel for InMemoryChannel {
    async fn declare_queue(&mut self) -> InfrastructureResult<()> {
        if self.declared {
            return Ok(());
        }
        self.bus.ensure_online("declare")?;
        self.bus.shared.declarations.fetch_add(1, Ordering::SeqCst);
        self.declared = true;
        Ok(())
    }

    async fn publish(&mut self, payload: Bytes) -> InfrastructureResult<()> {
        if self.bus.shared.offline.load(Ordering::SeqCst) {
            return Err(InfrastructureError::NatsPublish("bus offline".to_string()));
        }
        let mut queue = self
            .bus
            .shared
            .queue
            .lock()
            .map_err(|_| InfrastructureError::NatsPublish("queue lock poisoned".to_string()))?;
        queue.published += 1;
        queue.deliver(payload);
        Ok(())
    }
}

#[async_trait]
impl BusConnector for InMemoryBus {
    type Channel = InMemoryChannel;

    async fn connect(&self) -> InfrastructureResult<InMemoryChannel> {
        self.shared.connect_attempts.fetch_add(1, Ordering::SeqCst);
        self.ensure_online("connect")?;
        self.shared.open_channels.fetch_add(1, Ordering::SeqCst);
        Ok(InMemoryChannel {
            bus: self.clone(),
            declared: false,
        })
    }
}

#[async_trait]
impl EventSource for InMemoryBus {
    async fn subscribe(&self) -> InfrastructureResult<Deliveries> {
        self.ensure_online("subscribe")?;
        let (tx, rx) = mpsc::unbounded();

        let mut queue = self
            .shared
            .queue
            .lock()
            .map_err(|_| InfrastructureError::NatsSubscribe("queue lock poisoned".to_string()))?;
        while let Some(payload) = queue.backlog.pop_front() {
            if tx.unbounded_send(Ok(payload)).is_err() {
                break;
            }
        }
        queue.subscribers.push(tx);

        Ok(rx.boxed())
    }
}
