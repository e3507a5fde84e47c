// Copyright (c) 2025 - Cowboy AI, Inc.
//! Fire-and-forget course update publisher
//!
//! Request paths hand events to a [`QueuedPublisher`], which only enqueues
//! them on an unbounded channel and returns. A single [`PublishWorker`] task
//! drains the channel and talks to the bus:
//!
//! ```text
//! CourseService ──publish_*──> mpsc ──> PublishWorker ──> BusChannel ──> durable queue
//! ```
//!
//! The worker keeps at most one open [`BusChannel`]. It is acquired with
//! bounded retries, reused while publishing succeeds and dropped on the first
//! error so the next event reconnects. Failures are logged and the event is
//! dropped; nothing is reported back to the caller.
//!
//! Once a full connect cycle is exhausted the worker stops dialing for one
//! backoff period and drops queued events straight away, so an outage does
//! not turn into a backlog that flushes stale updates on recovery.

use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::bus::{BusChannel, BusConnector};
use crate::domain::{Course, CourseId};
use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::events::CourseUpdateEvent;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Sink for course mutation events. Never fails, never blocks.
pub trait EventPublisher: Send + Sync {
    fn publish_upsert(&self, course: &Course);

    fn publish_delete(&self, id: &CourseId);
}

/// Publisher handle feeding a [`PublishWorker`]
#[derive(Debug, Clone)]
pub struct QueuedPublisher {
    tx: mpsc::UnboundedSender<CourseUpdateEvent>,
}

impl QueuedPublisher {
    fn enqueue(&self, event: CourseUpdateEvent) {
        let course_id = event.course_id();
        let action = event.action();
        if self.tx.send(event).is_err() {
            error!(%course_id, action, "Publish worker stopped, dropping course update");
        }
    }
}

impl EventPublisher for QueuedPublisher {
    fn publish_upsert(&self, course: &Course) {
        self.enqueue(CourseUpdateEvent::upsert(course));
    }

    fn publish_delete(&self, id: &CourseId) {
        self.enqueue(CourseUpdateEvent::delete(*id));
    }
}

/// Counters reported when the worker stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishStats {
    pub published: u64,
    pub dropped: u64,
}

/// Background task owning the bus connection
pub struct PublishWorker<C: BusConnector> {
    connector: C,
    retry: RetryPolicy,
    channel: Option<C::Channel>,
    /// No connect attempts before this instant
    unavailable_until: Option<Instant>,
    stats: PublishStats,
}

impl<C: BusConnector> PublishWorker<C> {
    pub fn new(connector: C, retry: RetryPolicy) -> Self {
        Self {
            connector,
            retry,
            channel: None,
            unavailable_until: None,
            stats: PublishStats::default(),
        }
    }

    /// Start the worker; it runs until every publisher handle is dropped
    pub fn spawn(connector: C, retry: RetryPolicy) -> (QueuedPublisher, JoinHandle<PublishStats>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Self::new(connector, retry);
        let handle = tokio::spawn(worker.run(rx));
        (QueuedPublisher { tx }, handle)
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<CourseUpdateEvent>) -> PublishStats {
        info!("Publish worker started");
        while let Some(event) = rx.recv().await {
            self.deliver(event).await;
        }
        self.channel = None;
        info!(
            published = self.stats.published,
            dropped = self.stats.dropped,
            "Publish worker stopped"
        );
        self.stats
    }

    /// Publish one event, logging instead of returning failures
    pub async fn deliver(&mut self, event: CourseUpdateEvent) {
        let course_id = event.course_id();
        let action = event.action();

        match self.try_deliver(&event).await {
            Ok(()) => {
                self.stats.published += 1;
                debug!(%course_id, action, "Course update published");
            }
            Err(e) => {
                self.stats.dropped += 1;
                error!(%course_id, action, error = %e, "Failed to publish course update");
            }
        }
    }

    async fn try_deliver(&mut self, event: &CourseUpdateEvent) -> InfrastructureResult<()> {
        let payload = event.to_bytes()?;

        let mut channel = match self.channel.take() {
            Some(channel) => channel,
            None => {
                if let Some(until) = self.unavailable_until {
                    if Instant::now() < until {
                        return Err(InfrastructureError::BusUnavailable {
                            attempts: 0,
                            last_error: "connect cycle exhausted, waiting out backoff".to_string(),
                        });
                    }
                    self.unavailable_until = None;
                }
                match Self::open_channel(&self.connector, &self.retry).await {
                    Ok(channel) => channel,
                    Err(e) => {
                        self.unavailable_until = Some(Instant::now() + self.retry.backoff);
                        return Err(e);
                    }
                }
            }
        };

        // A failing channel is dropped here, before the error propagates.
        channel.declare_queue().await?;
        channel.publish(payload).await?;

        self.channel = Some(channel);
        Ok(())
    }

    async fn open_channel(connector: &C, retry: &RetryPolicy) -> InfrastructureResult<C::Channel> {
        retry_with_backoff(retry, "bus connect", || connector.connect())
            .await
            .map_err(|e| {
                warn!(attempts = retry.max_attempts, "Giving up on bus connection");
                InfrastructureError::BusUnavailable {
                    attempts: retry.max_attempts,
                    last_error: e.to_string(),
                }
            })
    }

    pub fn stats(&self) -> PublishStats {
        self.stats
    }
}

/// Publisher that records events in memory
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<CourseUpdateEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CourseUpdateEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn record(&self, event: CourseUpdateEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish_upsert(&self, course: &Course) {
        self.record(CourseUpdateEvent::upsert(course));
    }

    fn publish_delete(&self, id: &CourseId) {
        self.record(CourseUpdateEvent::delete(*id));
    }
}
