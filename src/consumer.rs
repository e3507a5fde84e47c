// Copyright (c) 2025 - Cowboy AI, Inc.
//! Long-lived course update consumer
//!
//! Reads deliveries from an [`EventSource`] and feeds them to a
//! [`ProjectionAdapter`]. Deliveries are acknowledged on receipt, so every
//! failure below is terminal for that message:
//!
//! - undecodable payloads are logged and skipped
//! - projection errors are logged and skipped
//! - a lost subscription is re-established after `resubscribe_backoff`
//!
//! The loop only stops when the shutdown future resolves.

use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::bus::EventSource;
use crate::events::CourseUpdateEvent;
use crate::projection::ProjectionAdapter;

/// Per-consumer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub projected: u64,
    pub malformed: u64,
    pub failed: u64,
    pub subscriptions: u64,
}

/// Consumer loop driving a projection from the durable queue
pub struct EventConsumer<S, P> {
    source: S,
    projector: P,
    resubscribe_backoff: Duration,
    stats: ConsumerStats,
}

impl<S, P> EventConsumer<S, P>
where
    S: EventSource,
    P: ProjectionAdapter<Event = CourseUpdateEvent>,
{
    pub fn new(source: S, projector: P, resubscribe_backoff: Duration) -> Self {
        Self {
            source,
            projector,
            resubscribe_backoff,
            stats: ConsumerStats::default(),
        }
    }

    /// Consume until `shutdown` resolves, resubscribing whenever the stream is lost
    pub async fn run<F>(mut self, shutdown: F) -> ConsumerStats
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);
        info!(projection = self.projector.name(), "Event consumer started");

        let backoff = self.resubscribe_backoff;
        loop {
            let stream_lost = tokio::select! {
                _ = &mut shutdown => false,
                _ = self.consume_subscription() => true,
            };
            if !stream_lost {
                break;
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(backoff) => {}
            }
        }

        info!(
            projected = self.stats.projected,
            malformed = self.stats.malformed,
            failed = self.stats.failed,
            "Event consumer stopped"
        );
        self.stats
    }

    /// Subscribe once and process deliveries until the stream ends
    async fn consume_subscription(&mut self) {
        let mut deliveries = match self.source.subscribe().await {
            Ok(deliveries) => deliveries,
            Err(e) => {
                warn!(error = %e, backoff = ?self.resubscribe_backoff, "Subscribe failed");
                return;
            }
        };
        self.stats.subscriptions += 1;

        while let Some(delivery) = deliveries.next().await {
            match delivery {
                Ok(payload) => self.handle_payload(&payload).await,
                Err(e) => {
                    error!(error = %e, "Delivery stream failed");
                    return;
                }
            }
        }

        warn!("Delivery stream ended, resubscribing");
    }

    /// Decode and project one delivery. Never fails.
    pub async fn handle_payload(&mut self, payload: &[u8]) {
        let event = match CourseUpdateEvent::from_slice(payload) {
            Ok(event) => event,
            Err(e) => {
                self.stats.malformed += 1;
                warn!(error = %e, "Skipping malformed course update");
                return;
            }
        };

        let course_id = event.course_id();
        let action = event.action();
        match self.projector.project(event).await {
            Ok(()) => {
                self.stats.projected += 1;
                debug!(%course_id, action, "Projected course update");
            }
            Err(e) => {
                self.stats.failed += 1;
                error!(%course_id, action, error = %e, "Failed to project course update");
            }
        }
    }

    pub fn stats(&self) -> ConsumerStats {
        self.stats
    }

    pub fn projector(&self) -> &P {
        &self.projector
    }
}
