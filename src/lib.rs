// Copyright (c) 2025 - Cowboy AI, Inc.
//! Course enrollment core
//!
//! Seat inventory with atomic reservation, enrollment records with a storage
//! level uniqueness rule, and a store-and-forward bridge that mirrors every
//! course mutation into a search index:
//!
//! ```text
//! EnrollmentWorkflow / CourseService
//!     ↓                        ↓
//! CourseStore, EnrollmentStore  EventPublisher ──> NATS JetStream ──> EventConsumer
//!                                                                        ↓
//!                                                              IndexProjector → SearchIndex
//! ```
//!
//! Backends: in-memory everywhere, Postgres stores behind the `postgres`
//! feature and a Solr index behind the `solr` feature.

pub mod app;
pub mod bus;
pub mod config;
pub mod consumer;
pub mod domain;
pub mod errors;
pub mod events;
pub mod index;
pub mod jetstream;
pub mod nats;
pub mod projection;
pub mod publisher;
pub mod retry;
pub mod service;
pub mod store;
pub mod subjects;

// Re-export commonly used types
pub use app::CourseApp;
pub use config::AppConfig;
pub use domain::{Course, CourseId, CoursePatch, Enrollment, Identity, NewCourse, UserId};
pub use errors::{InfrastructureError, InfrastructureResult};
pub use events::CourseUpdateEvent;
pub use nats::{NatsClient, NatsConfig};
pub use publisher::{EventPublisher, PublishWorker, QueuedPublisher};
pub use service::{CourseService, EnrollmentWorkflow, ErrorKind, ServiceError, ServiceResult};
