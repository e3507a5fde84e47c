// Copyright (c) 2025 - Cowboy AI, Inc.
//! Course-side process wiring
//!
//! [`CourseApp`] owns every long-lived resource of the course process: the
//! stores, the publish worker and (with the `postgres` feature) the
//! connection pool. Nothing is global; an outer HTTP layer borrows the
//! workflows from here and calls [`CourseApp::shutdown`] on exit.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::bus::BusConnector;
use crate::errors::InfrastructureError;
use crate::publisher::{PublishStats, PublishWorker};
use crate::retry::RetryPolicy;
use crate::service::{CourseService, EnrollmentWorkflow};
use crate::store::{CourseStore, EnrollmentStore, StoreError};

/// Errors raised while starting the process
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

/// Running course process
pub struct CourseApp {
    courses: CourseService,
    enrollment: EnrollmentWorkflow,
    publish_worker: JoinHandle<PublishStats>,
    #[cfg(feature = "postgres")]
    pool: Option<sqlx::PgPool>,
}

impl CourseApp {
    /// Assemble the workflows over the given stores and bus
    pub fn from_parts<C: BusConnector>(
        courses: Arc<dyn CourseStore>,
        enrollments: Arc<dyn EnrollmentStore>,
        bus: C,
        retry: RetryPolicy,
    ) -> Self {
        let (publisher, publish_worker) = PublishWorker::spawn(bus, retry);
        let publisher = Arc::new(publisher);

        Self {
            courses: CourseService::new(courses.clone(), enrollments.clone(), publisher.clone()),
            enrollment: EnrollmentWorkflow::new(courses, enrollments, publisher),
            publish_worker,
            #[cfg(feature = "postgres")]
            pool: None,
        }
    }

    /// Connect to Postgres and NATS as configured and run migrations
    #[cfg(feature = "postgres")]
    pub async fn bootstrap(config: &crate::config::AppConfig) -> Result<Self, StartupError> {
        use crate::bus::NatsBus;
        use crate::store::postgres::{connect_pool, PostgresCourseStore, PostgresEnrollmentStore};

        let pool = connect_pool(&config.database).await?;
        let courses = PostgresCourseStore::new(pool.clone(), config.store_timeout());
        courses.migrate().await?;
        let enrollments = PostgresEnrollmentStore::new(pool.clone(), config.store_timeout());

        let bus = NatsBus::new(
            config.nats.clone(),
            config.stream.clone(),
            config.consumer.clone(),
        );

        let mut app = Self::from_parts(Arc::new(courses), Arc::new(enrollments), bus, config.retry);
        app.pool = Some(pool);
        info!("Course application started");
        Ok(app)
    }

    pub fn courses(&self) -> &CourseService {
        &self.courses
    }

    pub fn enrollment(&self) -> &EnrollmentWorkflow {
        &self.enrollment
    }

    /// Stop accepting work, drain queued events for up to `grace`, close the pool
    ///
    /// Returns the publish counters, or `None` if the worker did not finish in time.
    pub async fn shutdown(self, grace: Duration) -> Option<PublishStats> {
        let Self {
            courses,
            enrollment,
            publish_worker,
            #[cfg(feature = "postgres")]
            pool,
        } = self;
        drop(courses);
        drop(enrollment);

        let stats = match tokio::time::timeout(grace, publish_worker).await {
            Ok(Ok(stats)) => Some(stats),
            Ok(Err(e)) => {
                warn!(error = %e, "Publish worker panicked");
                None
            }
            Err(_) => {
                warn!(?grace, "Publish worker still busy at shutdown");
                None
            }
        };

        #[cfg(feature = "postgres")]
        if let Some(pool) = pool {
            pool.close().await;
        }

        info!("Course application stopped");
        stats
    }
}
