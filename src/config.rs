// Copyright (c) 2025 - Cowboy AI, Inc.
//! Process configuration
//!
//! Every value has a default suitable for local development and can be
//! overridden from the environment:
//!
//! | Variable | Default |
//! |---|---|
//! | `DATABASE_URL` | `postgres://localhost/courses` |
//! | `DATABASE_MAX_CONNECTIONS` | `10` |
//! | `STORE_TIMEOUT_MS` | `5000` |
//! | `NATS_URL` | `nats://localhost:4222` |
//! | `NATS_STREAM` | `COURSE_UPDATES` |
//! | `NATS_SUBJECT` | `courses.updates` |
//! | `NATS_CONSUMER` | `index-projector` |
//! | `SOLR_URL` | `http://localhost:8983` |
//! | `SOLR_CORE` | `courses` |
//! | `SOLR_TIMEOUT_SECS` | `30` |
//! | `BUS_CONNECT_ATTEMPTS` | `5` |
//! | `BUS_CONNECT_BACKOFF_MS` | `2000` |

use std::str::FromStr;
use std::time::Duration;

use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::jetstream::{ConsumerConfig, JetStreamConfig};
use crate::nats::NatsConfig;
use crate::retry::RetryPolicy;

/// Postgres connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Deadline applied to every store call and to pool acquisition
    pub statement_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/courses".to_string(),
            max_connections: 10,
            statement_timeout: Duration::from_secs(5),
        }
    }
}

/// Solr search index settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolrConfig {
    /// Solr base URL (e.g., "http://localhost:8983")
    pub base_url: String,
    /// Core (collection) holding course documents
    pub core: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SolrConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8983".to_string(),
            core: "courses".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Complete configuration for either process
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub nats: NatsConfig,
    pub stream: JetStreamConfig,
    pub consumer: ConsumerConfig,
    pub solr: SolrConfig,
    /// Bus connection retry policy
    pub retry: RetryPolicy,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> InfrastructureResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> InfrastructureResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("DATABASE_URL") {
            config.database.url = url;
        }
        config.database.max_connections =
            parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", config.database.max_connections)?;
        config.database.statement_timeout = Duration::from_millis(parse_or(
            &lookup,
            "STORE_TIMEOUT_MS",
            config.database.statement_timeout.as_millis() as u64,
        )?);

        if let Some(urls) = lookup("NATS_URL") {
            config.nats = config.nats.with_servers(&urls);
        }
        if let Some(stream) = lookup("NATS_STREAM") {
            config.stream.stream_name = stream;
        }
        if let Some(storage) = lookup("NATS_STORAGE") {
            config.stream.storage = storage.trim().parse()?;
        }
        if let Some(subject) = lookup("NATS_SUBJECT") {
            config.stream.subject = subject;
        }
        if let Some(consumer) = lookup("NATS_CONSUMER") {
            config.consumer.name = consumer;
        }

        if let Some(url) = lookup("SOLR_URL") {
            config.solr.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(core) = lookup("SOLR_CORE") {
            config.solr.core = core;
        }
        config.solr.timeout_secs = parse_or(&lookup, "SOLR_TIMEOUT_SECS", config.solr.timeout_secs)?;

        let attempts: usize = parse_or(&lookup, "BUS_CONNECT_ATTEMPTS", config.retry.max_attempts)?;
        if attempts == 0 {
            return Err(InfrastructureError::Configuration(
                "BUS_CONNECT_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        let backoff_ms: u64 = parse_or(
            &lookup,
            "BUS_CONNECT_BACKOFF_MS",
            config.retry.backoff.as_millis() as u64,
        )?;
        config.retry = RetryPolicy::new(attempts, Duration::from_millis(backoff_ms));

        Ok(config)
    }

    /// Deadline for store calls
    pub fn store_timeout(&self) -> Duration {
        self.database.statement_timeout
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> InfrastructureResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| {
            InfrastructureError::Configuration(format!("{key}={raw:?} is invalid: {e}"))
        }),
    }
}
