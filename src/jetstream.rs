// Copyright (c) 2025 - Cowboy AI, Inc.

//! JetStream configuration for the durable course update queue
//!
//! The queue is a file-backed stream so published events survive a broker
//! restart. Declaration is idempotent: the stream is created if missing and
//! reused otherwise.
//!
//! # Example
//!
//! ```rust,no_run
//! use course_enrollment::jetstream::{declare_course_stream, JetStreamConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = async_nats::connect("nats://localhost:4222").await?;
//!     let jetstream = async_nats::jetstream::new(client);
//!
//!     let stream = declare_course_stream(&jetstream, &JetStreamConfig::default()).await?;
//!
//!     Ok(())
//! }
//! ```

use async_nats::jetstream::{self, stream::Stream};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::subjects::COURSE_UPDATES_SUBJECT;

/// Configuration for the course update stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JetStreamConfig {
    /// Stream (durable queue) name
    pub stream_name: String,

    /// Subject events are published on
    pub subject: String,

    /// Maximum age of messages (default: 7 days)
    pub max_age: Duration,

    /// Storage type (File or Memory)
    pub storage: StorageType,

    /// Number of replicas (for clustered NATS)
    pub replicas: usize,
}

impl Default for JetStreamConfig {
    fn default() -> Self {
        Self {
            stream_name: "COURSE_UPDATES".to_string(),
            subject: COURSE_UPDATES_SUBJECT.to_string(),
            max_age: Duration::from_secs(7 * 24 * 60 * 60),
            storage: StorageType::File,
            replicas: 1,
        }
    }
}

/// Storage type for JetStream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// File-based storage (persistent across restarts)
    File,
    /// Memory-based storage (faster, but lost on restart)
    Memory,
}

impl FromStr for StorageType {
    type Err = InfrastructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(StorageType::File),
            "memory" => Ok(StorageType::Memory),
            other => Err(InfrastructureError::Configuration(format!(
                "unknown stream storage {other:?}, expected file or memory"
            ))),
        }
    }
}

impl JetStreamConfig {
    fn stream_config(&self) -> jetstream::stream::Config {
        let storage = match self.storage {
            StorageType::File => jetstream::stream::StorageType::File,
            StorageType::Memory => jetstream::stream::StorageType::Memory,
        };

        jetstream::stream::Config {
            name: self.stream_name.clone(),
            subjects: vec![self.subject.clone()],
            max_age: self.max_age,
            storage,
            num_replicas: self.replicas,
            retention: jetstream::stream::RetentionPolicy::Limits,
            ..Default::default()
        }
    }
}

/// Create the course update stream if missing, otherwise return it
pub async fn declare_course_stream(
    jetstream: &jetstream::Context,
    config: &JetStreamConfig,
) -> InfrastructureResult<Stream> {
    let stream = jetstream
        .get_or_create_stream(config.stream_config())
        .await
        .map_err(|e| InfrastructureError::StreamDeclaration(e.to_string()))?;

    debug!(stream = %config.stream_name, "Declared course update stream");
    Ok(stream)
}

/// Consumer configuration for the index projector
///
/// Deliveries count as acknowledged on receipt (`AckPolicy::None`); a failed
/// projection is logged and not redelivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// Durable consumer name (survives restarts)
    pub name: String,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            name: "index-projector".to_string(),
        }
    }
}

impl ConsumerConfig {
    pub(crate) fn pull_config(&self, subject: &str) -> jetstream::consumer::pull::Config {
        jetstream::consumer::pull::Config {
            durable_name: Some(self.name.clone()),
            filter_subject: subject.to_string(),
            ack_policy: jetstream::consumer::AckPolicy::None,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_default_config() {
        let config = JetStreamConfig::default();
        assert_eq!(config.stream_name, "COURSE_UPDATES");
        assert_eq!(config.subject, "courses.updates");
        assert_eq!(config.storage, StorageType::File);
    }

    #[test]
    fn test_stream_config_is_file_backed() {
        let stream = JetStreamConfig::default().stream_config();
        assert_eq!(stream.subjects, vec!["courses.updates".to_string()]);
        assert_eq!(stream.storage, jetstream::stream::StorageType::File);
    }

    #[test]
    fn test_memory_storage_is_selectable() {
        let config = JetStreamConfig {
            storage: "memory".parse().unwrap(),
            ..Default::default()
        };
        assert_eq!(config.stream_config().storage, jetstream::stream::StorageType::Memory);
    }

    #[test_case("file" => Ok(StorageType::File))]
    #[test_case("FILE" => Ok(StorageType::File))]
    #[test_case("memory" => Ok(StorageType::Memory))]
    #[test_case("disk" => Err(()))]
    fn test_storage_parsing(raw: &str) -> Result<StorageType, ()> {
        raw.parse::<StorageType>().map_err(|_| ())
    }

    #[test]
    fn test_consumer_auto_acknowledges() {
        let pull = ConsumerConfig::default().pull_config(COURSE_UPDATES_SUBJECT);
        assert_eq!(pull.durable_name.as_deref(), Some("index-projector"));
        assert_eq!(pull.ack_policy, jetstream::consumer::AckPolicy::None);
        assert_eq!(pull.filter_subject, "courses.updates");
    }
}
