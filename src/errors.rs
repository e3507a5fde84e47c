// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for bus, configuration and timeout failures

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur in messaging and infrastructure operations
#[derive(Debug, Error)]
pub enum InfrastructureError {
    /// NATS connection error
    #[error("NATS connection error: {0}")]
    NatsConnection(String),

    /// Stream (durable queue) declaration error
    #[error("Stream declaration error: {0}")]
    StreamDeclaration(String),

    /// NATS publish error
    #[error("NATS publish error: {0}")]
    NatsPublish(String),

    /// NATS subscribe error
    #[error("NATS subscribe error: {0}")]
    NatsSubscribe(String),

    /// Bus reachable neither now nor after the configured retries
    #[error("Message bus unavailable after {attempts} attempt(s): {last_error}")]
    BusUnavailable { attempts: usize, last_error: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout error
    #[error("Operation timed out after {elapsed:?}: {operation}")]
    Timeout { operation: String, elapsed: Duration },
}

/// Result type for infrastructure operations
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

impl From<async_nats::Error> for InfrastructureError {
    fn from(err: async_nats::Error) -> Self {
        InfrastructureError::NatsConnection(err.to_string())
    }
}

impl From<serde_json::Error> for InfrastructureError {
    fn from(err: serde_json::Error) -> Self {
        InfrastructureError::Serialization(err.to_string())
    }
}

/// Run `fut` under a deadline, surfacing expiry as [`InfrastructureError::Timeout`]
pub async fn with_deadline<F, T>(
    operation: &str,
    limit: Duration,
    fut: F,
) -> InfrastructureResult<T>
where
    F: std::future::Future<Output = InfrastructureResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(InfrastructureError::Timeout {
            operation: operation.to_string(),
            elapsed: limit,
        }),
    }
}
