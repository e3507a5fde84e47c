// Copyright (c) 2025 - Cowboy AI, Inc.
//! NATS client abstraction for the course update bus

use async_nats::{Client, ConnectOptions};
use std::time::Duration;
use tracing::info;

use crate::errors::{InfrastructureError, InfrastructureResult};

/// Configuration for NATS connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatsConfig {
    /// NATS server URLs
    pub servers: Vec<String>,
    /// Client name
    pub name: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Request timeout, also bounds the wait for a publish acknowledgement
    pub request_timeout: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            name: "course-enrollment".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl NatsConfig {
    /// Parse a comma separated server list (`NATS_URL` format)
    pub fn with_servers(mut self, urls: &str) -> Self {
        self.servers = urls
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    /// Connection name reported to the server
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// NATS client wrapper
#[derive(Clone)]
pub struct NatsClient {
    client: Client,
    request_timeout: Duration,
}

impl NatsClient {
    /// Connect with the given configuration (single attempt)
    pub async fn connect(config: &NatsConfig) -> InfrastructureResult<Self> {
        if config.servers.is_empty() {
            return Err(InfrastructureError::Configuration(
                "no NATS servers configured".to_string(),
            ));
        }

        let connect_options = ConnectOptions::new()
            .name(&config.name)
            .connection_timeout(config.connect_timeout)
            .request_timeout(Some(config.request_timeout));

        let client = async_nats::connect_with_options(config.servers.join(","), connect_options)
            .await
            .map_err(|e| InfrastructureError::NatsConnection(e.to_string()))?;

        info!(servers = ?config.servers, "Connected to NATS");

        Ok(Self {
            client,
            request_timeout: config.request_timeout,
        })
    }

    /// JetStream context sharing this connection
    pub fn jetstream(&self) -> async_nats::jetstream::Context {
        async_nats::jetstream::new(self.client.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_server_list_parsing() {
        let config = NatsConfig::default().with_servers("nats://a:4222, nats://b:4222,");
        assert_eq!(
            config.servers,
            vec!["nats://a:4222".to_string(), "nats://b:4222".to_string()]
        );
    }

    #[test]
    fn test_with_name_keeps_servers() {
        let config = NatsConfig::default()
            .with_servers("nats://a:4222")
            .with_name("index-projector");
        assert_eq!(config.name, "index-projector");
        assert_eq!(config.servers, vec!["nats://a:4222".to_string()]);
    }

    #[tokio::test]
    async fn test_connect_without_servers_is_config_error() {
        let config = NatsConfig::default().with_servers("");
        let result = NatsClient::connect(&config).await;
        assert!(matches!(result, Err(InfrastructureError::Configuration(_))));
    }
}
