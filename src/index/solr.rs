// Copyright (c) 2025 - Cowboy AI, Inc.

//! Solr search index adapter
//!
//! Writes course documents through Solr's JSON update handler:
//!
//! ```text
//! upsert(doc) = POST /solr/{core}/update?commit=true  {"add":{"doc":{…},"overwrite":true}}
//! delete(id)  = POST /solr/{core}/update?commit=true  {"delete":{"id":"…"}}
//! get(id)     = GET  /solr/{core}/get?id=…
//! health      = GET  /solr/{core}/admin/ping
//! ```
//!
//! Solr treats an `add` with an existing unique key as a full replace and a
//! delete of an unknown key as a no-op, which is exactly the projection's
//! idempotency contract.
//!
//! # Example
//!
//! ```rust,no_run
//! use course_enrollment::config::SolrConfig;
//! use course_enrollment::index::{SearchIndex, SolrSearchIndex};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let index = SolrSearchIndex::new(SolrConfig::default())?;
//!     index.health_check().await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::{SearchDocument, SearchIndex};
use crate::config::SolrConfig;
use crate::projection::ProjectionError;

#[derive(Debug, Deserialize)]
struct RealTimeGet {
    doc: Option<SearchDocument>,
}

/// Solr-backed search index
pub struct SolrSearchIndex {
    config: SolrConfig,
    client: Client,
}

impl SolrSearchIndex {
    pub fn new(config: SolrConfig) -> Result<Self, ProjectionError> {
        info!(url = %config.base_url, core = %config.core, "Configuring Solr index");

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ProjectionError::TargetUnavailable(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    fn core_url(&self, path: &str) -> String {
        format!(
            "{}/solr/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.core,
            path
        )
    }

    async fn send_update(&self, command: serde_json::Value) -> Result<(), ProjectionError> {
        let response = self
            .client
            .post(self.core_url("update"))
            .query(&[("commit", "true")])
            .json(&command)
            .send()
            .await
            .map_err(|e| ProjectionError::TargetUnavailable(format!("Solr request failed: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ProjectionError::IndexError(format!(
                "Solr returned {}: {}",
                status, body
            )))
        }
    }
}

#[async_trait]
impl SearchIndex for SolrSearchIndex {
    async fn upsert(&self, document: SearchDocument) -> Result<(), ProjectionError> {
        let id = document.id.clone();
        self.send_update(json!({ "add": { "doc": document, "overwrite": true } }))
            .await?;
        debug!(course_id = %id, "Upserted Solr document");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), ProjectionError> {
        self.send_update(json!({ "delete": { "id": id } })).await?;
        debug!(course_id = %id, "Deleted Solr document");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<SearchDocument>, ProjectionError> {
        let response = self
            .client
            .get(self.core_url("get"))
            .query(&[("id", id)])
            .send()
            .await
            .map_err(|e| ProjectionError::TargetUnavailable(format!("Solr request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ProjectionError::IndexError(format!(
                "Solr returned {}",
                response.status()
            )));
        }

        let body: RealTimeGet = response
            .json()
            .await
            .map_err(|e| ProjectionError::IndexError(format!("Unexpected Solr response: {}", e)))?;
        Ok(body.doc)
    }

    async fn health_check(&self) -> Result<(), ProjectionError> {
        let response = self
            .client
            .get(self.core_url("admin/ping"))
            .send()
            .await
            .map_err(|e| {
                ProjectionError::TargetUnavailable(format!("Solr health check failed: {}", e))
            })?;

        if response.status().is_success() {
            debug!("Solr health check passed");
            Ok(())
        } else {
            Err(ProjectionError::TargetUnavailable(format!(
                "Solr returned status: {}",
                response.status()
            )))
        }
    }
}
