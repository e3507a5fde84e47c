// Copyright (c) 2025 - Cowboy AI, Inc.
//! Search Index Projector Service
//!
//! Listens to the durable course update stream and mirrors every event into
//! the Solr course index:
//! - Course events → JetStream → Consumer → Index projector → Solr
//!
//! Run with: cargo run --bin index-projector --features solr
//!
//! Prerequisites:
//! 1. NATS server with JetStream (NATS_URL, default: nats://localhost:4222)
//! 2. Solr with a course core (SOLR_URL / SOLR_CORE)

use anyhow::{Context, Result};
use course_enrollment::{
    bus::NatsBus,
    config::AppConfig,
    consumer::EventConsumer,
    index::SolrSearchIndex,
    nats::NatsClient,
    projection::{IndexProjector, ProjectionAdapter},
    retry::retry_with_backoff,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting search index projector");

    let config = AppConfig::from_env().context("Invalid configuration")?;
    info!(
        nats = ?config.nats.servers,
        stream = %config.stream.stream_name,
        consumer = %config.consumer.name,
        solr = %config.solr.base_url,
        core = %config.solr.core,
        "Configuration loaded"
    );

    let nats = config.nats.clone().with_name("index-projector");

    // Fail fast when the broker never comes up.
    let client = retry_with_backoff(&config.retry, "nats connect", || {
        NatsClient::connect(&nats)
    })
    .await
    .context("Failed to connect to NATS")?;
    drop(client);

    let index = SolrSearchIndex::new(config.solr.clone()).context("Failed to create Solr client")?;
    let mut projector = IndexProjector::new(index);
    projector
        .initialize()
        .await
        .context("Solr index is not reachable")?;

    let bus = NatsBus::new(nats, config.stream.clone(), config.consumer.clone());
    let consumer = EventConsumer::new(bus, projector, config.retry.backoff);

    let stats = consumer
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await;

    info!(
        projected = stats.projected,
        malformed = stats.malformed,
        failed = stats.failed,
        subscriptions = stats.subscriptions,
        "Search index projector stopped"
    );
    Ok(())
}
