// Copyright (c) 2025 - Cowboy AI, Inc.
//! Search index
//!
//! The index is a denormalized, eventually consistent mirror of the course
//! store, keyed by the course id string. It is written only by the
//! [`crate::projection::IndexProjector`]; queries go to it directly and are
//! not served by this crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Course;
use crate::projection::ProjectionError;

pub mod memory;
#[cfg(feature = "solr")]
pub mod solr;

pub use memory::InMemorySearchIndex;
#[cfg(feature = "solr")]
pub use solr::SolrSearchIndex;

/// Course document as stored in the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: String,
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub category: String,
    pub duration: u32,
    pub available_seats: u32,
    pub image_url: String,
}

impl From<&Course> for SearchDocument {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id.to_string(),
            title: course.title.clone(),
            description: course.description.clone(),
            instructor: course.instructor.clone(),
            category: course.category.to_string(),
            duration: course.duration,
            available_seats: course.available_seats,
            image_url: course.image_url.clone(),
        }
    }
}

/// Write side of the search index
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Replace the document with the same id, creating it if absent
    async fn upsert(&self, document: SearchDocument) -> Result<(), ProjectionError>;

    /// Remove a document. Removing a missing id succeeds.
    async fn delete(&self, id: &str) -> Result<(), ProjectionError>;

    async fn get(&self, id: &str) -> Result<Option<SearchDocument>, ProjectionError>;

    async fn health_check(&self) -> Result<(), ProjectionError>;
}
