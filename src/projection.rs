// Copyright (c) 2025 - Cowboy AI, Inc.

//! Projection of course update events into the search index
//!
//! A projection maps the event stream onto read-model state:
//!
//! ```text
//! EventStream ────F──────> IndexState
//!    │                        │
//!    │ Events                 │ Updates
//!    ▼                        ▼
//! [e1, e2, e3]  ──>  [u1, u2, u3]
//! ```
//!
//! For course updates `F(upsert(c))` replaces the whole document `c.id` and
//! `F(delete(id))` removes it. Both are idempotent, so redelivery and
//! multiple consumers converge on the same index state.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::events::CourseUpdateEvent;
use crate::index::{SearchDocument, SearchIndex};

/// Projection Adapter trait
///
/// Implementations must make re-applying the same event produce the same
/// target state.
#[async_trait]
pub trait ProjectionAdapter: Send + Sync {
    /// The event type this projection handles
    type Event: Send + Sync;

    /// Error type for projection operations
    type Error: std::error::Error + Send + Sync;

    /// Project an event into the target
    async fn project(&mut self, event: Self::Event) -> Result<(), Self::Error>;

    /// Prepare the target and verify it is reachable. Safe to call repeatedly.
    async fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Health check for the projection target
    async fn health_check(&self) -> Result<(), Self::Error>;

    /// Get the name of this projection adapter
    fn name(&self) -> &str;
}

/// Errors that can occur during projection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    /// Projection target is not available
    #[error("Projection target unavailable: {0}")]
    TargetUnavailable(String),

    /// Target rejected the update
    #[error("Index error: {0}")]
    IndexError(String),
}

/// Applies course update events to a [`SearchIndex`]
pub struct IndexProjector<I> {
    index: I,
}

impl<I: SearchIndex> IndexProjector<I> {
    pub fn new(index: I) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &I {
        &self.index
    }
}

#[async_trait]
impl<I: SearchIndex> ProjectionAdapter for IndexProjector<I> {
    type Event = CourseUpdateEvent;
    type Error = ProjectionError;

    async fn project(&mut self, event: Self::Event) -> Result<(), Self::Error> {
        match event {
            CourseUpdateEvent::Upsert(course) => {
                debug!(course_id = %course.id, seats = course.available_seats, "Upserting document");
                self.index.upsert(SearchDocument::from(&course)).await
            }
            CourseUpdateEvent::Delete(deleted) => {
                debug!(course_id = %deleted.id, "Deleting document");
                self.index.delete(&deleted.id.to_string()).await
            }
        }
    }

    async fn initialize(&mut self) -> Result<(), Self::Error> {
        self.health_check().await?;
        info!(projection = self.name(), "Projection target ready");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), Self::Error> {
        self.index.health_check().await
    }

    fn name(&self) -> &str {
        "course-search-index"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Course, CourseId};
    use crate::index::InMemorySearchIndex;
    use pretty_assertions::assert_eq;

    fn course(seats: u32) -> Course {
        Course {
            id: CourseId::new(),
            title: "Marketing 101".to_string(),
            description: "Positioning".to_string(),
            instructor: "Peter".to_string(),
            category: Category::Business,
            duration: 6,
            image_url: "https://img.example.com/m.png".to_string(),
            available_seats: seats,
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let mut projector = IndexProjector::new(InMemorySearchIndex::new());
        let c = course(3);

        projector.project(CourseUpdateEvent::upsert(&c)).await.unwrap();
        let first = projector.index().document(&c.id.to_string());
        projector.project(CourseUpdateEvent::upsert(&c)).await.unwrap();
        let second = projector.index().document(&c.id.to_string());

        assert_eq!(first, second);
        assert_eq!(projector.index().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_whole_document() {
        let mut projector = IndexProjector::new(InMemorySearchIndex::new());
        let mut c = course(3);
        projector.project(CourseUpdateEvent::upsert(&c)).await.unwrap();

        c.available_seats = 2;
        c.title = "Marketing 102".to_string();
        projector.project(CourseUpdateEvent::upsert(&c)).await.unwrap();

        assert_eq!(
            projector.index().document(&c.id.to_string()),
            Some(SearchDocument::from(&c))
        );
    }

    #[tokio::test]
    async fn test_delete_of_missing_document_is_noop() {
        let mut projector = IndexProjector::new(InMemorySearchIndex::new());
        projector
            .project(CourseUpdateEvent::delete(CourseId::new()))
            .await
            .unwrap();
        assert_eq!(projector.index().len(), 0);
    }

    #[tokio::test]
    async fn test_initialize_fails_when_index_down() {
        let index = InMemorySearchIndex::new();
        index.set_unavailable(true);
        let mut projector = IndexProjector::new(index);

        assert!(matches!(
            projector.initialize().await,
            Err(ProjectionError::TargetUnavailable(_))
        ));
    }
}
