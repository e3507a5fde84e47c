// Copyright (c) 2025 - Cowboy AI, Inc.
//! System of Record
//!
//! Capability traits for the course and enrollment stores. Workflows depend
//! only on these traits; concrete backends live in [`memory`] and (behind the
//! `postgres` feature) `postgres`.
//!
//! # Seat Inventory
//!
//! [`CourseStore::decrement_seat_if_positive`] is the sole source of ordering
//! truth for seat allocation. Backends must implement it as one atomic
//! conditional update; a read followed by a write is never acceptable because
//! the store is shared by every process instance.
//!
//! # Enrollment Uniqueness
//!
//! [`EnrollmentStore::create`] enforces `(course_id, user_id)` uniqueness at
//! the storage layer and reports a violation as
//! [`StoreError::DuplicateEnrollment`].

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use crate::domain::{Course, CourseId, Enrollment, UserId};

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::{InMemoryCourseStore, InMemoryEnrollmentStore};
#[cfg(feature = "postgres")]
pub use postgres::{PostgresCourseStore, PostgresEnrollmentStore};

/// Store layer errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Course not found: {0}")]
    CourseNotFound(CourseId),

    #[error("A course with the same title and instructor already exists")]
    DuplicateCourse,

    #[error("User {user_id} is already enrolled in course {course_id}")]
    DuplicateEnrollment { course_id: CourseId, user_id: UserId },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store operation timed out after {elapsed:?}: {operation}")]
    Timeout { operation: &'static str, elapsed: Duration },

    #[error("Stored data is invalid: {0}")]
    Corrupt(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Run a store call under a deadline
pub async fn within<F, T>(operation: &'static str, limit: Duration, fut: F) -> StoreResult<T>
where
    F: std::future::Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            operation,
            elapsed: limit,
        }),
    }
}

/// Durable storage of course documents
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Insert a new course
    ///
    /// # Errors
    /// - `DuplicateCourse` if a course with the same title and instructor exists
    async fn create(&self, course: &Course) -> StoreResult<()>;

    async fn find_by_id(&self, id: &CourseId) -> StoreResult<Option<Course>>;

    /// Batch lookup; unknown ids are silently absent from the result
    async fn find_by_ids(&self, ids: &[CourseId]) -> StoreResult<Vec<Course>>;

    async fn find_all(&self) -> StoreResult<Vec<Course>>;

    /// Replace the descriptive fields keyed by `course.id`
    ///
    /// `available_seats` is only written when `seat_override` is set; otherwise
    /// the stored count is kept, so concurrent decrements are never undone.
    /// Returns the document as stored.
    ///
    /// # Errors
    /// - `CourseNotFound` if zero rows matched
    /// - `DuplicateCourse` if the edit collides with another course's title+instructor
    async fn update(&self, course: &Course, seat_override: Option<u32>) -> StoreResult<Course>;

    /// # Errors
    /// - `CourseNotFound` if zero rows matched
    async fn delete(&self, id: &CourseId) -> StoreResult<()>;

    /// Atomically decrement `available_seats` iff it is positive at write time
    ///
    /// Returns the post-decrement count, or `None` when the condition matched
    /// zero rows (seats exhausted or course gone).
    async fn decrement_seat_if_positive(&self, id: &CourseId) -> StoreResult<Option<u32>>;

    /// Compensating increment for a reservation whose enrollment could not be written
    ///
    /// Returns the new count, or `None` if the course no longer exists.
    async fn release_seat(&self, id: &CourseId) -> StoreResult<Option<u32>>;

    /// Seat counts of the courses in `ids` that still have seats
    async fn availability(&self, ids: &[CourseId]) -> StoreResult<BTreeMap<CourseId, u32>>;
}

/// Durable storage of enrollment records
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// # Errors
    /// - `DuplicateEnrollment` when `(course_id, user_id)` is already present
    async fn create(&self, enrollment: &Enrollment) -> StoreResult<()>;

    async fn exists_for(&self, course_id: &CourseId, user_id: UserId) -> StoreResult<bool>;

    async fn find_by_user(&self, user_id: UserId) -> StoreResult<Vec<Enrollment>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{ErrorKind, ServiceError};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_within_times_out_with_typed_error() {
        let limit = Duration::from_millis(10);
        let result: StoreResult<()> = within("course.find_by_id", limit, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(
            err,
            StoreError::Timeout {
                operation: "course.find_by_id",
                elapsed: limit,
            }
        );
        assert_eq!(ServiceError::from(err).kind(), ErrorKind::DependencyUnavailable);
    }

    #[tokio::test]
    async fn test_within_passes_through_result() {
        let ok = within("course.delete", Duration::from_secs(1), async { Ok(3) }).await;
        assert_eq!(ok, Ok(3));

        let id = CourseId::new();
        let missing: StoreResult<()> = within("course.delete", Duration::from_secs(1), async move {
            Err(StoreError::CourseNotFound(id))
        })
        .await;
        assert_eq!(missing, Err(StoreError::CourseNotFound(id)));
    }
}
