// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer for Courses and Enrollments
//!
//! Workflows coordinate the stores and the event publisher:
//!
//! ```text
//! Caller (HTTP layer, already authenticated)
//!     ↓
//! Service Layer (this module)
//!     ↓
//! CourseStore / EnrollmentStore (system of record)
//!     ↓
//! EventPublisher (fire and forget)
//!     ↓
//! Durable queue → Index projector
//! ```
//!
//! Every workflow returns [`ServiceResult`]. Store and bus failures are
//! wrapped into a [`ServiceError`] whose [`ErrorKind`] tells the outer layer
//! which status code to answer with. Publishing never contributes an error.

use thiserror::Error;

use crate::domain::{CourseId, CourseValidationError, Identity, UserId};
use crate::store::StoreError;

pub mod course;
pub mod enrollment;

pub use course::CourseService;
pub use enrollment::EnrollmentWorkflow;

/// Service layer result type
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error kinds exposed to the outer layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidInput,
    Unauthorized,
    Forbidden,
    DependencyUnavailable,
}

impl ErrorKind {
    /// HTTP status code for this kind
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InvalidInput => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::DependencyUnavailable => 500,
        }
    }
}

/// Service layer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Course not found: {0}")]
    CourseNotFound(CourseId),

    #[error("User {user_id} is already enrolled in course {course_id}")]
    AlreadyEnrolled { course_id: CourseId, user_id: UserId },

    #[error("No available seats in course {0}")]
    NoAvailableSeats(CourseId),

    #[error("A course with the same title and instructor already exists")]
    DuplicateCourse,

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] CourseValidationError),

    #[error("Missing or invalid identity")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::CourseNotFound(_) => ErrorKind::NotFound,
            ServiceError::AlreadyEnrolled { .. }
            | ServiceError::NoAvailableSeats(_)
            | ServiceError::DuplicateCourse => ErrorKind::Conflict,
            ServiceError::InvalidInput(_) => ErrorKind::InvalidInput,
            ServiceError::Unauthorized => ErrorKind::Unauthorized,
            ServiceError::Forbidden(_) => ErrorKind::Forbidden,
            ServiceError::DependencyUnavailable(_) => ErrorKind::DependencyUnavailable,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CourseNotFound(id) => ServiceError::CourseNotFound(id),
            StoreError::DuplicateCourse => ServiceError::DuplicateCourse,
            StoreError::DuplicateEnrollment { course_id, user_id } => {
                ServiceError::AlreadyEnrolled { course_id, user_id }
            }
            other @ (StoreError::Unavailable(_)
            | StoreError::Timeout { .. }
            | StoreError::Corrupt(_)) => ServiceError::DependencyUnavailable(other.to_string()),
        }
    }
}

pub(crate) fn require_identity(identity: &Identity) -> ServiceResult<()> {
    if !identity.is_valid() {
        return Err(ServiceError::Unauthorized);
    }
    Ok(())
}

pub(crate) fn require_admin(identity: &Identity) -> ServiceResult<()> {
    require_identity(identity)?;
    if !identity.is_admin() {
        return Err(ServiceError::Forbidden("admin role required"));
    }
    Ok(())
}
