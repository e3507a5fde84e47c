// Copyright (c) 2025 - Cowboy AI, Inc.
//! Enrollment Domain Models
//!
//! Core domain concepts for course enrollment: the course document with its
//! seat inventory, the enrollment record and the identity injected by the
//! (external) authentication layer.
//!
//! # Value Objects with Invariants
//!
//! - [`Category`] - Fixed allow-list of course categories
//! - [`CourseId`] / [`EnrollmentId`] - Opaque time-ordered identifiers
//! - [`UserId`] - Integer identity of an authenticated user
//!
//! # Entities
//!
//! - [`Course`] - Course document; `available_seats` is unsigned and so can
//!   never become negative
//! - [`Enrollment`] - At most one per `(course_id, user_id)`

pub mod course;
pub mod enrollment;
pub mod identity;

pub use course::{Category, Course, CourseId, CoursePatch, CourseValidationError, NewCourse};
pub use enrollment::{Enrollment, EnrollmentId};
pub use identity::{Identity, Role, UserId};
