// Copyright (c) 2025 - Cowboy AI, Inc.
//! Course workflows
//!
//! Mutations are admin-only. Each successful mutation is followed by a
//! fire-and-forget publish so the search index catches up; the store stays
//! authoritative whether or not that publish ever reaches the bus.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use super::{require_admin, require_identity, ServiceError, ServiceResult};
use crate::domain::{Course, CourseId, CoursePatch, Identity, NewCourse};
use crate::publisher::EventPublisher;
use crate::store::{CourseStore, EnrollmentStore};

/// Course catalogue workflows
#[derive(Clone)]
pub struct CourseService {
    courses: Arc<dyn CourseStore>,
    enrollments: Arc<dyn EnrollmentStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl CourseService {
    pub fn new(
        courses: Arc<dyn CourseStore>,
        enrollments: Arc<dyn EnrollmentStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            courses,
            enrollments,
            publisher,
        }
    }

    /// Validate and store a new course, then publish it
    ///
    /// # Errors
    /// - `InvalidInput` for empty fields, zero duration or seats, unknown category
    /// - `DuplicateCourse` when title and instructor are already taken
    pub async fn create_course(&self, identity: &Identity, input: NewCourse) -> ServiceResult<Course> {
        require_admin(identity)?;
        let course = input.into_course()?;

        self.courses.create(&course).await?;
        info!(course_id = %course.id, title = %course.title, "Course created");

        self.publisher.publish_upsert(&course);
        Ok(course)
    }

    pub async fn get_course(&self, id: CourseId) -> ServiceResult<Course> {
        self.courses
            .find_by_id(&id)
            .await?
            .ok_or(ServiceError::CourseNotFound(id))
    }

    pub async fn list_courses(&self) -> ServiceResult<Vec<Course>> {
        Ok(self.courses.find_all().await?)
    }

    /// Apply a partial edit to the descriptive fields
    ///
    /// The seat count is only written when the patch sets `available_seats`,
    /// as an administrative top-up (or cut) of the inventory. Otherwise the
    /// stored count is kept as-is.
    pub async fn update_course(
        &self,
        identity: &Identity,
        id: CourseId,
        patch: CoursePatch,
    ) -> ServiceResult<Course> {
        require_admin(identity)?;
        let seat_override = patch.available_seats;
        let current = self.get_course(id).await?;
        let edited = patch.apply(current)?;

        let updated = self.courses.update(&edited, seat_override).await?;
        info!(course_id = %id, seats = updated.available_seats, "Course updated");

        self.publisher.publish_upsert(&updated);
        Ok(updated)
    }

    pub async fn delete_course(&self, identity: &Identity, id: CourseId) -> ServiceResult<()> {
        require_admin(identity)?;
        self.courses.delete(&id).await?;
        info!(course_id = %id, "Course deleted");

        self.publisher.publish_delete(&id);
        Ok(())
    }

    /// Seat counts for the requested courses that still have seats
    pub async fn check_availability(&self, ids: &[CourseId]) -> ServiceResult<BTreeMap<CourseId, u32>> {
        Ok(self.courses.availability(ids).await?)
    }

    /// Courses the caller is enrolled in
    pub async fn user_courses(&self, identity: &Identity) -> ServiceResult<Vec<Course>> {
        require_identity(identity)?;
        let ids: Vec<CourseId> = self
            .enrollments
            .find_by_user(identity.user_id)
            .await?
            .into_iter()
            .map(|e| e.course_id)
            .collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.courses.find_by_ids(&ids).await?)
    }
}
