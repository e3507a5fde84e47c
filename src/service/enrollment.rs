// Copyright (c) 2025 - Cowboy AI, Inc.
//! Enrollment Workflow
//!
//! # Enroll
//!
//! 1. Reject if the user is already enrolled (`AlreadyEnrolled`)
//! 2. Load the course (`CourseNotFound`)
//! 3. Reject a full course early (`NoAvailableSeats`)
//! 4. Reserve a seat with the store's atomic conditional decrement; zero
//!    matched rows means another enrollment took the last seat
//!    (`NoAvailableSeats`)
//! 5. Write the enrollment. If that fails the seat is released again before
//!    the error is returned; the storage uniqueness constraint reports a
//!    concurrent duplicate as `AlreadyEnrolled`
//! 6. Publish an upsert carrying the post-decrement seat count
//!
//! Step 1 and 3 are fast paths only. Correctness under concurrency rests on
//! step 4 and the uniqueness constraint in step 5.

use std::sync::Arc;
use tracing::{error, info, warn};

use super::{require_identity, ServiceError, ServiceResult};
use crate::domain::{CourseId, Enrollment, Identity};
use crate::publisher::EventPublisher;
use crate::store::{CourseStore, EnrollmentStore};

/// Seat reservation and enrollment
#[derive(Clone)]
pub struct EnrollmentWorkflow {
    courses: Arc<dyn CourseStore>,
    enrollments: Arc<dyn EnrollmentStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl EnrollmentWorkflow {
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

    /// Enroll the caller in a course
    pub async fn enroll(&self, identity: &Identity, course_id: CourseId) -> ServiceResult<Enrollment> {
        require_identity(identity)?;
        let user_id = identity.user_id;

        if self.enrollments.exists_for(&course_id, user_id).await? {
            return Err(ServiceError::AlreadyEnrolled { course_id, user_id });
        }

        let mut course = self
            .courses
            .find_by_id(&course_id)
            .await?
            .ok_or(ServiceError::CourseNotFound(course_id))?;

        if !course.has_seats() {
            return Err(ServiceError::NoAvailableSeats(course_id));
        }

        let remaining = self
            .courses
            .decrement_seat_if_positive(&course_id)
            .await?
            .ok_or(ServiceError::NoAvailableSeats(course_id))?;

        let enrollment = Enrollment::new(course_id, user_id);
        if let Err(e) = self.enrollments.create(&enrollment).await {
            self.release_reserved_seat(&course_id).await;
            return Err(e.into());
        }

        info!(%course_id, %user_id, remaining, "User enrolled");

        course.available_seats = remaining;
        self.publisher.publish_upsert(&course);

        Ok(enrollment)
    }

    /// Whether the caller is enrolled in a course
    pub async fn check_enrollment(&self, identity: &Identity, course_id: CourseId) -> ServiceResult<bool> {
        require_identity(identity)?;
        Ok(self.enrollments.exists_for(&course_id, identity.user_id).await?)
    }

    /// All enrollments of the caller
    pub async fn user_enrollments(&self, identity: &Identity) -> ServiceResult<Vec<Enrollment>> {
        require_identity(identity)?;
        Ok(self.enrollments.find_by_user(identity.user_id).await?)
    }

    async fn release_reserved_seat(&self, course_id: &CourseId) {
        match self.courses.release_seat(course_id).await {
            Ok(Some(seats)) => warn!(%course_id, seats, "Released seat after failed enrollment"),
            Ok(None) => warn!(%course_id, "Course vanished before seat could be released"),
            Err(e) => error!(%course_id, error = %e, "Failed to release reserved seat"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Course, UserId};
    use crate::events::CourseUpdateEvent;
    use crate::publisher::RecordingPublisher;
    use crate::service::ErrorKind;
    use crate::store::{InMemoryCourseStore, InMemoryEnrollmentStore};
    use pretty_assertions::assert_eq;

    struct Fixture {
        courses: Arc<InMemoryCourseStore>,
        enrollments: Arc<InMemoryEnrollmentStore>,
        publisher: Arc<RecordingPublisher>,
        workflow: EnrollmentWorkflow,
    }

    fn fixture() -> Fixture {
        let courses = Arc::new(InMemoryCourseStore::new());
        let enrollments = Arc::new(InMemoryEnrollmentStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let workflow = EnrollmentWorkflow::new(courses.clone(), enrollments.clone(), publisher.clone());
        Fixture {
            courses,
            enrollments,
            publisher,
            workflow,
        }
    }

    async fn seed(f: &Fixture, seats: u32) -> Course {
        let course = Course {
            id: CourseId::new(),
            title: format!("Course {}", CourseId::new()),
            description: "desc".to_string(),
            instructor: "Linus".to_string(),
            category: Category::WebDevelopment,
            duration: 3,
            image_url: "https://img.example.com/c.png".to_string(),
            available_seats: seats,
        };
        f.courses.create(&course).await.unwrap();
        course
    }

    #[tokio::test]
    async fn test_enroll_decrements_and_publishes() {
        let f = fixture();
        let course = seed(&f, 2).await;

        let enrollment = f.workflow.enroll(&Identity::student(7), course.id).await.unwrap();

        assert_eq!(enrollment.user_id, UserId(7));
        assert_eq!(f.courses.find_by_id(&course.id).await.unwrap().unwrap().available_seats, 1);
        let events = f.publisher.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            CourseUpdateEvent::Upsert(published) => assert_eq!(published.available_seats, 1),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_second_enroll_is_conflict_and_leaves_seats() {
        let f = fixture();
        let course = seed(&f, 5).await;
        let identity = Identity::student(42);

        f.workflow.enroll(&identity, course.id).await.unwrap();
        let err = f.workflow.enroll(&identity, course.id).await.unwrap_err();

        assert_eq!(
            err,
            ServiceError::AlreadyEnrolled {
                course_id: course.id,
                user_id: UserId(42)
            }
        );
        assert_eq!(f.courses.find_by_id(&course.id).await.unwrap().unwrap().available_seats, 4);
        assert_eq!(f.publisher.events().len(), 1);
    }

    #[tokio::test]
    async fn test_full_course_is_rejected_without_writes() {
        let f = fixture();
        let course = seed(&f, 1).await;
        f.workflow.enroll(&Identity::student(1), course.id).await.unwrap();

        let err = f.workflow.enroll(&Identity::student(2), course.id).await.unwrap_err();

        assert_eq!(err, ServiceError::NoAvailableSeats(course.id));
        assert_eq!(f.enrollments.count_for(&course.id), 1);
    }

    #[tokio::test]
    async fn test_unknown_course() {
        let f = fixture();
        let id = CourseId::new();
        assert_eq!(
            f.workflow.enroll(&Identity::student(1), id).await.unwrap_err(),
            ServiceError::CourseNotFound(id)
        );
    }

    #[tokio::test]
    async fn test_failed_enrollment_write_releases_seat() {
        let f = fixture();
        let course = seed(&f, 3).await;

        // Pre-existing row the fast-path check cannot see: the constraint fires on insert.
        f.enrollments
            .create(&Enrollment::new(course.id, UserId(9)))
            .await
            .unwrap();
        let workflow = EnrollmentWorkflow::new(
            f.courses.clone(),
            Arc::new(BlindEnrollments(f.enrollments.clone())),
            f.publisher.clone(),
        );

        let err = workflow.enroll(&Identity::student(9), course.id).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(f.courses.find_by_id(&course.id).await.unwrap().unwrap().available_seats, 3);
        assert!(f.publisher.events().is_empty());
    }

    #[tokio::test]
    async fn test_store_outage_is_dependency_unavailable() {
        let f = fixture();
        let course = seed(&f, 3).await;
        f.enrollments.set_unavailable(true);

        let err = f.workflow.enroll(&Identity::student(1), course.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::DependencyUnavailable(_)));
    }

    #[tokio::test]
    async fn test_invalid_identity_is_unauthorized() {
        let f = fixture();
        let course = seed(&f, 3).await;
        assert_eq!(
            f.workflow.enroll(&Identity::student(0), course.id).await.unwrap_err(),
            ServiceError::Unauthorized
        );
        assert_eq!(
            f.workflow.check_enrollment(&Identity::student(-1), course.id).await.unwrap_err(),
            ServiceError::Unauthorized
        );
    }

    #[tokio::test]
    async fn test_check_and_list_enrollments() {
        let f = fixture();
        let a = seed(&f, 3).await;
        let b = seed(&f, 3).await;
        let identity = Identity::student(5);

        f.workflow.enroll(&identity, a.id).await.unwrap();

        assert!(f.workflow.check_enrollment(&identity, a.id).await.unwrap());
        assert!(!f.workflow.check_enrollment(&identity, b.id).await.unwrap());
        assert_eq!(f.workflow.user_enrollments(&identity).await.unwrap().len(), 1);
    }

    /// Enrollment store whose existence check always misses
    struct BlindEnrollments(Arc<InMemoryEnrollmentStore>);

    #[async_trait::async_trait]
    impl EnrollmentStore for BlindEnrollments {
        async fn create(&self, enrollment: &Enrollment) -> crate::store::StoreResult<()> {
            self.0.create(enrollment).await
        }

        async fn exists_for(&self, _: &CourseId, _: UserId) -> crate::store::StoreResult<bool> {
            Ok(false)
        }

        async fn find_by_user(&self, user_id: UserId) -> crate::store::StoreResult<Vec<Enrollment>> {
            self.0.find_by_user(user_id).await
        }
    }
}
