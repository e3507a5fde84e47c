// Copyright (c) 2025 - Cowboy AI, Inc.
//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use course_enrollment::bus::InMemoryBus;
use course_enrollment::domain::{Identity, NewCourse};
use course_enrollment::publisher::{PublishWorker, QueuedPublisher};
use course_enrollment::retry::RetryPolicy;
use course_enrollment::service::{CourseService, EnrollmentWorkflow};
use course_enrollment::store::{InMemoryCourseStore, InMemoryEnrollmentStore};
use tokio::task::JoinHandle;

pub fn admin() -> Identity {
    Identity::admin(1)
}

pub fn new_course(title: &str, seats: u32) -> NewCourse {
    NewCourse {
        title: title.to_string(),
        description: "Hands-on course".to_string(),
        instructor: "Barbara".to_string(),
        category: "web-development".to_string(),
        duration: 12,
        image_url: "https://img.example.com/course.png".to_string(),
        available_seats: seats,
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1))
}

/// Course side of the system wired over in-memory stores and bus
pub struct CourseSide {
    pub courses: Arc<InMemoryCourseStore>,
    pub enrollments: Arc<InMemoryEnrollmentStore>,
    pub bus: InMemoryBus,
    pub course_service: CourseService,
    pub workflow: EnrollmentWorkflow,
    pub publisher: Arc<QueuedPublisher>,
    pub worker: JoinHandle<course_enrollment::publisher::PublishStats>,
}

impl CourseSide {
    pub fn new(bus: InMemoryBus) -> Self {
        let courses = Arc::new(InMemoryCourseStore::new());
        let enrollments = Arc::new(InMemoryEnrollmentStore::new());
        let (publisher, worker) = PublishWorker::spawn(bus.clone(), fast_retry());
        let publisher = Arc::new(publisher);

        Self {
            course_service: CourseService::new(courses.clone(), enrollments.clone(), publisher.clone()),
            workflow: EnrollmentWorkflow::new(courses.clone(), enrollments.clone(), publisher.clone()),
            courses,
            enrollments,
            bus,
            publisher,
            worker,
        }
    }
}

/// Poll `condition` until it holds or about a second has passed
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
