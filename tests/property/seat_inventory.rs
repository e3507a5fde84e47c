// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Seat Inventory
//!
//! For any seat count and any sequence of enrollment attempts:
//! - successful enrollments never exceed the initial seat count
//! - seats left + successful enrollments == initial seats
//! - each (course, user) pair holds at most one enrollment

use std::collections::HashSet;
use std::sync::Arc;

use course_enrollment::domain::{Identity, NewCourse};
use course_enrollment::publisher::RecordingPublisher;
use course_enrollment::service::{CourseService, EnrollmentWorkflow, ServiceError};
use course_enrollment::store::{CourseStore, InMemoryCourseStore, InMemoryEnrollmentStore};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap()
}

fn course_input(seats: u32) -> NewCourse {
    NewCourse {
        title: "Property Testing".to_string(),
        description: "Shrinking and strategies".to_string(),
        instructor: "Quinn".to_string(),
        category: "data-science".to_string(),
        duration: 5,
        image_url: "https://img.example.com/p.png".to_string(),
        available_seats: seats,
    }
}

struct Outcome {
    initial: u32,
    left: u32,
    succeeded: Vec<i64>,
    rejected_full: usize,
    rejected_duplicate: usize,
}

/// Run all `users` concurrently against a course with `seats` seats
fn race(seats: u32, users: Vec<i64>) -> Outcome {
    runtime().block_on(async move {
        let courses = Arc::new(InMemoryCourseStore::new());
        let enrollments = Arc::new(InMemoryEnrollmentStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let service = CourseService::new(courses.clone(), enrollments.clone(), publisher.clone());
        let workflow = EnrollmentWorkflow::new(courses.clone(), enrollments, publisher);

        let course = service
            .create_course(&Identity::admin(1), course_input(seats))
            .await
            .unwrap();
        let course_id = course.id;

        let tasks: Vec<_> = users
            .into_iter()
            .map(|user| {
                let workflow = workflow.clone();
                tokio::spawn(async move {
                    (user, workflow.enroll(&Identity::student(user), course_id).await)
                })
            })
            .collect();

        let mut outcome = Outcome {
            initial: seats,
            left: 0,
            succeeded: Vec::new(),
            rejected_full: 0,
            rejected_duplicate: 0,
        };
        for task in tasks {
            match task.await.unwrap() {
                (user, Ok(_)) => outcome.succeeded.push(user),
                (_, Err(ServiceError::NoAvailableSeats(_))) => outcome.rejected_full += 1,
                (_, Err(ServiceError::AlreadyEnrolled { .. })) => outcome.rejected_duplicate += 1,
                (_, Err(other)) => panic!("unexpected error {other:?}"),
            }
        }

        outcome.left = courses
            .find_by_id(&course_id)
            .await
            .unwrap()
            .unwrap()
            .available_seats;
        outcome
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: distinct users never oversell
    #[test]
    fn prop_distinct_users_never_oversell(seats in 1u32..12, users in 1i64..40) {
        let outcome = race(seats, (1..=users).collect());

        prop_assert!(outcome.succeeded.len() as u32 <= outcome.initial);
        prop_assert_eq!(outcome.left + outcome.succeeded.len() as u32, outcome.initial);
        prop_assert_eq!(
            outcome.succeeded.len(),
            std::cmp::min(seats as usize, users as usize)
        );
        prop_assert_eq!(outcome.rejected_duplicate, 0);
    }

    /// Property: repeated users hold at most one enrollment each
    #[test]
    fn prop_each_user_enrolls_at_most_once(
        users in prop::collection::vec(1i64..6, 1..30),
    ) {
        let seats = 40;
        let distinct: HashSet<i64> = users.iter().copied().collect();
        let attempts = users.len();
        let outcome = race(seats, users);

        let enrolled: HashSet<i64> = outcome.succeeded.iter().copied().collect();
        prop_assert_eq!(enrolled.len(), outcome.succeeded.len());
        prop_assert_eq!(enrolled, distinct);
        prop_assert_eq!(outcome.left, seats - outcome.succeeded.len() as u32);
        prop_assert_eq!(outcome.rejected_full, 0);
        prop_assert_eq!(outcome.rejected_duplicate, attempts - outcome.succeeded.len());
    }
}
