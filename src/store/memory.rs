// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory stores
//!
//! Every operation, including the conditional seat decrement, runs inside a
//! single critical section so the atomicity guarantees match the SQL backend.
//! The guard is never held across an `.await`.
//!
//! [`InMemoryCourseStore::set_unavailable`] lets tests simulate an outage.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{CourseStore, EnrollmentStore, StoreError, StoreResult};
use crate::domain::{Course, CourseId, Enrollment, UserId};

fn lock<T>(mutex: &Mutex<T>) -> StoreResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
}

/// In-memory course store
#[derive(Debug, Default)]
pub struct InMemoryCourseStore {
    courses: Mutex<HashMap<CourseId, Course>>,
    unavailable: AtomicBool,
}

impl InMemoryCourseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("course store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CourseStore for InMemoryCourseStore {
    async fn create(&self, course: &Course) -> StoreResult<()> {
        self.check_available()?;
        let mut courses = lock(&self.courses)?;

        let duplicate = courses
            .values()
            .any(|c| c.title == course.title && c.instructor == course.instructor);
        if duplicate {
            return Err(StoreError::DuplicateCourse);
        }

        courses.insert(course.id, course.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &CourseId) -> StoreResult<Option<Course>> {
        self.check_available()?;
        Ok(lock(&self.courses)?.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[CourseId]) -> StoreResult<Vec<Course>> {
        self.check_available()?;
        let courses = lock(&self.courses)?;
        Ok(ids.iter().filter_map(|id| courses.get(id).cloned()).collect())
    }

    async fn find_all(&self) -> StoreResult<Vec<Course>> {
        self.check_available()?;
        let mut all: Vec<Course> = lock(&self.courses)?.values().cloned().collect();
        all.sort_by_key(|c| c.id);
        Ok(all)
    }

    async fn update(&self, course: &Course, seat_override: Option<u32>) -> StoreResult<Course> {
        self.check_available()?;
        let mut courses = lock(&self.courses)?;

        let Some(stored_seats) = courses.get(&course.id).map(|c| c.available_seats) else {
            return Err(StoreError::CourseNotFound(course.id));
        };
        let collides = courses.values().any(|c| {
            c.id != course.id && c.title == course.title && c.instructor == course.instructor
        });
        if collides {
            return Err(StoreError::DuplicateCourse);
        }

        let stored = Course {
            available_seats: seat_override.unwrap_or(stored_seats),
            ..course.clone()
        };
        courses.insert(course.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: &CourseId) -> StoreResult<()> {
        self.check_available()?;
        lock(&self.courses)?
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::CourseNotFound(*id))
    }

    async fn decrement_seat_if_positive(&self, id: &CourseId) -> StoreResult<Option<u32>> {
        self.check_available()?;
        let mut courses = lock(&self.courses)?;

        Ok(courses.get_mut(id).and_then(|course| {
            course.available_seats = course.available_seats.checked_sub(1)?;
            Some(course.available_seats)
        }))
    }

    async fn release_seat(&self, id: &CourseId) -> StoreResult<Option<u32>> {
        self.check_available()?;
        let mut courses = lock(&self.courses)?;

        Ok(courses.get_mut(id).map(|course| {
            course.available_seats = course.available_seats.saturating_add(1);
            course.available_seats
        }))
    }

    async fn availability(&self, ids: &[CourseId]) -> StoreResult<BTreeMap<CourseId, u32>> {
        self.check_available()?;
        let courses = lock(&self.courses)?;

        Ok(ids
            .iter()
            .filter_map(|id| courses.get(id))
            .filter(|c| c.has_seats())
            .map(|c| (c.id, c.available_seats))
            .collect())
    }
}

/// In-memory enrollment store with a `(course_id, user_id)` uniqueness constraint
#[derive(Debug, Default)]
pub struct InMemoryEnrollmentStore {
    enrollments: Mutex<Vec<Enrollment>>,
    unavailable: AtomicBool,
}

impl InMemoryEnrollmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored enrollments for a course
    pub fn count_for(&self, course_id: &CourseId) -> usize {
        self.enrollments
            .lock()
            .map(|e| e.iter().filter(|e| &e.course_id == course_id).count())
            .unwrap_or(0)
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("enrollment store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryEnrollmentStore {
    async fn create(&self, enrollment: &Enrollment) -> StoreResult<()> {
        self.check_available()?;
        let mut enrollments = lock(&self.enrollments)?;

        let duplicate = enrollments
            .iter()
            .any(|e| e.course_id == enrollment.course_id && e.user_id == enrollment.user_id);
        if duplicate {
            return Err(StoreError::DuplicateEnrollment {
                course_id: enrollment.course_id,
                user_id: enrollment.user_id,
            });
        }

        enrollments.push(enrollment.clone());
        Ok(())
    }

    async fn exists_for(&self, course_id: &CourseId, user_id: UserId) -> StoreResult<bool> {
        self.check_available()?;
        Ok(lock(&self.enrollments)?
            .iter()
            .any(|e| &e.course_id == course_id && e.user_id == user_id))
    }

    async fn find_by_user(&self, user_id: UserId) -> StoreResult<Vec<Enrollment>> {
        self.check_available()?;
        Ok(lock(&self.enrollments)?
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }
}
