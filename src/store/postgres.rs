// Copyright (c) 2025 - Cowboy AI, Inc.
//! Postgres-backed stores
//!
//! The seat decrement is a single conditional `UPDATE … RETURNING`, so the
//! database serializes concurrent reservations across every process. The
//! `(course_id, user_id)` and `(title, instructor)` uniqueness rules are
//! table constraints, see `migrations/`.
//!
//! # Example
//!
//! ```rust,no_run
//! use course_enrollment::store::postgres::{connect_pool, PostgresCourseStore};
//! use course_enrollment::config::DatabaseConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::default();
//!     let pool = connect_pool(&config).await?;
//!     let courses = PostgresCourseStore::new(pool, config.statement_timeout);
//!     courses.migrate().await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::{within, CourseStore, EnrollmentStore, StoreError, StoreResult};
use crate::config::DatabaseConfig;
use crate::domain::{Course, CourseId, Enrollment, EnrollmentId, UserId};

const COURSE_TITLE_INSTRUCTOR_KEY: &str = "courses_title_instructor_key";
const ENROLLMENT_COURSE_USER_KEY: &str = "enrollments_course_user_key";

const COURSE_COLUMNS: &str =
    "id, title, description, instructor, category, duration, image_url, available_seats";

/// Open a connection pool with bounded acquire time
pub async fn connect_pool(config: &DatabaseConfig) -> StoreResult<PgPool> {
    info!(max_connections = config.max_connections, "Connecting to Postgres");

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.statement_timeout)
        .connect(&config.url)
        .await
        .map_err(|e| StoreError::Unavailable(format!("Failed to connect to Postgres: {e}")))
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut => StoreError::Unavailable("connection pool timed out".into()),
        sqlx::Error::Database(db_err) => {
            StoreError::Unavailable(format!("database error: {db_err}"))
        }
        other => StoreError::Unavailable(other.to_string()),
    }
}

/// Whether `err` is a violation of the named unique constraint
fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation() && db.constraint() == Some(constraint),
        _ => false,
    }
}

fn int_to_sql(field: &str, value: u32) -> StoreResult<i32> {
    i32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{field} {value} out of range")))
}

fn seats_from_sql(seats: i32) -> StoreResult<u32> {
    u32::try_from(seats).map_err(|_| StoreError::Corrupt(format!("negative seat count {seats}")))
}

#[derive(Debug, sqlx::FromRow)]
struct CourseRow {
    id: Uuid,
    title: String,
    description: String,
    instructor: String,
    category: String,
    duration: i32,
    image_url: String,
    available_seats: i32,
}

impl TryFrom<CourseRow> for Course {
    type Error = StoreError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        Ok(Course {
            id: CourseId::from_uuid(row.id),
            category: row
                .category
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("course {}: {e}", row.id)))?,
            duration: u32::try_from(row.duration)
                .map_err(|_| StoreError::Corrupt(format!("course {}: bad duration", row.id)))?,
            available_seats: seats_from_sql(row.available_seats)?,
            title: row.title,
            description: row.description,
            instructor: row.instructor,
            image_url: row.image_url,
        })
    }
}

fn uuids(ids: &[CourseId]) -> Vec<Uuid> {
    ids.iter().map(|id| *id.as_uuid()).collect()
}

/// Postgres course store
#[derive(Clone)]
pub struct PostgresCourseStore {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresCourseStore {
    pub const fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Run the embedded migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Migration failed: {e}")))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CourseStore for PostgresCourseStore {
    async fn create(&self, course: &Course) -> StoreResult<()> {
        within("course.create", self.timeout, async {
            sqlx::query(
                "INSERT INTO courses
                    (id, title, description, instructor, category, duration, image_url, available_seats)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(course.id.as_uuid())
            .bind(&course.title)
            .bind(&course.description)
            .bind(&course.instructor)
            .bind(course.category.as_str())
            .bind(int_to_sql("duration", course.duration)?)
            .bind(&course.image_url)
            .bind(int_to_sql("available_seats", course.available_seats)?)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if violates(&e, COURSE_TITLE_INSTRUCTOR_KEY) {
                    return StoreError::DuplicateCourse;
                }
                map_sqlx(e)
            })?;

            debug!(course_id = %course.id, "Course inserted");
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: &CourseId) -> StoreResult<Option<Course>> {
        within("course.find_by_id", self.timeout, async {
            let row: Option<CourseRow> =
                sqlx::query_as(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
                    .bind(id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx)?;

            row.map(Course::try_from).transpose()
        })
        .await
    }

    async fn find_by_ids(&self, ids: &[CourseId]) -> StoreResult<Vec<Course>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        within("course.find_by_ids", self.timeout, async {
            let rows: Vec<CourseRow> = sqlx::query_as(&format!(
                "SELECT {COURSE_COLUMNS} FROM courses WHERE id = ANY($1) ORDER BY id"
            ))
            .bind(uuids(ids))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

            rows.into_iter().map(Course::try_from).collect()
        })
        .await
    }

    async fn find_all(&self) -> StoreResult<Vec<Course>> {
        within("course.find_all", self.timeout, async {
            let rows: Vec<CourseRow> =
                sqlx::query_as(&format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY id"))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx)?;

            rows.into_iter().map(Course::try_from).collect()
        })
        .await
    }

    async fn update(&self, course: &Course, seat_override: Option<u32>) -> StoreResult<Course> {
        within("course.update", self.timeout, async {
            let seats = seat_override
                .map(|seats| int_to_sql("available_seats", seats))
                .transpose()?;

            let row: Option<CourseRow> = sqlx::query_as(&format!(
                "UPDATE courses
                 SET title = $2, description = $3, instructor = $4, category = $5,
                     duration = $6, image_url = $7,
                     available_seats = COALESCE($8, available_seats)
                 WHERE id = $1
                 RETURNING {COURSE_COLUMNS}"
            ))
            .bind(course.id.as_uuid())
            .bind(&course.title)
            .bind(&course.description)
            .bind(&course.instructor)
            .bind(course.category.as_str())
            .bind(int_to_sql("duration", course.duration)?)
            .bind(&course.image_url)
            .bind(seats)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if violates(&e, COURSE_TITLE_INSTRUCTOR_KEY) {
                    return StoreError::DuplicateCourse;
                }
                map_sqlx(e)
            })?;

            row.map(Course::try_from)
                .transpose()?
                .ok_or(StoreError::CourseNotFound(course.id))
        })
        .await
    }

    async fn delete(&self, id: &CourseId) -> StoreResult<()> {
        within("course.delete", self.timeout, async {
            let result = sqlx::query("DELETE FROM courses WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;

            if result.rows_affected() == 0 {
                return Err(StoreError::CourseNotFound(*id));
            }
            Ok(())
        })
        .await
    }

    async fn decrement_seat_if_positive(&self, id: &CourseId) -> StoreResult<Option<u32>> {
        within("course.decrement_seat", self.timeout, async {
            let row: Option<(i32,)> = sqlx::query_as(
                "UPDATE courses
                 SET available_seats = available_seats - 1
                 WHERE id = $1 AND available_seats > 0
                 RETURNING available_seats",
            )
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

            row.map(|(seats,)| seats_from_sql(seats)).transpose()
        })
        .await
    }

    async fn release_seat(&self, id: &CourseId) -> StoreResult<Option<u32>> {
        within("course.release_seat", self.timeout, async {
            let row: Option<(i32,)> = sqlx::query_as(
                "UPDATE courses
                 SET available_seats = available_seats + 1
                 WHERE id = $1
                 RETURNING available_seats",
            )
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

            row.map(|(seats,)| seats_from_sql(seats)).transpose()
        })
        .await
    }

    async fn availability(&self, ids: &[CourseId]) -> StoreResult<BTreeMap<CourseId, u32>> {
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }

        within("course.availability", self.timeout, async {
            let rows: Vec<(Uuid, i32)> = sqlx::query_as(
                "SELECT id, available_seats FROM courses
                 WHERE id = ANY($1) AND available_seats > 0",
            )
            .bind(uuids(ids))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

            rows.into_iter()
                .map(|(id, seats)| Ok((CourseId::from_uuid(id), seats_from_sql(seats)?)))
                .collect()
        })
        .await
    }
}

/// Postgres enrollment store
#[derive(Clone)]
pub struct PostgresEnrollmentStore {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresEnrollmentStore {
    pub const fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl EnrollmentStore for PostgresEnrollmentStore {
    async fn create(&self, enrollment: &Enrollment) -> StoreResult<()> {
        within("enrollment.create", self.timeout, async {
            sqlx::query(
                "INSERT INTO enrollments (id, course_id, user_id, enrolled_at)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(enrollment.id.as_uuid())
            .bind(enrollment.course_id.as_uuid())
            .bind(enrollment.user_id.0)
            .bind(enrollment.enrolled_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if violates(&e, ENROLLMENT_COURSE_USER_KEY) {
                    return StoreError::DuplicateEnrollment {
                        course_id: enrollment.course_id,
                        user_id: enrollment.user_id,
                    };
                }
                if let sqlx::Error::Database(db) = &e {
                    if db.is_foreign_key_violation() {
                        return StoreError::CourseNotFound(enrollment.course_id);
                    }
                }
                map_sqlx(e)
            })?;

            Ok(())
        })
        .await
    }

    async fn exists_for(&self, course_id: &CourseId, user_id: UserId) -> StoreResult<bool> {
        within("enrollment.exists_for", self.timeout, async {
            let (exists,): (bool,) = sqlx::query_as(
                "SELECT EXISTS(SELECT 1 FROM enrollments WHERE course_id = $1 AND user_id = $2)",
            )
            .bind(course_id.as_uuid())
            .bind(user_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;

            Ok(exists)
        })
        .await
    }

    async fn find_by_user(&self, user_id: UserId) -> StoreResult<Vec<Enrollment>> {
        within("enrollment.find_by_user", self.timeout, async {
            let rows: Vec<(Uuid, Uuid, i64, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
                "SELECT id, course_id, user_id, enrolled_at FROM enrollments
                 WHERE user_id = $1 ORDER BY enrolled_at",
            )
            .bind(user_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

            Ok(rows
                .into_iter()
                .map(|(id, course_id, user_id, enrolled_at)| Enrollment {
                    id: EnrollmentId::from_uuid(id),
                    course_id: CourseId::from_uuid(course_id),
                    user_id: UserId(user_id),
                    enrolled_at,
                })
                .collect())
        })
        .await
    }
}
