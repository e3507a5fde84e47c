// Copyright (c) 2025 - Cowboy AI, Inc.
//! Course Entity with Seat Inventory
//!
//! A course is the unit of seat inventory. Its `available_seats` counter is
//! the only piece of state that concurrent enrollments contend on; the store
//! decrements it with an atomic conditional update, never from here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Course validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CourseValidationError {
    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    #[error("Duration must be greater than 0")]
    InvalidDuration,

    #[error("Available seats must be greater than 0")]
    NoSeats,

    #[error(
        "Invalid category '{0}'. Must be one of: web-development, mobile-development, data-science, design, business"
    )]
    InvalidCategory(String),

    #[error("Invalid course id: {0}")]
    InvalidId(String),
}

/// Opaque course identity (UUID v7, time-ordered)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(Uuid);

impl CourseId {
    /// Generate a fresh identity
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CourseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CourseId {
    type Err = CourseValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| CourseValidationError::InvalidId(s.to_string()))
    }
}

/// Course category allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    WebDevelopment,
    MobileDevelopment,
    DataScience,
    Design,
    Business,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::WebDevelopment,
        Category::MobileDevelopment,
        Category::DataScience,
        Category::Design,
        Category::Business,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::WebDevelopment => "web-development",
            Category::MobileDevelopment => "mobile-development",
            Category::DataScience => "data-science",
            Category::Design => "design",
            Category::Business => "business",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CourseValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CourseValidationError::InvalidCategory(s.to_string()))
    }
}

/// Course document
///
/// # Invariants
/// - `duration > 0`
/// - `available_seats >= 0` (enforced by the unsigned type)
/// - `(title, instructor)` is unique across the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub category: Category,
    pub duration: u32,
    pub image_url: String,
    pub available_seats: u32,
}

impl Course {
    /// Check whether any seat is left
    pub fn has_seats(&self) -> bool {
        self.available_seats > 0
    }

    /// Validate fields shared by create and update
    pub fn validate(&self) -> Result<(), CourseValidationError> {
        require("title", &self.title)?;
        require("description", &self.description)?;
        require("instructor", &self.instructor)?;
        require("image_url", &self.image_url)?;
        if self.duration == 0 {
            return Err(CourseValidationError::InvalidDuration);
        }
        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), CourseValidationError> {
    if value.trim().is_empty() {
        return Err(CourseValidationError::MissingField(field));
    }
    Ok(())
}

/// Input for the course-creation workflow
///
/// Category arrives as free text and is checked against the allow-list here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub category: String,
    pub duration: u32,
    pub image_url: String,
    pub available_seats: u32,
}

impl NewCourse {
    /// Validate and turn into a course with a fresh identity
    pub fn into_course(self) -> Result<Course, CourseValidationError> {
        if self.available_seats == 0 {
            return Err(CourseValidationError::NoSeats);
        }

        let course = Course {
            id: CourseId::new(),
            category: self.category.parse()?,
            title: self.title,
            description: self.description,
            instructor: self.instructor,
            duration: self.duration,
            image_url: self.image_url,
            available_seats: self.available_seats,
        };
        course.validate()?;
        Ok(course)
    }
}

/// Partial admin edit; absent fields keep their stored value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub category: Option<String>,
    pub duration: Option<u32>,
    pub image_url: Option<String>,
    pub available_seats: Option<u32>,
}

impl CoursePatch {
    /// Apply onto an existing course. The identity is never touched.
    pub fn apply(self, mut course: Course) -> Result<Course, CourseValidationError> {
        if let Some(title) = self.title {
            course.title = title;
        }
        if let Some(description) = self.description {
            course.description = description;
        }
        if let Some(instructor) = self.instructor {
            course.instructor = instructor;
        }
        if let Some(category) = self.category {
            course.category = category.parse()?;
        }
        if let Some(duration) = self.duration {
            course.duration = duration;
        }
        if let Some(image_url) = self.image_url {
            course.image_url = image_url;
        }
        if let Some(seats) = self.available_seats {
            course.available_seats = seats;
        }

        course.validate()?;
        Ok(course)
    }
}
