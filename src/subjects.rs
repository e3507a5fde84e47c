// Copyright (c) 2025 - Cowboy AI, Inc.

//! NATS subject names for course update events
//!
//! The durable queue captures a single subject; every upsert and delete is
//! published on it.

/// Subject carrying upsert/delete events
pub const COURSE_UPDATES_SUBJECT: &str = "courses.updates";
