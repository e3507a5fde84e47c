// Copyright (c) 2025 - Cowboy AI, Inc.
//! Course update events
//!
//! Wire format on the bus, one JSON object per message:
//!
//! ```json
//! {"action":"upsert","course":{"id":"…","title":"…","description":"…","instructor":"…",
//!  "category":"design","duration":12,"available_seats":3,"image_url":"…"}}
//! {"action":"delete","course":{"id":"…"}}
//! ```
//!
//! Decoding is strict: a missing or wrongly typed course field, an unknown
//! action or an unknown category is a [`InfrastructureError::Deserialization`]
//! error and the message is skipped by the consumer.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::domain::{Course, CourseId};
use crate::errors::{InfrastructureError, InfrastructureResult};

/// Identity-only payload of a delete event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedCourse {
    pub id: CourseId,
}

/// Mutation of a course, mirrored into the search index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "course", rename_all = "snake_case")]
pub enum CourseUpdateEvent {
    /// Full course state after a create, edit or seat change
    Upsert(Course),
    /// Course removed from the system of record
    Delete(DeletedCourse),
}

impl CourseUpdateEvent {
    pub fn upsert(course: &Course) -> Self {
        Self::Upsert(course.clone())
    }

    pub fn delete(id: CourseId) -> Self {
        Self::Delete(DeletedCourse { id })
    }

    /// Id of the course this event is about
    pub fn course_id(&self) -> CourseId {
        match self {
            Self::Upsert(course) => course.id,
            Self::Delete(deleted) => deleted.id,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Self::Upsert(_) => "upsert",
            Self::Delete(_) => "delete",
        }
    }

    pub fn to_bytes(&self) -> InfrastructureResult<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    pub fn from_slice(payload: &[u8]) -> InfrastructureResult<Self> {
        serde_json::from_slice(payload)
            .map_err(|e| InfrastructureError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    fn course() -> Course {
        Course {
            id: CourseId::new(),
            title: "UX Foundations".to_string(),
            description: "Research and prototyping".to_string(),
            instructor: "Grace".to_string(),
            category: Category::Design,
            duration: 12,
            image_url: "https://img.example.com/ux.png".to_string(),
            available_seats: 3,
        }
    }

    #[test]
    fn test_upsert_wire_shape() {
        let course = course();
        let value = serde_json::to_value(CourseUpdateEvent::upsert(&course)).unwrap();

        assert_eq!(
            value,
            json!({
                "action": "upsert",
                "course": {
                    "id": course.id.to_string(),
                    "title": "UX Foundations",
                    "description": "Research and prototyping",
                    "instructor": "Grace",
                    "category": "design",
                    "duration": 12,
                    "image_url": "https://img.example.com/ux.png",
                    "available_seats": 3
                }
            })
        );
    }

    #[test]
    fn test_delete_wire_shape() {
        let id = CourseId::new();
        let value = serde_json::to_value(CourseUpdateEvent::delete(id)).unwrap();
        assert_eq!(value, json!({"action": "delete", "course": {"id": id.to_string()}}));
    }

    #[test]
    fn test_decodes_what_it_encodes() {
        let event = CourseUpdateEvent::upsert(&course());
        let decoded = CourseUpdateEvent::from_slice(&event.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, event);
        assert_eq!(decoded.action(), "upsert");
    }

    #[test_case(r#"{"action":"upsert","course":{"id":"0191e0a4-6f1e-7c3a-9d55-0a1b2c3d4e5f","title":"t","description":"d","instructor":"i","category":"design","image_url":"u","available_seats":1}}"# ; "missing duration")]
    #[test_case(r#"{"action":"upsert","course":{"id":"0191e0a4-6f1e-7c3a-9d55-0a1b2c3d4e5f","title":"t","description":"d","instructor":"i","category":"design","duration":"long","image_url":"u","available_seats":1}}"# ; "duration wrong type")]
    #[test_case(r#"{"action":"upsert","course":{"id":"0191e0a4-6f1e-7c3a-9d55-0a1b2c3d4e5f","title":"t","description":"d","instructor":"i","category":"design","duration":1,"image_url":"u","available_seats":-1}}"# ; "negative seats")]
    #[test_case(r#"{"action":"upsert","course":{"id":"0191e0a4-6f1e-7c3a-9d55-0a1b2c3d4e5f","title":"t","description":"d","instructor":"i","category":"cooking","duration":1,"image_url":"u","available_seats":1}}"# ; "unknown category")]
    #[test_case(r#"{"action":"rename","course":{"id":"0191e0a4-6f1e-7c3a-9d55-0a1b2c3d4e5f"}}"# ; "unknown action")]
    #[test_case(r#"{"action":"delete","course":{}}"# ; "delete without id")]
    #[test_case(r#"{"action":"delete","course":{"id":"42"}}"# ; "id not a uuid")]
    #[test_case("not json" ; "garbage")]
    fn test_rejects_malformed(payload: &str) {
        assert!(matches!(
            CourseUpdateEvent::from_slice(payload.as_bytes()),
            Err(InfrastructureError::Deserialization(_))
        ));
    }
}
