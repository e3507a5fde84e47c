// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Index Projection
//!
//! The projection is last-write-wins per document id and idempotent, so any
//! event sequence must leave the index equal to a plain map fold over the
//! same sequence, and replaying the sequence must not change it.

use std::collections::BTreeMap;

use course_enrollment::domain::{Category, Course, CourseId};
use course_enrollment::events::CourseUpdateEvent;
use course_enrollment::index::{InMemorySearchIndex, SearchDocument};
use course_enrollment::projection::{IndexProjector, ProjectionAdapter};
use proptest::prelude::*;

fn course_strategy(ids: Vec<CourseId>) -> impl Strategy<Value = Course> {
    (
        prop::sample::select(ids),
        "[A-Za-z ]{1,20}",
        prop::sample::select(Category::ALL.to_vec()),
        1u32..200,
        0u32..50,
    )
        .prop_map(|(id, title, category, duration, seats)| Course {
            id,
            title,
            description: "generated".to_string(),
            instructor: "Prop".to_string(),
            category,
            duration,
            image_url: "https://img.example.com/g.png".to_string(),
            available_seats: seats,
        })
}

fn event_strategy() -> impl Strategy<Value = Vec<CourseUpdateEvent>> {
    let ids: Vec<CourseId> = (0..4).map(|_| CourseId::new()).collect();
    let upsert = course_strategy(ids.clone()).prop_map(CourseUpdateEvent::Upsert);
    let delete = prop::sample::select(ids).prop_map(CourseUpdateEvent::delete);
    prop::collection::vec(prop_oneof![3 => upsert, 1 => delete], 0..25)
}

fn expected(events: &[CourseUpdateEvent]) -> BTreeMap<String, SearchDocument> {
    let mut model = BTreeMap::new();
    for event in events {
        match event {
            CourseUpdateEvent::Upsert(course) => {
                model.insert(course.id.to_string(), SearchDocument::from(course));
            }
            CourseUpdateEvent::Delete(deleted) => {
                model.remove(&deleted.id.to_string());
            }
        }
    }
    model
}

fn project_all(projector: &mut IndexProjector<InMemorySearchIndex>, events: &[CourseUpdateEvent]) {
    tokio_test::block_on(async {
        for event in events {
            projector.project(event.clone()).await.unwrap();
        }
    });
}

fn snapshot(index: &InMemorySearchIndex, keys: &[String]) -> BTreeMap<String, SearchDocument> {
    keys.iter()
        .filter_map(|k| index.document(k).map(|d| (k.clone(), d)))
        .collect()
}

proptest! {
    /// Property: index state equals last-write-wins fold of the events
    #[test]
    fn prop_index_matches_model(events in event_strategy()) {
        let index = InMemorySearchIndex::new();
        let mut projector = IndexProjector::new(index.clone());
        project_all(&mut projector, &events);

        let model = expected(&events);
        let keys: Vec<String> = events.iter().map(|e| e.course_id().to_string()).collect();
        prop_assert_eq!(index.len(), model.len());
        prop_assert_eq!(snapshot(&index, &keys), model);
    }

    /// Property: replaying a sequence is idempotent
    #[test]
    fn prop_replay_is_idempotent(events in event_strategy()) {
        let index = InMemorySearchIndex::new();
        let mut projector = IndexProjector::new(index.clone());
        let keys: Vec<String> = events.iter().map(|e| e.course_id().to_string()).collect();

        project_all(&mut projector, &events);
        let once = snapshot(&index, &keys);
        project_all(&mut projector, &events);
        let twice = snapshot(&index, &keys);

        prop_assert_eq!(once, twice);
    }

    /// Property: every event survives the wire encoding unchanged
    #[test]
    fn prop_wire_encoding_preserves_events(events in event_strategy()) {
        for event in events {
            let decoded = CourseUpdateEvent::from_slice(&event.to_bytes().unwrap()).unwrap();
            prop_assert_eq!(decoded, event);
        }
    }
}
