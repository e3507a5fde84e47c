// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory search index

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{SearchDocument, SearchIndex};
use crate::projection::ProjectionError;

#[derive(Debug, Default)]
struct Shared {
    documents: Mutex<BTreeMap<String, SearchDocument>>,
    unavailable: AtomicBool,
    writes: AtomicUsize,
}

/// Cloneable handle to one in-memory index
#[derive(Debug, Clone, Default)]
pub struct InMemorySearchIndex {
    shared: Arc<Shared>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `TargetUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.shared.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn document(&self, id: &str) -> Option<SearchDocument> {
        self.documents().ok().and_then(|docs| docs.get(id).cloned())
    }

    pub fn len(&self) -> usize {
        self.documents().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Successful upserts and deletes applied so far
    pub fn writes(&self) -> usize {
        self.shared.writes.load(Ordering::SeqCst)
    }

    fn documents(&self) -> Result<MutexGuard<'_, BTreeMap<String, SearchDocument>>, ProjectionError> {
        self.shared
            .documents
            .lock()
            .map_err(|_| ProjectionError::TargetUnavailable("index lock poisoned".to_string()))
    }

    fn check_available(&self) -> Result<(), ProjectionError> {
        if self.shared.unavailable.load(Ordering::SeqCst) {
            return Err(ProjectionError::TargetUnavailable("index offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn upsert(&self, document: SearchDocument) -> Result<(), ProjectionError> {
        self.check_available()?;
        self.documents()?.insert(document.id.clone(), document);
        self.shared.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), ProjectionError> {
        self.check_available()?;
        self.documents()?.remove(id);
        self.shared.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<SearchDocument>, ProjectionError> {
        self.check_available()?;
        Ok(self.documents()?.get(id).cloned())
    }

    async fn health_check(&self) -> Result<(), ProjectionError> {
        self.check_available()
    }
}
