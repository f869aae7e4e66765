// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use crate::stores::persisted::PersistedDocument;
use crate::storage::KeyValueStore;

pub const SAVED_EVENTS_KEY: &str = "saved-events-storage";

/// Events the user bookmarked, in the order they were saved
pub struct SavedEventsStore {
    doc: PersistedDocument<Vec<String>>,
}

impl SavedEventsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            doc: PersistedDocument::new(store, SAVED_EVENTS_KEY),
        }
    }

    pub async fn list(&self) -> Vec<String> {
        self.doc.read().await
    }

    pub async fn is_saved(&self, id: &str) -> bool {
        self.doc.read().await.iter().any(|saved| saved == id)
    }

    /// Save or unsave `id`; returns whether it is saved afterwards
    pub async fn toggle(&self, id: &str) -> anyhow::Result<bool> {
        self.doc
            .update(|saved| {
                if saved.iter().any(|s| s == id) {
                    saved.retain(|s| s != id);
                    false
                } else {
                    saved.push(id.to_string());
                    true
                }
            })
            .await
    }
}
