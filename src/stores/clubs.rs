// SPDX-License-Identifier: GPL-3.0-only
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use crate::stores::persisted::PersistedDocument;
use crate::storage::KeyValueStore;

pub const CLUBS_KEY: &str = "club-storage";

/// Organising club shown on event pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinator_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinator_mobile: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubCache {
    pub clubs: BTreeMap<String, Club>,
    pub last_fetched: Option<DateTime<Utc>>,
}

pub struct ClubStore {
    doc: PersistedDocument<ClubCache>,
}

impl ClubStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            doc: PersistedDocument::new(store, CLUBS_KEY),
        }
    }

    /// Merge a freshly fetched club list into the cache
    pub async fn set_clubs(&self, clubs: Vec<Club>) -> anyhow::Result<ClubCache> {
        debug!(count = clubs.len(), "Caching clubs");
        self.doc
            .update(move |cache| {
                cache
                    .clubs
                    .extend(clubs.into_iter().map(|club| (club.id.clone(), club)));
                cache.last_fetched = Some(Utc::now());
                cache.clone()
            })
            .await
    }

    pub async fn get(&self, id: &str) -> Option<Club> {
        self.doc.read().await.clubs.get(id).cloned()
    }

    pub async fn snapshot(&self) -> ClubCache {
        self.doc.read().await
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        self.doc.update(|cache| *cache = ClubCache::default()).await
    }
}
