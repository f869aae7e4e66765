// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use tracing::{info, warn};
use crate::session::models::BackendProfile;
use crate::storage::KeyValueStore;

pub const BACKEND_USER_KEY: &str = "backend_user";
pub const BACKEND_SYNCED_KEY: &str = "backend_synced";

/// Single-record cache of the backend profile, persisted in the key-value store.
///
/// Only synced profiles (non-empty server id) are ever written. A record that
/// cannot be read back as a synced profile is reported as absent.
pub struct ProfileCache {
    store: Arc<dyn KeyValueStore>,
}

impl ProfileCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Cached profile, or `None` when nothing usable is stored. Never fails.
    pub async fn read(&self) -> Option<BackendProfile> {
        let raw = match self.store.get(BACKEND_USER_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read cached profile");
                return None;
            }
        };

        match serde_json::from_str::<BackendProfile>(&raw) {
            Ok(profile) if profile.is_synced() => Some(profile),
            Ok(_) => {
                warn!("Cached profile has no server id, ignoring it");
                None
            }
            Err(e) => {
                warn!(error = %e, "Cached profile is not valid JSON, ignoring it");
                None
            }
        }
    }

    /// Persist `profile`, replacing any previous record.
    pub async fn write(&self, profile: &BackendProfile) -> anyhow::Result<()> {
        if !profile.is_synced() {
            return Err(anyhow::anyhow!("Refusing to cache a profile without a server id"));
        }

        let raw = serde_json::to_string(profile)?;
        self.store
            .multi_set(&[(BACKEND_USER_KEY, raw.as_str()), (BACKEND_SYNCED_KEY, "true")])
            .await?;

        info!(user_id = profile.id.as_deref().unwrap_or_default(), "Cached backend profile");
        Ok(())
    }

    /// Drop the cached profile and the sync marker. Safe on an empty cache.
    pub async fn clear(&self) -> anyhow::Result<()> {
        self.store
            .multi_remove(&[BACKEND_USER_KEY, BACKEND_SYNCED_KEY])
            .await?;

        info!("Cleared cached profile");
        Ok(())
    }
}
