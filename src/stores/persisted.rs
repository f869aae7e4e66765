// SPDX-License-Identifier: GPL-3.0-only
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;
use crate::storage::KeyValueStore;

/// A JSON document kept under one key, loaded on first use and written back
/// whole after every change.
pub struct PersistedDocument<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    state: Mutex<Option<T>>,
}

impl<T> PersistedDocument<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + Send,
{
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            state: Mutex::new(None),
        }
    }

    async fn load(&self) -> T {
        match self.store.get(self.key).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(key = self.key, error = %e, "Stored document is unreadable, starting empty");
                T::default()
            }),
            Ok(None) => T::default(),
            Err(e) => {
                warn!(key = self.key, error = %e, "Failed to load stored document, starting empty");
                T::default()
            }
        }
    }

    /// Current document
    pub async fn read(&self) -> T {
        let mut state = self.state.lock().await;
        if state.is_none() {
            *state = Some(self.load().await);
        }
        state.clone().unwrap_or_default()
    }

    /// Apply `change` and persist the result. The in-memory copy only moves
    /// forward once the write succeeded.
    pub async fn update<R: Send>(&self, change: impl FnOnce(&mut T) -> R + Send) -> anyhow::Result<R> {
        let mut state = self.state.lock().await;
        let mut next = match state.as_ref() {
            Some(current) => current.clone(),
            None => self.load().await,
        };

        let result = change(&mut next);

        let raw = serde_json::to_string(&next)?;
        self.store.set(self.key, &raw).await?;
        *state = Some(next);

        Ok(result)
    }
}
