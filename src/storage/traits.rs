// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;

/// Durable string key-value storage shared by the session cache and the
/// persisted stores.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    
    /// Store `value` under `key`, overwriting any previous value
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    
    /// Remove `key`. Removing a missing key is not an error
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
    
    /// Store several pairs at once; either all of them land or none do
    async fn multi_set(&self, pairs: &[(&str, &str)]) -> anyhow::Result<()>;
    
    /// Remove several keys at once
    async fn multi_remove(&self, keys: &[&str]) -> anyhow::Result<()>;
}
