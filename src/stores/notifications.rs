// SPDX-License-Identifier: GPL-3.0-only
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use crate::stores::persisted::PersistedDocument;
use crate::storage::KeyValueStore;

pub const NOTIFICATIONS_KEY: &str = "notifications-storage";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub id: String,
    pub title: String,
    pub body: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Inbox of received push notifications, newest first
pub struct NotificationStore {
    doc: PersistedDocument<Vec<NotificationItem>>,
}

impl NotificationStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            doc: PersistedDocument::new(store, NOTIFICATIONS_KEY),
        }
    }

    pub async fn list(&self) -> Vec<NotificationItem> {
        self.doc.read().await
    }

    pub async fn add(
        &self,
        title: String,
        body: String,
        data: Option<Value>,
    ) -> anyhow::Result<NotificationItem> {
        let item = NotificationItem {
            id: Uuid::new_v4().to_string(),
            title,
            body,
            date: Utc::now(),
            read: false,
            data,
        };

        let stored = item.clone();
        self.doc.update(move |inbox| inbox.insert(0, stored)).await?;
        Ok(item)
    }

    /// Returns false when no notification has this id
    pub async fn mark_as_read(&self, id: &str) -> anyhow::Result<bool> {
        self.doc
            .update(|inbox| {
                let mut found = false;
                for item in inbox.iter_mut().filter(|item| item.id == id) {
                    item.read = true;
                    found = true;
                }
                found
            })
            .await
    }

    pub async fn mark_all_as_read(&self) -> anyhow::Result<()> {
        self.doc
            .update(|inbox| inbox.iter_mut().for_each(|item| item.read = true))
            .await
    }

    pub async fn clear_all(&self) -> anyhow::Result<()> {
        self.doc.update(|inbox| inbox.clear()).await
    }

    pub async fn unread_count(&self) -> usize {
        self.doc.read().await.iter().filter(|item| !item.read).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MemoryStore;
    use serde_json::json;

    fn inbox() -> NotificationStore {
        NotificationStore::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_add_puts_newest_first() {
        let inbox = inbox();

        inbox.add("Gates open".into(), "See you at 9".into(), None).await.unwrap();
        let latest = inbox
            .add("Schedule change".into(), "Finals moved".into(), Some(json!({ "eventId": "e1" })))
            .await
            .unwrap();

        let items = inbox.list().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], latest);
        assert!(!latest.read);
        assert_eq!(inbox.unread_count().await, 2);
    }

    #[tokio::test]
    async fn test_mark_as_read() {
        let inbox = inbox();
        let first = inbox.add("A".into(), "a".into(), None).await.unwrap();
        inbox.add("B".into(), "b".into(), None).await.unwrap();

        assert!(inbox.mark_as_read(&first.id).await.unwrap());
        assert!(!inbox.mark_as_read("missing").await.unwrap());
        assert_eq!(inbox.unread_count().await, 1);

        inbox.mark_all_as_read().await.unwrap();
        assert_eq!(inbox.unread_count().await, 0);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let inbox = inbox();
        inbox.add("A".into(), "a".into(), None).await.unwrap();

        inbox.clear_all().await.unwrap();

        assert!(inbox.list().await.is_empty());
        assert_eq!(inbox.unread_count().await, 0);
    }
}
