//! store.rs: persistence boundary for completed records.
//!
//! The extractor never assigns ids or timestamps; the store does. The in-memory
//! implementation backs the HTTP surface and the tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub type RecordId = u64;

/// A record as the store keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stored<T> {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: T,
}

#[async_trait]
pub trait RecordStore<T>: Send + Sync
where
    T: Clone + Send + Sync + 'static,
{
    async fn insert(&self, record: T) -> anyhow::Result<Stored<T>>;
    async fn get(&self, id: RecordId) -> anyhow::Result<Option<Stored<T>>>;
    /// All records, oldest first.
    async fn list(&self) -> anyhow::Result<Vec<Stored<T>>>;
    /// `None` when no record has this id.
    async fn update(&self, id: RecordId, record: T) -> anyhow::Result<Option<Stored<T>>>;
    /// `false` when no record has this id.
    async fn delete(&self, id: RecordId) -> anyhow::Result<bool>;
}

#[derive(Debug)]
pub struct InMemoryStore<T> {
    inner: Mutex<Inner<T>>,
}

#[derive(Debug)]
struct Inner<T> {
    next_id: RecordId,
    rows: BTreeMap<RecordId, Stored<T>>,
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InMemoryStore<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Inner<T>>> {
        self.inner.lock().map_err(|_| anyhow!("record store mutex poisoned"))
    }
}

#[async_trait]
impl<T> RecordStore<T> for InMemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn insert(&self, record: T) -> anyhow::Result<Stored<T>> {
        let mut g = self.lock()?;
        let now = Utc::now();
        let id = g.next_id;
        g.next_id += 1;
        let row = Stored {
            id,
            created_at: now,
            updated_at: now,
            record,
        };
        g.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn get(&self, id: RecordId) -> anyhow::Result<Option<Stored<T>>> {
        Ok(self.lock()?.rows.get(&id).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<Stored<T>>> {
        Ok(self.lock()?.rows.values().cloned().collect())
    }

    async fn update(&self, id: RecordId, record: T) -> anyhow::Result<Option<Stored<T>>> {
        let mut g = self.lock()?;
        let Some(row) = g.rows.get_mut(&id) else {
            return Ok(None);
        };
        row.record = record;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: RecordId) -> anyhow::Result<bool> {
        Ok(self.lock()?.rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_are_assigned_by_the_store() {
        let store = InMemoryStore::<String>::new();
        let a = store.insert("a".into()).await.unwrap();
        let b = store.insert("b".into()).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(a.created_at, a.updated_at);

        assert!(store.delete(a.id).await.unwrap());
        assert!(!store.delete(a.id).await.unwrap());
        // ids are never reused
        assert_eq!(store.insert("c".into()).await.unwrap().id, 3);
    }

    #[tokio::test]
    async fn update_keeps_created_at() {
        let store = InMemoryStore::<String>::new();
        let a = store.insert("a".into()).await.unwrap();
        let u = store.update(a.id, "a2".into()).await.unwrap().unwrap();
        assert_eq!(u.created_at, a.created_at);
        assert!(u.updated_at >= a.updated_at);
        assert_eq!(u.record, "a2");
        assert!(store.update(99, "x".into()).await.unwrap().is_none());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
