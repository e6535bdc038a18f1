use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::filter::FilterData;
use super::store::{DocumentStore, StoreError, StoredDocument};

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    version: i64,
    body: Value,
}

#[derive(Debug, Default)]
struct Collections {
    next_seq: u64,
    data: HashMap<String, HashMap<Uuid, Entry>>,
}

/// In-process document store used for tests and for running without Postgres.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
    unique: Vec<(String, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject inserts and replaces that would duplicate `field` within `collection`.
    pub fn with_unique_field(mut self, collection: &str, field: &str) -> Self {
        self.unique.push((collection.to_string(), field.to_string()));
        self
    }

    fn check_unique(&self, docs: Option<&HashMap<Uuid, Entry>>, collection: &str, id: Uuid, body: &Value) -> Result<(), StoreError> {
        let Some(docs) = docs else {
            return Ok(());
        };
        for (_, field) in self.unique.iter().filter(|(c, _)| c == collection) {
            let Some(value) = body.get(field) else {
                continue;
            };
            let taken = docs
                .iter()
                .any(|(other_id, entry)| *other_id != id && entry.body.get(field) == Some(value));
            if taken {
                return Err(StoreError::Conflict(format!("duplicate {}.{}", collection, field)));
            }
        }
        Ok(())
    }

    fn to_stored(id: Uuid, entry: &Entry) -> StoredDocument {
        StoredDocument {
            id,
            version: entry.version,
            body: entry.body.clone(),
        }
    }

    fn sorted_matches(docs: &HashMap<Uuid, Entry>, filter: &FilterData) -> Vec<StoredDocument> {
        let mut matches: Vec<(&Uuid, &Entry)> = docs.iter().filter(|(_, entry)| filter.matches(&entry.body)).collect();
        matches.sort_by_key(|(_, entry)| entry.seq);
        matches.into_iter().map(|(id, entry)| Self::to_stored(*id, entry)).collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<StoredDocument>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .data
            .get(collection)
            .and_then(|docs| docs.get(&id))
            .map(|entry| Self::to_stored(id, entry)))
    }

    async fn find_one(&self, collection: &str, filter: &FilterData) -> Result<Option<StoredDocument>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .data
            .get(collection)
            .and_then(|docs| Self::sorted_matches(docs, filter).into_iter().next()))
    }

    async fn find_all(&self, collection: &str, filter: &FilterData) -> Result<Vec<StoredDocument>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .data
            .get(collection)
            .map(|docs| Self::sorted_matches(docs, filter))
            .unwrap_or_default())
    }

    async fn insert(&self, collection: &str, id: Uuid, body: Value) -> Result<StoredDocument, StoreError> {
        let mut inner = self.inner.write().await;
        self.check_unique(inner.data.get(collection), collection, id, &body)?;

        let seq = inner.next_seq;
        let docs = inner.data.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(StoreError::Conflict(format!("{} {} already exists", collection, id)));
        }

        let entry = Entry { seq, version: 1, body };
        let stored = Self::to_stored(id, &entry);
        docs.insert(id, entry);
        inner.next_seq += 1;
        Ok(stored)
    }

    async fn replace(
        &self,
        collection: &str,
        id: Uuid,
        expected_version: i64,
        body: Value,
    ) -> Result<StoredDocument, StoreError> {
        let mut inner = self.inner.write().await;
        self.check_unique(inner.data.get(collection), collection, id, &body)?;

        let entry = inner
            .data
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(&id))
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", collection, id)))?;

        if entry.version != expected_version {
            return Err(StoreError::Conflict(format!(
                "{} {} is at version {}, expected {}",
                collection, id, entry.version, expected_version
            )));
        }

        entry.version += 1;
        entry.body = body;
        Ok(Self::to_stored(id, entry))
    }

    async fn remove(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .data
            .get_mut(collection)
            .map(|docs| docs.remove(&id).is_some())
            .unwrap_or(false))
    }

    async fn remove_where(&self, collection: &str, filter: &FilterData) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(docs) = inner.data.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|_, entry| !filter.matches(&entry.body));
        Ok((before - docs.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        let stored = store.insert("things", id, json!({ "id": id, "n": 1 })).await.unwrap();
        assert_eq!(stored.version, 1);

        let found = store.find_by_id("things", id).await.unwrap().unwrap();
        assert_eq!(found.body["n"], 1);
        assert!(store.find_by_id("other", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_all_keeps_insertion_order() {
        let store = MemoryStore::new();
        for n in 0..5 {
            store.insert("things", Uuid::new_v4(), json!({ "n": n })).await.unwrap();
        }
        let all = store.find_all("things", &FilterData::all()).await.unwrap();
        let ns: Vec<i64> = all.iter().map(|d| d.body["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_replace_detects_stale_version() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.insert("things", id, json!({ "n": 0 })).await.unwrap();

        let updated = store.replace("things", id, 1, json!({ "n": 1 })).await.unwrap();
        assert_eq!(updated.version, 2);

        let stale = store.replace("things", id, 1, json!({ "n": 2 })).await;
        assert!(matches!(stale, Err(StoreError::Conflict(_))));

        let current = store.find_by_id("things", id).await.unwrap().unwrap();
        assert_eq!(current.body["n"], 1);
    }

    #[tokio::test]
    async fn test_replace_missing_is_not_found() {
        let store = MemoryStore::new();
        let result = store.replace("things", Uuid::new_v4(), 1, json!({})).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unique_field() {
        let store = MemoryStore::new().with_unique_field("users", "email");
        store.insert("users", Uuid::new_v4(), json!({ "email": "a@b.io" })).await.unwrap();
        let dup = store.insert("users", Uuid::new_v4(), json!({ "email": "a@b.io" })).await;
        assert!(matches!(dup, Err(StoreError::Conflict(_))));
        assert_eq!(store.find_all("users", &FilterData::all()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_and_remove_where() {
        let store = MemoryStore::new();
        let keep = Uuid::new_v4();
        let drop = Uuid::new_v4();
        store.insert("things", keep, json!({ "owner": "a" })).await.unwrap();
        store.insert("things", drop, json!({ "owner": "b" })).await.unwrap();

        assert_eq!(store.remove_where("things", &FilterData::eq("owner", "b")).await.unwrap(), 1);
        assert!(store.remove("things", keep).await.unwrap());
        assert!(!store.remove("things", keep).await.unwrap());
    }
}
