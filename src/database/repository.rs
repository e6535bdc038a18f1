use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::filter::FilterData;
use super::store::{DocumentStore, StoreError, StoredDocument};

/// A typed document living in a named collection.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;
}

/// A document together with the store version it was read at.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub doc: T,
    pub version: i64,
}

#[derive(Clone, Copy)]
enum Lookup<'a> {
    Id(Uuid),
    Filter(&'a FilterData),
}

/// Typed access to one collection of a [`DocumentStore`].
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _phantom: PhantomData<T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _phantom: PhantomData,
        }
    }
}

impl<T: Document> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    fn decode(stored: StoredDocument) -> Result<Versioned<T>, StoreError> {
        Ok(Versioned {
            doc: serde_json::from_value(stored.body)?,
            version: stored.version,
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Versioned<T>>, StoreError> {
        self.store
            .find_by_id(T::COLLECTION, id)
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn find_one(&self, filter: &FilterData) -> Result<Option<Versioned<T>>, StoreError> {
        self.store
            .find_one(T::COLLECTION, filter)
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn find_all(&self, filter: &FilterData) -> Result<Vec<T>, StoreError> {
        self.store
            .find_all(T::COLLECTION, filter)
            .await?
            .into_iter()
            .map(|stored| Self::decode(stored).map(|v| v.doc))
            .collect()
    }

    pub async fn insert(&self, doc: &T) -> Result<Versioned<T>, StoreError> {
        let body = serde_json::to_value(doc)?;
        let stored = self.store.insert(T::COLLECTION, doc.id(), body).await?;
        Self::decode(stored)
    }

    pub async fn replace(&self, doc: &T, expected_version: i64) -> Result<Versioned<T>, StoreError> {
        let body = serde_json::to_value(doc)?;
        let stored = self
            .store
            .replace(T::COLLECTION, doc.id(), expected_version, body)
            .await?;
        Self::decode(stored)
    }

    pub async fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        self.store.remove(T::COLLECTION, id).await
    }

    pub async fn remove_where(&self, filter: &FilterData) -> Result<u64, StoreError> {
        self.store.remove_where(T::COLLECTION, filter).await
    }

    /// Read-modify-write of the document with `id`, retried on version conflicts.
    ///
    /// `apply` may run several times and must be free of side effects outside
    /// the document. Returns `Ok(None)` if no such document exists.
    pub async fn update_by_id<R, E, F>(&self, id: Uuid, max_attempts: u32, apply: F) -> Result<Option<(T, R)>, E>
    where
        F: FnMut(&mut T) -> Result<R, E> + Send,
        R: Send,
        E: From<StoreError> + Send,
    {
        self.update_with(Lookup::Id(id), max_attempts, apply).await
    }

    /// Like [`Repository::update_by_id`], for the first document matching `filter`.
    pub async fn update_one<R, E, F>(&self, filter: &FilterData, max_attempts: u32, apply: F) -> Result<Option<(T, R)>, E>
    where
        F: FnMut(&mut T) -> Result<R, E> + Send,
        R: Send,
        E: From<StoreError> + Send,
    {
        self.update_with(Lookup::Filter(filter), max_attempts, apply).await
    }

    async fn update_with<R, E, F>(&self, lookup: Lookup<'_>, max_attempts: u32, mut apply: F) -> Result<Option<(T, R)>, E>
    where
        F: FnMut(&mut T) -> Result<R, E> + Send,
        R: Send,
        E: From<StoreError> + Send,
    {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let current = match lookup {
                Lookup::Id(id) => self.find_by_id(id).await?,
                Lookup::Filter(filter) => self.find_one(filter).await?,
            };
            let Some(Versioned { mut doc, version }) = current else {
                return Ok(None);
            };

            let outcome = apply(&mut doc)?;

            match self.replace(&doc, version).await {
                Ok(_) => return Ok(Some((doc, outcome))),
                // Removed after the read; same as never having found it
                Err(StoreError::NotFound(_)) => return Ok(None),
                Err(StoreError::Conflict(reason)) if attempt < max_attempts => {
                    debug!("Retrying {} {} after conflict ({}): attempt {}", T::COLLECTION, doc.id(), reason, attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde::Deserialize;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Counter {
        id: Uuid,
        owner: String,
        hits: u32,
    }

    impl Document for Counter {
        const COLLECTION: &'static str = "counters";

        fn id(&self) -> Uuid {
            self.id
        }
    }

    /// Memory store whose next `conflicts` replaces fail as if another writer won.
    ///
    /// With `vanish` set, the document is deleted just before the next replace.
    struct ContendedStore {
        inner: MemoryStore,
        conflicts: AtomicU32,
        replaces: AtomicU32,
        vanish: AtomicBool,
    }

    #[async_trait::async_trait]
    impl DocumentStore for ContendedStore {
        async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<StoredDocument>, StoreError> {
            self.inner.find_by_id(collection, id).await
        }

        async fn find_one(&self, collection: &str, filter: &FilterData) -> Result<Option<StoredDocument>, StoreError> {
            self.inner.find_one(collection, filter).await
        }

        async fn find_all(&self, collection: &str, filter: &FilterData) -> Result<Vec<StoredDocument>, StoreError> {
            self.inner.find_all(collection, filter).await
        }

        async fn insert(&self, collection: &str, id: Uuid, body: Value) -> Result<StoredDocument, StoreError> {
            self.inner.insert(collection, id, body).await
        }

        async fn replace(&self, collection: &str, id: Uuid, expected_version: i64, body: Value) -> Result<StoredDocument, StoreError> {
            self.replaces.fetch_add(1, Ordering::SeqCst);
            if self.vanish.swap(false, Ordering::SeqCst) {
                self.inner.remove(collection, id).await?;
            }
            let remaining = self.conflicts.load(Ordering::SeqCst);
            if remaining > 0 {
                self.conflicts.store(remaining - 1, Ordering::SeqCst);
                return Err(StoreError::Conflict("simulated concurrent write".to_string()));
            }
            self.inner.replace(collection, id, expected_version, body).await
        }

        async fn remove(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
            self.inner.remove(collection, id).await
        }

        async fn remove_where(&self, collection: &str, filter: &FilterData) -> Result<u64, StoreError> {
            self.inner.remove_where(collection, filter).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn contended(conflicts: u32) -> (Arc<ContendedStore>, Repository<Counter>) {
        let store = Arc::new(ContendedStore {
            inner: MemoryStore::new(),
            conflicts: AtomicU32::new(conflicts),
            replaces: AtomicU32::new(0),
            vanish: AtomicBool::new(false),
        });
        let repo = Repository::new(store.clone() as Arc<dyn DocumentStore>);
        (store, repo)
    }

    fn counter(owner: &str) -> Counter {
        Counter {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            hits: 0,
        }
    }

    #[tokio::test]
    async fn test_typed_round_trip_and_filter() {
        let (_, repo) = contended(0);
        let a = counter("a");
        repo.insert(&a).await.unwrap();
        repo.insert(&counter("b")).await.unwrap();

        let found = repo.find_one(&FilterData::eq("owner", "a")).await.unwrap().unwrap();
        assert_eq!(found.doc, a);
        assert_eq!(repo.find_all(&FilterData::all()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let (_, repo) = contended(0);
        let result: Result<Option<(Counter, ())>, StoreError> =
            repo.update_by_id(Uuid::new_v4(), 3, |_| Ok(())).await;
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_of_concurrently_removed_document_returns_none() {
        let (store, repo) = contended(0);
        let c = counter("a");
        repo.insert(&c).await.unwrap();
        store.vanish.store(true, Ordering::SeqCst);

        let result = repo
            .update_by_id::<_, StoreError, _>(c.id, 3, |doc| {
                doc.hits += 1;
                Ok(())
            })
            .await;

        assert!(result.unwrap().is_none());
        assert_eq!(store.replaces.load(Ordering::SeqCst), 1);
        assert!(repo.find_by_id(c.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_retries_after_conflict() {
        let (store, repo) = contended(2);
        let c = counter("a");
        repo.insert(&c).await.unwrap();

        let mut calls = 0;
        let (updated, ()) = repo
            .update_by_id::<_, StoreError, _>(c.id, 5, |doc| {
                calls += 1;
                doc.hits += 1;
                Ok(())
            })
            .await
            .unwrap()
            .unwrap();

        // Every attempt starts from the freshly read document
        assert_eq!(calls, 3);
        assert_eq!(updated.hits, 1);
        assert_eq!(store.replaces.load(Ordering::SeqCst), 3);

        let stored = repo.find_by_id(c.id).await.unwrap().unwrap();
        assert_eq!(stored.doc.hits, 1);
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_update_gives_up_after_max_attempts() {
        let (_, repo) = contended(10);
        let c = counter("a");
        repo.insert(&c).await.unwrap();

        let result = repo
            .update_one::<_, StoreError, _>(&FilterData::eq("owner", "a"), 3, |doc| {
                doc.hits += 1;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
        let stored = repo.find_by_id(c.id).await.unwrap().unwrap();
        assert_eq!(stored.doc.hits, 0);
    }

    #[tokio::test]
    async fn test_apply_error_aborts_without_write() {
        let (store, repo) = contended(0);
        let c = counter("a");
        repo.insert(&c).await.unwrap();

        let result = repo
            .update_by_id::<(), _, _>(c.id, 3, |_| Err(StoreError::QueryError("rejected".to_string())))
            .await;

        assert!(matches!(result, Err(StoreError::QueryError(_))));
        assert_eq!(store.replaces.load(Ordering::SeqCst), 0);
    }
}
