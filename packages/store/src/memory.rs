use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::watch;

use crate::error::{StoreError, StoreResult};
use crate::models::{Document, Fields};
use crate::repo::DocumentStore;
use crate::subscription::Subscription;

/// In-memory DocumentStore for testing and local development.
///
/// Documents are kept ordered by id, matching the managed database's default
/// ordering. Every write publishes a full snapshot of the touched collection.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<String, Collection>>>,
}

#[derive(Debug)]
struct Collection {
    docs: BTreeMap<String, Fields>,
    tx: watch::Sender<Arc<Vec<Document>>>,
}

impl Collection {
    fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            docs: BTreeMap::new(),
            tx,
        }
    }

    fn snapshot(&self) -> Vec<Document> {
        self.docs
            .iter()
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect()
    }

    fn publish(&self) {
        self.tx.send_replace(Arc::new(self.snapshot()));
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Collection>> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of documents currently held in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.lock()
            .get(collection)
            .map(|c| c.docs.len())
            .unwrap_or(0)
    }

    /// Run `f` against the named collection, creating it when absent.
    fn with_collection<R>(&self, name: &str, f: impl FnOnce(&mut Collection) -> R) -> R {
        let mut guard = self.lock();
        let collection = guard
            .entry(name.to_string())
            .or_insert_with(Collection::new);
        f(collection)
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        Ok(self.lock().get(collection).and_then(|c| {
            c.docs.get(id).map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            })
        }))
    }

    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.with_collection(collection, |c| {
            c.docs.insert(id.clone(), fields);
            c.publish();
        });
        tracing::debug!(collection, %id, "document added");
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        self.with_collection(collection, |c| {
            c.docs.insert(id.to_string(), fields);
            c.publish();
        });
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, patch: Fields) -> StoreResult<()> {
        self.with_collection(collection, |c| {
            let Some(existing) = c.docs.get_mut(id) else {
                return Err(StoreError::not_found(collection, id));
            };
            existing.extend(patch);
            c.publish();
            Ok(())
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.with_collection(collection, |c| {
            if c.docs.remove(id).is_some() {
                c.publish();
            }
        });
        Ok(())
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>> {
        Ok(self
            .lock()
            .get(collection)
            .map(|c| {
                c.docs
                    .iter()
                    .filter(|(_, fields)| fields.get(field) == Some(value))
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        Ok(self
            .lock()
            .get(collection)
            .map(Collection::snapshot)
            .unwrap_or_default())
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        let rx = self.with_collection(collection, |c| c.tx.subscribe());
        Subscription::new(collection, rx)
    }
}
