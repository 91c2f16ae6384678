//! # Repository — typed access to an abstract document store
//!
//! All reads and writes go through the [`DocumentStore`] trait, so the same
//! service code runs against the in-memory store (tests, local development) or
//! an adapter for the managed database.
//!
//! ## [`DocumentStore`] trait
//!
//! Collection-level operations on raw [`Document`]s:
//!
//! | Method | Semantics |
//! |--------|-----------|
//! | `get` | Fetch one document, `None` when absent. |
//! | `add` | Insert under a fresh backend-assigned id and return it. |
//! | `set` | Create or overwrite the document at a known id. |
//! | `update` | Merge top-level fields into an existing document; fails with [`StoreError::NotFound`] when absent. |
//! | `delete` | Remove a document. Deleting a missing document succeeds. |
//! | `query_eq` | All documents whose field equals the given value. |
//! | `list` | Every document in the collection. |
//! | `subscribe` | Open a live [`Subscription`] delivering full snapshots. |
//!
//! ## [`Repository`]
//!
//! Wraps a store and exposes the same operations for any [`Record`], handling
//! the JSON conversion and the collection name.

use std::future::Future;

use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::models::{decode_all, Document, Fields, Record, Stored};
use crate::subscription::{Snapshots, Subscription};

/// Async interface to the managed document database.
pub trait DocumentStore: Send + Sync {
    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = StoreResult<Option<Document>>> + Send;
    fn add(
        &self,
        collection: &str,
        fields: Fields,
    ) -> impl Future<Output = StoreResult<String>> + Send;
    fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> impl Future<Output = StoreResult<()>> + Send;
    fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Fields,
    ) -> impl Future<Output = StoreResult<()>> + Send;
    fn delete(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = StoreResult<()>> + Send;
    fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> impl Future<Output = StoreResult<Vec<Document>>> + Send;
    fn list(&self, collection: &str) -> impl Future<Output = StoreResult<Vec<Document>>> + Send;
    fn subscribe(&self, collection: &str) -> Subscription;
}

/// Typed view over a [`DocumentStore`].
#[derive(Clone, Debug)]
pub struct Repository<S> {
    store: S,
}

impl<S: DocumentStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn get<T: Record>(&self, id: &str) -> StoreResult<Option<Stored<T>>> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => Ok(None),
        }
    }

    /// Like [`get`](Self::get) but a missing document is an error.
    pub async fn fetch<T: Record>(&self, id: &str) -> StoreResult<Stored<T>> {
        self.get(id)
            .await?
            .ok_or_else(|| StoreError::not_found(T::COLLECTION, id))
    }

    pub async fn add<T: Record>(&self, record: &T) -> StoreResult<String> {
        self.store.add(T::COLLECTION, record.to_fields()?).await
    }

    pub async fn set<T: Record>(&self, id: &str, record: &T) -> StoreResult<()> {
        self.store.set(T::COLLECTION, id, record.to_fields()?).await
    }

    /// Merge `patch` into the stored record.
    pub async fn update<T: Record>(&self, id: &str, patch: Fields) -> StoreResult<()> {
        self.store.update(T::COLLECTION, id, patch).await
    }

    pub async fn delete<T: Record>(&self, id: &str) -> StoreResult<()> {
        self.store.delete(T::COLLECTION, id).await
    }

    /// Records whose `field` equals `value`. Malformed documents are skipped.
    pub async fn find_by<T: Record>(
        &self,
        field: &str,
        value: impl Into<Value>,
    ) -> StoreResult<Vec<Stored<T>>> {
        let docs = self
            .store
            .query_eq(T::COLLECTION, field, &value.into())
            .await?;
        Ok(decode_all(&docs))
    }

    /// Every record in the collection. Malformed documents are skipped.
    pub async fn list<T: Record>(&self) -> StoreResult<Vec<Stored<T>>> {
        let docs = self.store.list(T::COLLECTION).await?;
        Ok(decode_all(&docs))
    }

    pub fn subscribe<T: Record>(&self) -> Snapshots<T> {
        Snapshots::new(self.store.subscribe(T::COLLECTION))
    }
}

fn decode<T: Record>(doc: Document) -> StoreResult<Stored<T>> {
    let data = doc.decode()?;
    Ok(Stored { id: doc.id, data })
}
