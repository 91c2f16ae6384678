//! # Live collection subscriptions
//!
//! A [`Subscription`] is the handle a consumer holds while observing one
//! collection. The first call to [`Subscription::next`] yields the current
//! contents immediately; every later call waits for the next change and yields
//! the complete new contents. There is no incremental patching: each snapshot
//! replaces the previous one.
//!
//! Dropping the handle (or calling [`Subscription::unsubscribe`]) releases it.
//! [`Snapshots`] is the typed counterpart returned by
//! [`Repository::subscribe`](crate::Repository::subscribe).

use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::watch;

use crate::models::{decode_all, Document, Record, Stored};

/// Untyped live view over a collection.
#[derive(Debug)]
pub struct Subscription {
    collection: String,
    rx: watch::Receiver<Arc<Vec<Document>>>,
    primed: bool,
}

impl Subscription {
    pub fn new(collection: impl Into<String>, rx: watch::Receiver<Arc<Vec<Document>>>) -> Self {
        Self {
            collection: collection.into(),
            rx,
            primed: false,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Wait for the next snapshot. Returns `None` once the backend has gone away.
    pub async fn next(&mut self) -> Option<Arc<Vec<Document>>> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Release the subscription.
    pub fn unsubscribe(self) {
        tracing::debug!(collection = %self.collection, "subscription released");
    }
}

/// Typed live view over the collection of `T`.
#[derive(Debug)]
pub struct Snapshots<T> {
    inner: Subscription,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> Snapshots<T> {
    pub fn new(inner: Subscription) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Wait for the next snapshot and decode it.
    ///
    /// Documents that fail to decode are skipped and logged.
    pub async fn next(&mut self) -> Option<Vec<Stored<T>>> {
        let docs = self.inner.next().await?;
        Some(decode_all(docs.iter()))
    }

    pub fn unsubscribe(self) {
        self.inner.unsubscribe();
    }
}
