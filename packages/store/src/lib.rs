//! Document-store abstraction for the neighborhood backend.
//!
//! The managed document database is modelled as a set of named collections of
//! JSON documents. [`DocumentStore`] is the raw, collection-level interface and
//! [`Repository`] layers typed access on top of it for anything implementing
//! [`Record`]. [`MemoryStore`] is the in-process implementation used by tests
//! and local development.

pub mod error;
pub mod models;
pub mod repo;
pub mod subscription;

mod memory;
pub use memory::MemoryStore;

pub use error::{StoreError, StoreResult};
pub use models::{Document, Fields, Record, Stored};
pub use repo::{DocumentStore, Repository};
pub use subscription::{Snapshots, Subscription};
