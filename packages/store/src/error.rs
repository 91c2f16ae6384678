//! Errors raised by document-store operations.

use thiserror::Error;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The addressed document does not exist.
    #[error("No document {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// A record could not be converted to or from its JSON form.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Records must serialize to a JSON object.
    #[error("Record in {0} is not a JSON object")]
    NotAnObject(String),

    /// The backend rejected or failed the call.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}
