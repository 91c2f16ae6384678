//! # Document types shared by every store backend
//!
//! | Type | Represents |
//! |------|-----------|
//! | [`Document`] | A raw document as the backend hands it out: its id and its top-level JSON fields. |
//! | [`Fields`] | The top-level field map of a document (also used as an update patch). |
//! | [`Record`] | A typed document bound to a collection name. |
//! | [`Stored`] | A decoded record together with the id the backend assigned to it. |

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// Top-level fields of a document.
pub type Fields = Map<String, Value>;

/// A raw document in a collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// Decode the fields into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }
}

/// A typed document living in a fixed collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name of the collection holding records of this type.
    const COLLECTION: &'static str;

    /// Encode the record as a document field map.
    fn to_fields(&self) -> StoreResult<Fields> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject(Self::COLLECTION.to_string())),
        }
    }
}

/// A decoded record and its document id.
#[derive(Clone, Debug, PartialEq)]
pub struct Stored<T> {
    pub id: String,
    pub data: T,
}

impl<T> std::ops::Deref for Stored<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

/// Decode every document that fits `T`. Documents that fail to decode are
/// skipped and logged, so one bad record never hides the rest.
pub(crate) fn decode_all<'a, T: Record>(
    docs: impl IntoIterator<Item = &'a Document>,
) -> Vec<Stored<T>> {
    docs.into_iter()
        .filter_map(|doc| match doc.decode::<T>() {
            Ok(data) => Some(Stored {
                id: doc.id.clone(),
                data,
            }),
            Err(e) => {
                tracing::warn!(
                    collection = T::COLLECTION,
                    id = %doc.id,
                    "skipping malformed document: {}",
                    e
                );
                None
            }
        })
        .collect()
}
