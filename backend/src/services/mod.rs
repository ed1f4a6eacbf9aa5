//! Profile and notes services.
//!
//! Both are stateless wrappers around the shared `DocumentStore`; every call
//! is a single request/response against the store.

pub mod notes;
pub mod profile;

pub use notes::NoteService;
pub use profile::ProfileService;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::store::Document;

fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value).map_err(|e| Error::Internal(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Internal(format!("expected an object, got {}", other))),
    }
}

fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    serde_json::from_value(Value::Object(doc))
        .map_err(|e| Error::Internal(format!("malformed document: {}", e)))
}
