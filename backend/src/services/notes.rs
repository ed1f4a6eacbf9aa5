use std::sync::Arc;

use eduportal_common::{NewNote, Note};
use serde_json::Value;

use super::{from_document, to_document};
use crate::error::{Error, Result};
use crate::store::DocumentStore;

pub const NOTES: &str = "notes";

/// Owns per-user notes. Notes are immutable once created.
pub struct NoteService {
    store: Arc<dyn DocumentStore>,
}

impl NoteService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Persist a note and return it with its store-assigned id.
    ///
    /// The owner is not checked against the profiles collection.
    pub async fn create(&self, note: NewNote) -> Result<Note> {
        if note.firebase_uid.trim().is_empty() {
            return Err(Error::Validation("firebaseUid is required.".to_string()));
        }

        let id = self.store.add(NOTES, &to_document(&note)?).await?;
        tracing::info!("Saved note {} for {}", id, note.firebase_uid);

        Ok(Note::from_new(id, note))
    }

    /// Every note owned by `owner`, in store order. No pagination.
    pub async fn list_by_owner(&self, owner: &str) -> Result<Vec<Note>> {
        let documents = self
            .store
            .find_by_field(NOTES, "firebaseUid", &Value::String(owner.to_string()))
            .await?;

        documents
            .into_iter()
            .map(|doc| {
                let mut fields = doc.fields;
                fields.insert("id".to_string(), Value::String(doc.id));
                from_document(fields)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn service() -> NoteService {
        NoteService::new(Arc::new(SqliteStore::in_memory().unwrap()))
    }

    fn new_note(owner: &str, subject: &str) -> NewNote {
        NewNote {
            firebase_uid: owner.to_string(),
            subject: subject.to_string(),
            chapter: "Algebra".to_string(),
            content: "x^2 + y^2".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_then_list_round_trip() {
        let service = service();
        let created = service.create(new_note("u1", "Math")).await.unwrap();
        assert!(!created.id.is_empty());

        let notes = service.list_by_owner("u1").await.unwrap();
        assert_eq!(notes, vec![created]);
        assert_eq!(notes[0].subject, "Math");
        assert_eq!(notes[0].chapter, "Algebra");
        assert_eq!(notes[0].content, "x^2 + y^2");
    }

    #[tokio::test]
    async fn test_list_without_notes_is_empty() {
        let service = service();
        assert!(service.list_by_owner("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_only_returns_owner_notes() {
        let service = service();
        service.create(new_note("u1", "Math")).await.unwrap();
        service.create(new_note("u2", "History")).await.unwrap();
        service.create(new_note("u1", "Physics")).await.unwrap();

        let notes = service.list_by_owner("u1").await.unwrap();
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|n| n.firebase_uid == "u1"));
    }

    #[tokio::test]
    async fn test_duplicate_notes_are_kept() {
        let service = service();
        let first = service.create(new_note("u1", "Math")).await.unwrap();
        let second = service.create(new_note("u1", "Math")).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(service.list_by_owner("u1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_text_fields_are_allowed() {
        let service = service();
        let note = NewNote {
            firebase_uid: "u1".to_string(),
            subject: String::new(),
            chapter: String::new(),
            content: String::new(),
        };
        assert!(service.create(note).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_owner_is_rejected() {
        let service = service();
        let result = service.create(new_note("", "Math")).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
