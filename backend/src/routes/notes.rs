use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use eduportal_common::{NewNote, Note};
use serde::Deserialize;

use super::{json_body, required};
use crate::error::{Error, Result};
use crate::AppState;

/// Body of POST /api/notes. Text fields may be empty but must be present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub firebase_uid: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl CreateNoteRequest {
    fn into_new_note(self) -> Result<NewNote> {
        match (
            required(self.firebase_uid),
            self.subject,
            self.chapter,
            self.content,
        ) {
            (Some(firebase_uid), Some(subject), Some(chapter), Some(content)) => Ok(NewNote {
                firebase_uid,
                subject,
                chapter,
                content,
            }),
            _ => Err(Error::Validation(
                "subject, chapter, content and firebaseUid are required.".to_string(),
            )),
        }
    }
}

/// GET /api/notes/:uid - List the notes owned by a user
async fn list_notes(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<Vec<Note>>> {
    let notes = state.notes.list_by_owner(&uid).await?;
    Ok(Json(notes))
}

/// POST /api/notes - Save a new note
async fn create_note(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Note>)> {
    let note = json_body(payload)?.into_new_note()?;
    let created = state.notes.create(note).await.map_err(save_failed)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// A note that could not be written answers 400, not 500. The cause is only logged.
fn save_failed(err: Error) -> Error {
    match err {
        Error::StoreUnavailable(_) | Error::Internal(_) => {
            tracing::error!("Failed to save note: {}", err);
            Error::Validation("Failed to save note.".to_string())
        }
        other => other,
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/notes", post(create_note))
        .route("/api/notes/:uid", get(list_notes))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::LogMailer;
    use crate::store::{Document, DocumentStore, StoreError, StoredDocument};
    use crate::test_util::create_test_state_with_store;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    /// Store whose every call fails as if the database were unreachable.
    struct DownStore;

    #[async_trait]
    impl DocumentStore for DownStore {
        fn backend(&self) -> &'static str {
            "down"
        }

        async fn get(&self, _: &str, _: &str) -> std::result::Result<Option<Document>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn set(&self, _: &str, _: &str, _: &Document) -> std::result::Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn update(
            &self,
            _: &str,
            _: &str,
            _: &Document,
        ) -> std::result::Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn add(&self, _: &str, _: &Document) -> std::result::Result<String, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn find_by_field(
            &self,
            _: &str,
            _: &str,
            _: &Value,
        ) -> std::result::Result<Vec<StoredDocument>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    async fn send(uri: &str, method: &str, body: Body) -> (StatusCode, Value) {
        let state = create_test_state_with_store(Arc::new(DownStore), Arc::new(LogMailer));
        let response = router(Arc::new(state))
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_store_failure_on_create_is_400() {
        let body = r#"{"firebaseUid": "u1", "subject": "Math", "chapter": "1", "content": "x"}"#;
        let (status, json) = send("/api/notes", "POST", Body::from(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Failed to save note.");
    }

    #[tokio::test]
    async fn test_store_failure_on_list_is_500() {
        let (status, json) = send("/api/notes/u1", "GET", Body::empty()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Internal Server Error");
    }

    #[test]
    fn test_create_request_allows_empty_text() {
        let request: CreateNoteRequest = serde_json::from_str(
            r#"{"firebaseUid": "u1", "subject": "", "chapter": "", "content": ""}"#,
        )
        .unwrap();
        let note = request.into_new_note().unwrap();
        assert_eq!(note.firebase_uid, "u1");
        assert!(note.subject.is_empty());
    }

    #[test]
    fn test_create_request_requires_every_field() {
        let request: CreateNoteRequest =
            serde_json::from_str(r#"{"firebaseUid": "u1", "subject": "Math"}"#).unwrap();
        assert!(matches!(request.into_new_note(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_create_request_requires_owner() {
        let request: CreateNoteRequest = serde_json::from_str(
            r#"{"firebaseUid": "", "subject": "Math", "chapter": "1", "content": "x"}"#,
        )
        .unwrap();
        assert!(matches!(request.into_new_note(), Err(Error::Validation(_))));
    }
}
