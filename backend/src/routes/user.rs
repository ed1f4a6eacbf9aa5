use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use eduportal_common::{ProfileUpdate, UserProfile};
use serde::Deserialize;

use super::{json_body, required};
use crate::error::{Error, Result};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOrCreateRequest {
    #[serde(default)]
    pub firebase_uid: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// POST /api/user - Get or create the caller's profile
async fn fetch_or_create(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<FetchOrCreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserProfile>)> {
    let request = json_body(payload)?;
    let (uid, email) = match (required(request.firebase_uid), required(request.email)) {
        (Some(uid), Some(email)) => (uid, email),
        _ => {
            return Err(Error::Validation(
                "Firebase UID and email are required.".to_string(),
            ))
        }
    };

    let outcome = state.profiles.fetch_or_create(&uid, &email).await?;
    let status = if outcome.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(outcome.into_profile())))
}

/// PUT /api/user/:uid - Overwrite the named profile fields
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    payload: std::result::Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<UserProfile>> {
    let update = json_body(payload)?;
    let profile = state.profiles.partial_update(&uid, &update).await?;
    Ok(Json(profile))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/user", post(fetch_or_create))
        .route("/api/user/:uid", put(update_profile))
        .with_state(state)
}
