use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use super::{json_body, required};
use crate::error::{Error, Result};
use crate::mail::EmailMessage;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    #[serde(default)]
    pub recipient_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/send-verification-email - Send the welcome email
async fn send_verification_email(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let recipient = required(json_body(payload)?.recipient_email)
        .ok_or_else(|| Error::Validation("recipientEmail is required.".to_string()))?;

    let message = EmailMessage::welcome(&recipient, &state.config.email.from_address);
    state.mailer.send(&message).await?;

    Ok(Json(MessageResponse {
        message: "Email sent successfully!".to_string(),
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/send-verification-email", post(send_verification_email))
        .with_state(state)
}
