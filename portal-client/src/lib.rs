//! EduPortal client.
//!
//! Typed access to the portal's HTTP API and the view model the dashboard is
//! rendered from. Point accrual happens here, client side: the new total is
//! computed from the profile the client holds and written back as a partial
//! update.

mod dashboard;
mod error;

pub use dashboard::{AchievementStatus, Dashboard};
pub use error::{ClientError, Result};

use eduportal_common::{
    FetchOutcome, NewNote, Note, ProfileUpdate, Reward, UserProfile, MAX_POINTS,
};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;

/// Client for the EduPortal API.
pub struct PortalClient {
    http_client: Client,
    base_url: String,
}

impl PortalClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL followed by `segments`, each percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// POST /api/user
    pub async fn fetch_or_create(&self, uid: &str, email: &str) -> Result<FetchOutcome> {
        let response = self
            .http_client
            .post(self.url(&["api", "user"])?)
            .json(&json!({ "firebaseUid": uid, "email": email }))
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        let created = response.status() == StatusCode::CREATED;
        let profile: UserProfile = parse(response).await?;

        Ok(if created {
            FetchOutcome::Created(profile)
        } else {
            FetchOutcome::Found(profile)
        })
    }

    /// Load the profile after authentication, sending the welcome email when
    /// the profile was just created.
    ///
    /// A failed email is logged and does not fail sign-in.
    pub async fn sign_in(&self, uid: &str, email: &str) -> Result<UserProfile> {
        let outcome = self.fetch_or_create(uid, email).await?;

        if outcome.is_created() {
            if let Err(e) = self.send_welcome_email(email).await {
                tracing::warn!("Welcome email to {} failed: {}", email, e);
            }
        }

        Ok(outcome.into_profile())
    }

    /// PUT /api/user/:uid
    pub async fn update_profile(&self, uid: &str, update: &ProfileUpdate) -> Result<UserProfile> {
        let response = self
            .http_client
            .put(self.url(&["api", "user", uid])?)
            .json(update)
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        parse(response).await
    }

    /// Add the reward to the points of `profile` and store the new total.
    ///
    /// The total is computed from `profile` as held by the caller, so a stale
    /// copy overwrites points earned elsewhere in the meantime.
    pub async fn accrue_points(&self, profile: &UserProfile, reward: Reward) -> Result<UserProfile> {
        let points = profile
            .points
            .saturating_add_signed(reward.points())
            .min(MAX_POINTS);
        tracing::info!("+{} points for: {}", reward.points(), reward.reason());

        self.update_profile(&profile.firebase_uid, &ProfileUpdate::points(points))
            .await
    }

    /// GET /api/notes/:uid
    pub async fn list_notes(&self, uid: &str) -> Result<Vec<Note>> {
        let response = self
            .http_client
            .get(self.url(&["api", "notes", uid])?)
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        parse(response).await
    }

    /// POST /api/notes
    pub async fn create_note(&self, note: &NewNote) -> Result<Note> {
        let response = self
            .http_client
            .post(self.url(&["api", "notes"])?)
            .json(note)
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        parse(response).await
    }

    /// POST /api/send-verification-email
    pub async fn send_welcome_email(&self, recipient: &str) -> Result<()> {
        let response = self
            .http_client
            .post(self.url(&["api", "send-verification-email"])?)
            .json(&json!({ "recipientEmail": recipient }))
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        check(response).await.map(|_| ())
    }

    /// Dashboard for `profile`, fetching its notes.
    pub async fn load_dashboard(&self, profile: &UserProfile) -> Result<Dashboard> {
        let notes = self.list_notes(&profile.firebase_uid).await?;
        Ok(Dashboard::new(profile, &notes))
    }
}

async fn check(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or(body);

    Err(ClientError::Api { status, message })
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
    check(response)
        .await?
        .json()
        .await
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))
}
