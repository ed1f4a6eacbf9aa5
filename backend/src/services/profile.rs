use std::sync::Arc;

use eduportal_common::{FetchOutcome, ProfileUpdate, UserProfile, MAX_POINTS};

use super::{from_document, to_document};
use crate::error::{Error, Result};
use crate::store::DocumentStore;

/// Collection holding one profile per identity, keyed by the identity.
pub const USERS: &str = "users";

/// Owns the user-profile records.
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, uid: &str) -> Result<Option<UserProfile>> {
        self.store
            .get(USERS, uid)
            .await?
            .map(from_document)
            .transpose()
    }

    /// Return the profile for `uid`, creating it with defaults on first sign-in.
    pub async fn fetch_or_create(&self, uid: &str, email: &str) -> Result<FetchOutcome> {
        if uid.trim().is_empty() || email.trim().is_empty() {
            return Err(Error::Validation(
                "Firebase UID and email are required.".to_string(),
            ));
        }

        if let Some(profile) = self.get(uid).await? {
            return Ok(FetchOutcome::Found(profile));
        }

        let profile = UserProfile::with_defaults(uid, email);
        self.store.set(USERS, uid, &to_document(&profile)?).await?;
        tracing::info!("Created new user: {} ({})", uid, email);

        Ok(FetchOutcome::Created(profile))
    }

    /// Overwrite only the fields named in `update` and return the full record.
    pub async fn partial_update(&self, uid: &str, update: &ProfileUpdate) -> Result<UserProfile> {
        let not_found = || Error::NotFound(format!("profile {}", uid));
        update.validate().map_err(Error::Validation)?;

        if update.is_empty() {
            return self.get(uid).await?.ok_or_else(not_found);
        }

        let fields = to_document(update)?;
        self.store.update(USERS, uid, &fields).await?;
        tracing::debug!(
            "Updated profile {}: {:?}",
            uid,
            update.fields().iter().map(|f| f.as_str()).collect::<Vec<_>>()
        );

        self.get(uid).await?.ok_or_else(not_found)
    }

    /// Add `amount` to the stored points, saturating at zero and `MAX_POINTS`.
    ///
    /// Read-then-write with no isolation: concurrent accruals on the same
    /// profile can lose updates.
    pub async fn accrue_points(&self, uid: &str, amount: i64, reason: &str) -> Result<UserProfile> {
        let current = self
            .get(uid)
            .await?
            .ok_or_else(|| Error::NotFound(format!("profile {}", uid)))?;

        let points = current.points.saturating_add_signed(amount).min(MAX_POINTS);
        tracing::info!(uid = %uid, amount, reason = %reason, points, "Accruing points");

        self.partial_update(uid, &ProfileUpdate::points(points)).await
    }
}
