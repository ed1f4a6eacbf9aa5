//! User profile types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Bio given to every new profile.
pub const DEFAULT_BIO: &str = "Eager to learn and conquer new challenges!";

/// Largest points balance a store can hold (a signed 64-bit integer).
pub const MAX_POINTS: u64 = i64::MAX as u64;

/// A scheduled class shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingClass {
    pub id: u64,
    pub title: String,
    pub time: String,
}

/// A homework assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeworkItem {
    pub id: u64,
    pub title: String,
    pub due: String,
}

/// A recorded test result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestScore {
    pub subject: String,
    pub score: f64,
}

/// Persisted progress and gamification state of a student.
///
/// Keyed by the opaque identity token issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub firebase_uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub points: u64,
    /// Consecutive study days.
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub upcoming_classes: Vec<UpcomingClass>,
    #[serde(default)]
    pub homework: Vec<HomeworkItem>,
    #[serde(default)]
    pub test_scores: Vec<TestScore>,
}

impl UserProfile {
    /// Profile created on first sign-in.
    pub fn with_defaults(firebase_uid: &str, email: &str) -> Self {
        Self {
            firebase_uid: firebase_uid.to_string(),
            email: email.to_string(),
            name: display_name_from_email(email),
            points: 0,
            streak: 0,
            bio: DEFAULT_BIO.to_string(),
            upcoming_classes: vec![UpcomingClass {
                id: 1,
                title: "Welcome Class!".to_string(),
                time: "Now".to_string(),
            }],
            homework: Vec::new(),
            test_scores: Vec::new(),
        }
    }
}

/// Local part of an email address, used as the initial display name.
pub fn display_name_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}

/// Result of a fetch-or-create call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Found(UserProfile),
    Created(UserProfile),
}

impl FetchOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, FetchOutcome::Created(_))
    }

    pub fn profile(&self) -> &UserProfile {
        match self {
            FetchOutcome::Found(profile) | FetchOutcome::Created(profile) => profile,
        }
    }

    pub fn into_profile(self) -> UserProfile {
        match self {
            FetchOutcome::Found(profile) | FetchOutcome::Created(profile) => profile,
        }
    }
}

/// Attributes that can be named in a partial update.
///
/// `firebaseUid` is deliberately absent: the identity never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    Email,
    Name,
    Points,
    Streak,
    Bio,
    UpcomingClasses,
    Homework,
    TestScores,
}

impl ProfileField {
    pub const ALL: [ProfileField; 8] = [
        ProfileField::Email,
        ProfileField::Name,
        ProfileField::Points,
        ProfileField::Streak,
        ProfileField::Bio,
        ProfileField::UpcomingClasses,
        ProfileField::Homework,
        ProfileField::TestScores,
    ];

    /// Key used on the wire and in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::Email => "email",
            ProfileField::Name => "name",
            ProfileField::Points => "points",
            ProfileField::Streak => "streak",
            ProfileField::Bio => "bio",
            ProfileField::UpcomingClasses => "upcomingClasses",
            ProfileField::Homework => "homework",
            ProfileField::TestScores => "testScores",
        }
    }
}

/// A partial update: every `Some` field overwrites the stored value wholesale.
///
/// Unknown keys are rejected at deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upcoming_classes: Option<Vec<UpcomingClass>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homework: Option<Vec<HomeworkItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_scores: Option<Vec<TestScore>>,
}

impl ProfileUpdate {
    /// Update touching only the points counter.
    pub fn points(points: u64) -> Self {
        Self {
            points: Some(points),
            ..Default::default()
        }
    }

    /// Fields named by this update, in declaration order.
    pub fn fields(&self) -> Vec<ProfileField> {
        ProfileField::ALL
            .into_iter()
            .filter(|field| self.names(*field))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Check values the wire types accept but a store cannot hold.
    pub fn validate(&self) -> Result<(), String> {
        match self.points {
            Some(points) if points > MAX_POINTS => {
                Err(format!("points must not exceed {}.", MAX_POINTS))
            }
            _ => Ok(()),
        }
    }

    fn names(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::Email => self.email.is_some(),
            ProfileField::Name => self.name.is_some(),
            ProfileField::Points => self.points.is_some(),
            ProfileField::Streak => self.streak.is_some(),
            ProfileField::Bio => self.bio.is_some(),
            ProfileField::UpcomingClasses => self.upcoming_classes.is_some(),
            ProfileField::Homework => self.homework.is_some(),
            ProfileField::TestScores => self.test_scores.is_some(),
        }
    }

    /// The named fields as a flat document keyed by wire name.
    pub fn to_document(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    /// Overwrite the named fields of `profile` in place.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(ref email) = self.email {
            profile.email = email.clone();
        }
        if let Some(ref name) = self.name {
            profile.name = name.clone();
        }
        if let Some(points) = self.points {
            profile.points = points;
        }
        if let Some(streak) = self.streak {
            profile.streak = streak;
        }
        if let Some(ref bio) = self.bio {
            profile.bio = bio.clone();
        }
        if let Some(ref classes) = self.upcoming_classes {
            profile.upcoming_classes = classes.clone();
        }
        if let Some(ref homework) = self.homework {
            profile.homework = homework.clone();
        }
        if let Some(ref scores) = self.test_scores {
            profile.test_scores = scores.clone();
        }
    }
}
