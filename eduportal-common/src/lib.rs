//! EduPortal Common Types
//!
//! Shared types used by both the backend API and the portal client.

pub mod gamification;
pub mod note;
pub mod profile;

pub use gamification::{
    can_redeem_gift_card, gift_card_progress, Achievement, Reward, ACHIEVEMENTS,
    GIFT_CARD_THRESHOLD,
};
pub use note::{NewNote, Note};
pub use profile::{
    FetchOutcome, HomeworkItem, ProfileField, ProfileUpdate, TestScore, UpcomingClass,
    UserProfile, MAX_POINTS,
};
