//! Point rewards, achievements and the gift-card goal.

use serde::Serialize;

/// Points needed to redeem a gift card.
pub const GIFT_CARD_THRESHOLD: u64 = 10_000;

/// Actions that earn points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reward {
    AttendClass,
    AnswerQuestion,
    StudySession,
    AskTutor,
}

impl Reward {
    pub fn points(self) -> i64 {
        match self {
            Reward::AttendClass => 20,
            Reward::AnswerQuestion => 30,
            Reward::StudySession => 30,
            Reward::AskTutor => 1,
        }
    }

    /// Human-readable reason, logged alongside the accrual.
    pub fn reason(self) -> &'static str {
        match self {
            Reward::AttendClass => "Attending Class",
            Reward::AnswerQuestion => "Solving a doubt",
            Reward::StudySession => "Studying in video conference",
            Reward::AskTutor => "Asking a question to the tutor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub title: &'static str,
    pub description: &'static str,
    pub points_required: u64,
    pub icon: &'static str,
}

impl Achievement {
    pub fn is_unlocked(&self, points: u64) -> bool {
        points >= self.points_required
    }
}

pub const ACHIEVEMENTS: [Achievement; 6] = [
    Achievement {
        title: "First Steps",
        description: "Log in for the first time.",
        points_required: 0,
        icon: "🚶",
    },
    Achievement {
        title: "Note Taker",
        description: "Create 5 notes.",
        points_required: 5,
        icon: "📝",
    },
    Achievement {
        title: "Chatterbox",
        description: "Ask the AI tutor 10 questions.",
        points_required: 0,
        icon: "💬",
    },
    Achievement {
        title: "Community Helper",
        description: "Answer 5 community questions.",
        points_required: 150,
        icon: "🤝",
    },
    Achievement {
        title: "Perfect Week",
        description: "Maintain a 7-day study streak.",
        points_required: 100,
        icon: "🗓️",
    },
    Achievement {
        title: "The Expert",
        description: "Earn 1000 points.",
        points_required: 1000,
        icon: "🧠",
    },
];

/// Percentage towards the gift card, capped at 100.
pub fn gift_card_progress(points: u64) -> f64 {
    let percent = points as f64 / GIFT_CARD_THRESHOLD as f64 * 100.0;
    percent.min(100.0)
}

pub fn can_redeem_gift_card(points: u64) -> bool {
    points >= GIFT_CARD_THRESHOLD
}
