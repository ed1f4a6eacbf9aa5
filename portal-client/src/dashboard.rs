use eduportal_common::{
    can_redeem_gift_card, gift_card_progress, Achievement, Note, UpcomingClass, UserProfile,
    ACHIEVEMENTS,
};

#[derive(Debug, Clone, PartialEq)]
pub struct AchievementStatus {
    pub achievement: Achievement,
    pub unlocked: bool,
}

/// Everything the dashboard and rewards pages display.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub name: String,
    pub points: u64,
    pub streak: u32,
    pub next_class: Option<UpcomingClass>,
    pub achievements: Vec<AchievementStatus>,
    /// Percent towards the gift card, 0 to 100.
    pub gift_card_progress: f64,
    pub can_redeem_gift_card: bool,
    pub note_count: usize,
}

impl Dashboard {
    pub fn new(profile: &UserProfile, notes: &[Note]) -> Self {
        let achievements = ACHIEVEMENTS
            .iter()
            .map(|achievement| AchievementStatus {
                achievement: *achievement,
                unlocked: achievement.is_unlocked(profile.points),
            })
            .collect();

        Self {
            name: profile.name.clone(),
            points: profile.points,
            streak: profile.streak,
            next_class: profile.upcoming_classes.first().cloned(),
            achievements,
            gift_card_progress: gift_card_progress(profile.points),
            can_redeem_gift_card: can_redeem_gift_card(profile.points),
            note_count: notes.len(),
        }
    }

    pub fn unlocked(&self) -> impl Iterator<Item = &Achievement> {
        self.achievements
            .iter()
            .filter(|status| status.unlocked)
            .map(|status| &status.achievement)
    }
}
