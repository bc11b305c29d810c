//! Action dispatch - the seam between user-facing handlers and the engines
//!
//! Post/comment/like/follow handlers report what happened through one call;
//! the dispatcher fans it out to the lifetime counters, the quest engine and
//! the achievement engine. New quest or achievement types subscribe to
//! actions here without touching the handlers themselves.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::db::models::criteria_types;
use crate::db::{users, Achievement, LedgerDb, Quest};
use crate::error::RewardError;

use super::achievement_service::AchievementService;
use super::quest_service::QuestService;

/// A user-facing action relevant to reward progression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    PostCreated,
    PostRead,
    CommentCreated,
    PostLiked,
    FollowerGained,
}

impl UserAction {
    /// Lifetime counter this action feeds
    pub fn counter(&self) -> &'static str {
        match self {
            UserAction::PostCreated => criteria_types::POSTS_CREATED,
            UserAction::PostRead => criteria_types::POSTS_READ,
            UserAction::CommentCreated => criteria_types::COMMENTS_MADE,
            UserAction::PostLiked => criteria_types::LIKES_GIVEN,
            UserAction::FollowerGained => criteria_types::FOLLOWERS_GAINED,
        }
    }

    /// Daily quest type this action progresses, if any
    pub fn quest_type(&self) -> Option<&'static str> {
        match self {
            UserAction::PostCreated => Some("create_post"),
            UserAction::CommentCreated => Some("comment_post"),
            UserAction::PostLiked => Some("like_post"),
            UserAction::PostRead | UserAction::FollowerGained => None,
        }
    }
}

/// What one recorded action changed
#[derive(Debug, Serialize)]
pub struct ActionOutcome {
    /// Updated quest, when a live quest of the matching type existed
    pub quest: Option<Quest>,
    /// Achievements newly unlocked by this action
    pub unlocked: Vec<Achievement>,
}

/// Fans user actions out to the progress trackers
pub struct ActionDispatcher {
    db: Arc<LedgerDb>,
    quests: Arc<QuestService>,
    achievements: Arc<AchievementService>,
}

impl ActionDispatcher {
    pub fn new(
        db: Arc<LedgerDb>,
        quests: Arc<QuestService>,
        achievements: Arc<AchievementService>,
    ) -> Self {
        Self {
            db,
            quests,
            achievements,
        }
    }

    /// Record one successful user action.
    ///
    /// Increments the lifetime counter, advances any matching live quest
    /// (a no-op when none exists), then re-evaluates achievements.
    pub fn record(&self, user_id: &str, action: UserAction) -> Result<ActionOutcome, RewardError> {
        {
            let mut conn = self.db.conn()?;
            users::get_user_required(&mut conn, user_id)?;
            users::increment_action_count(&mut conn, user_id, action.counter(), 1)?;
        }

        let quest = match action.quest_type() {
            Some(quest_type) => self.quests.update_quest_progress(user_id, quest_type, 1)?,
            None => None,
        };

        let unlocked = self.achievements.check_and_unlock_achievements(user_id)?;

        debug!(
            user = %user_id,
            action = ?action,
            quest_updated = quest.is_some(),
            unlocked = unlocked.len(),
            "Recorded user action"
        );

        Ok(ActionOutcome { quest, unlocked })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_counter_mapping() {
        assert_eq!(UserAction::PostCreated.counter(), "posts_created");
        assert_eq!(UserAction::PostRead.counter(), "posts_read");
        assert_eq!(UserAction::CommentCreated.counter(), "comments_made");
        assert_eq!(UserAction::FollowerGained.counter(), "followers_gained");
    }

    #[test]
    fn test_action_quest_mapping() {
        assert_eq!(UserAction::PostCreated.quest_type(), Some("create_post"));
        assert_eq!(UserAction::PostLiked.quest_type(), Some("like_post"));
        assert_eq!(UserAction::PostRead.quest_type(), None);
        assert_eq!(UserAction::FollowerGained.quest_type(), None);
    }
}
