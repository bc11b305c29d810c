//! Achievement engine - unlock evaluation and payout
//!
//! Progress is recomputed from lifetime action counters on every check
//! rather than tracked incrementally, so out-of-band data changes (backfill,
//! moderation deletes) are reflected on the next evaluation. Unlocks are
//! terminal and pay out exactly once.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::db::{achievements, users, Achievement, LedgerDb};
use crate::error::RewardError;

use super::events::{EventBus, RewardEvent};

/// Progress view for one catalog achievement
#[derive(Debug, Clone, Serialize)]
pub struct UserAchievementView {
    pub achievement: Achievement,
    pub current_progress: i32,
    pub is_unlocked: bool,
    pub unlocked_at: Option<String>,
}

/// Result of a direct unlock
#[derive(Debug, Clone, Serialize)]
pub struct UnlockOutcome {
    pub achievement_id: String,
    pub badge_id: String,
    pub coins_awarded: i32,
    pub balance: i32,
}

/// Achievement engine
pub struct AchievementService {
    db: Arc<LedgerDb>,
    events: Arc<EventBus>,
}

impl AchievementService {
    pub fn new(db: Arc<LedgerDb>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// Full immutable achievement catalog
    pub fn get_all_achievements(&self) -> Result<Vec<Achievement>, RewardError> {
        let mut conn = self.db.conn()?;
        achievements::list_achievements(&mut conn)
    }

    /// Progress view for every catalog achievement.
    ///
    /// Achievements never evaluated for this user appear with zero progress
    /// rather than being omitted. Locked entries show live counter values;
    /// unlocked entries keep the progress recorded at unlock time.
    pub fn get_user_achievements(
        &self,
        user_id: &str,
    ) -> Result<Vec<UserAchievementView>, RewardError> {
        let mut conn = self.db.conn()?;

        users::get_user_required(&mut conn, user_id)?;

        let catalog = achievements::list_achievements(&mut conn)?;
        let rows = achievements::list_user_achievements(&mut conn, user_id)?;

        let mut views = Vec::with_capacity(catalog.len());
        for achievement in catalog {
            let row = rows.iter().find(|r| r.achievement_id == achievement.id);

            let view = match row {
                Some(r) if r.is_unlocked == 1 => UserAchievementView {
                    current_progress: r.current_progress,
                    is_unlocked: true,
                    unlocked_at: r.unlocked_at.clone(),
                    achievement,
                },
                _ => {
                    let progress =
                        users::get_action_count(&mut conn, user_id, &achievement.criteria_type)?;
                    UserAchievementView {
                        current_progress: progress,
                        is_unlocked: false,
                        unlocked_at: None,
                        achievement,
                    }
                }
            };
            views.push(view);
        }

        Ok(views)
    }

    /// Evaluate all achievements and unlock any whose criteria are met.
    ///
    /// Returns exactly the set newly unlocked by this call. Idempotent:
    /// already-unlocked achievements are skipped unconditionally, so a
    /// second consecutive call unlocks nothing.
    pub fn check_and_unlock_achievements(
        &self,
        user_id: &str,
    ) -> Result<Vec<Achievement>, RewardError> {
        let mut conn = self.db.conn()?;

        let unlocked = conn.immediate_transaction(|conn| {
            users::get_user_required(conn, user_id)?;

            let catalog = achievements::list_achievements(conn)?;
            let mut newly_unlocked = Vec::new();

            for achievement in catalog {
                let row = achievements::ensure_user_achievement(conn, user_id, &achievement.id)?;
                if row.is_unlocked == 1 {
                    continue;
                }

                let progress =
                    users::get_action_count(conn, user_id, &achievement.criteria_type)?;
                achievements::update_progress(conn, user_id, &achievement.id, progress)?;

                if progress >= achievement.criteria_target {
                    // Guarded flip: a concurrent check for the same user
                    // unlocks (and pays) at most once
                    if achievements::mark_unlocked(conn, user_id, &achievement.id)? {
                        users::credit_coins(conn, user_id, achievement.coin_reward)?;
                        newly_unlocked.push(achievement);
                    }
                }
            }

            Ok::<_, RewardError>(newly_unlocked)
        })?;

        for achievement in &unlocked {
            info!(
                user = %user_id,
                achievement = %achievement.id,
                reward = achievement.coin_reward,
                "Achievement unlocked"
            );
            self.events.emit(RewardEvent::AchievementUnlocked {
                user_id: user_id.to_string(),
                achievement_id: achievement.id.clone(),
                title: achievement.title.clone(),
                badge_id: achievement.badge_id.clone(),
                coin_reward: achievement.coin_reward,
            });
        }

        if unlocked.is_empty() {
            debug!(user = %user_id, "Achievement check unlocked nothing");
        }

        Ok(unlocked)
    }

    /// Direct unlock path, bypassing criteria evaluation.
    ///
    /// For callers that established eligibility out-of-band (admin action,
    /// internal use by the automatic check).
    pub fn unlock_achievement(
        &self,
        user_id: &str,
        achievement_id: &str,
    ) -> Result<UnlockOutcome, RewardError> {
        let mut conn = self.db.conn()?;

        let (outcome, title) = conn.immediate_transaction(|conn| {
            let achievement = achievements::get_achievement(conn, achievement_id)?
                .ok_or_else(|| RewardError::NotFound(format!("achievement {}", achievement_id)))?;

            users::get_user_required(conn, user_id)?;

            let row = achievements::ensure_user_achievement(conn, user_id, achievement_id)?;
            if row.is_unlocked == 1 {
                return Err(RewardError::AlreadyUnlocked(achievement_id.to_string()));
            }

            let progress = users::get_action_count(conn, user_id, &achievement.criteria_type)?;
            achievements::update_progress(conn, user_id, achievement_id, progress)?;

            if !achievements::mark_unlocked(conn, user_id, achievement_id)? {
                return Err(RewardError::AlreadyUnlocked(achievement_id.to_string()));
            }

            let change = users::credit_coins(conn, user_id, achievement.coin_reward)?;

            let outcome = UnlockOutcome {
                achievement_id: achievement.id.clone(),
                badge_id: achievement.badge_id.clone(),
                coins_awarded: achievement.coin_reward,
                balance: change.balance,
            };
            Ok::<_, RewardError>((outcome, achievement.title))
        })?;

        info!(
            user = %user_id,
            achievement = %achievement_id,
            reward = outcome.coins_awarded,
            "Achievement unlocked directly"
        );
        self.events.emit(RewardEvent::AchievementUnlocked {
            user_id: user_id.to_string(),
            achievement_id: outcome.achievement_id.clone(),
            title,
            badge_id: outcome.badge_id.clone(),
            coin_reward: outcome.coins_awarded,
        });

        Ok(outcome)
    }
}
