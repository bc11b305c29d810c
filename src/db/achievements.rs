//! Achievement catalog and per-user unlock rows
//!
//! The catalog is seeded once and read-only afterwards. Per-user rows are
//! created lazily (insert-or-ignore) and unlocking is a guarded update on
//! `is_unlocked` so a concurrent double-unlock has exactly one winner.

use diesel::prelude::*;
use uuid::Uuid;

use super::models::{
    criteria_types, current_timestamp, Achievement, NewAchievement, NewUserAchievement,
    UserAchievement,
};
use super::schema::{achievements, user_achievements};
use crate::config::AchievementSpec;
use crate::error::RewardError;

// ============================================================================
// Catalog
// ============================================================================

/// Seed the achievement catalog; existing ids are left untouched
pub fn seed_achievements(
    conn: &mut SqliteConnection,
    specs: &[AchievementSpec],
) -> Result<usize, RewardError> {
    let now = current_timestamp();
    let mut inserted = 0;

    for spec in specs {
        if !criteria_types::is_valid(&spec.criteria_type) {
            return Err(RewardError::InvalidInput(format!(
                "Invalid criteria type: {}. Valid types: {:?}",
                spec.criteria_type,
                criteria_types::ALL
            )));
        }
        if spec.criteria_target <= 0 {
            return Err(RewardError::InvalidInput(format!(
                "criteria_target must be > 0 for {}",
                spec.id
            )));
        }

        let row = NewAchievement {
            id: &spec.id,
            title: &spec.title,
            description: spec.description.as_deref(),
            badge_id: &spec.badge_id,
            coin_reward: spec.coin_reward,
            criteria_type: &spec.criteria_type,
            criteria_target: spec.criteria_target,
            created_at: &now,
        };

        inserted += diesel::insert_or_ignore_into(achievements::table)
            .values(&row)
            .execute(conn)?;
    }

    Ok(inserted)
}

/// Full achievement catalog
pub fn list_achievements(conn: &mut SqliteConnection) -> Result<Vec<Achievement>, RewardError> {
    achievements::table
        .order(achievements::created_at.asc())
        .load(conn)
        .map_err(RewardError::from)
}

/// Get one achievement definition
pub fn get_achievement(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Achievement>, RewardError> {
    achievements::table
        .filter(achievements::id.eq(id))
        .first(conn)
        .optional()
        .map_err(RewardError::from)
}

// ============================================================================
// Per-User Rows
// ============================================================================

/// Get the user's row for one achievement
pub fn get_user_achievement(
    conn: &mut SqliteConnection,
    user_id: &str,
    achievement_id: &str,
) -> Result<Option<UserAchievement>, RewardError> {
    user_achievements::table
        .filter(user_achievements::user_id.eq(user_id))
        .filter(user_achievements::achievement_id.eq(achievement_id))
        .first(conn)
        .optional()
        .map_err(RewardError::from)
}

/// All of the user's achievement rows
pub fn list_user_achievements(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<UserAchievement>, RewardError> {
    user_achievements::table
        .filter(user_achievements::user_id.eq(user_id))
        .load(conn)
        .map_err(RewardError::from)
}

/// Ensure a progress row exists for (user, achievement), creating it at zero.
///
/// UNIQUE(user_id, achievement_id) makes the insert-or-ignore safe under
/// concurrent first evaluations.
pub fn ensure_user_achievement(
    conn: &mut SqliteConnection,
    user_id: &str,
    achievement_id: &str,
) -> Result<UserAchievement, RewardError> {
    let id = Uuid::new_v4().to_string();
    let now = current_timestamp();

    diesel::insert_or_ignore_into(user_achievements::table)
        .values(&NewUserAchievement {
            id: &id,
            user_id,
            achievement_id,
            current_progress: 0,
            is_unlocked: 0,
            created_at: &now,
            updated_at: &now,
        })
        .execute(conn)?;

    get_user_achievement(conn, user_id, achievement_id)?
        .ok_or_else(|| RewardError::Internal("Failed to retrieve user achievement row".into()))
}

/// Write recomputed progress for a not-yet-unlocked row
pub fn update_progress(
    conn: &mut SqliteConnection,
    user_id: &str,
    achievement_id: &str,
    progress: i32,
) -> Result<(), RewardError> {
    diesel::update(
        user_achievements::table
            .filter(user_achievements::user_id.eq(user_id))
            .filter(user_achievements::achievement_id.eq(achievement_id))
            .filter(user_achievements::is_unlocked.eq(0)),
    )
    .set((
        user_achievements::current_progress.eq(progress),
        user_achievements::updated_at.eq(current_timestamp()),
    ))
    .execute(conn)?;

    Ok(())
}

/// Flip `is_unlocked`, guarded so at most one concurrent unlocker wins.
///
/// Unlocked state is terminal; this never runs against an already-unlocked
/// row.
pub fn mark_unlocked(
    conn: &mut SqliteConnection,
    user_id: &str,
    achievement_id: &str,
) -> Result<bool, RewardError> {
    let now = current_timestamp();
    let updated = diesel::update(
        user_achievements::table
            .filter(user_achievements::user_id.eq(user_id))
            .filter(user_achievements::achievement_id.eq(achievement_id))
            .filter(user_achievements::is_unlocked.eq(0)),
    )
    .set((
        user_achievements::is_unlocked.eq(1),
        user_achievements::unlocked_at.eq(&now),
        user_achievements::updated_at.eq(&now),
    ))
    .execute(conn)?;

    Ok(updated > 0)
}
