//! Quest row operations
//!
//! Progress increments happen SQL-side (`current_amount = current_amount + ?`)
//! and claiming is a guarded update on the terminal flag, so concurrent
//! callers serialize at the storage layer instead of racing read-modify-write
//! in Rust.

use diesel::prelude::*;
use uuid::Uuid;

use super::models::{current_timestamp, NewQuest, Quest};
use super::schema::quests;
use crate::error::RewardError;

/// Input for inserting a quest row
#[derive(Debug, Clone)]
pub struct InsertQuestInput<'a> {
    pub user_id: &'a str,
    pub quest_type: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub target_amount: i32,
    pub reward: i32,
    pub expires_at: &'a str,
}

// ============================================================================
// Read Operations
// ============================================================================

/// Get a quest by ID, scoped to its owner
pub fn get_quest(
    conn: &mut SqliteConnection,
    user_id: &str,
    quest_id: &str,
) -> Result<Option<Quest>, RewardError> {
    quests::table
        .filter(quests::user_id.eq(user_id))
        .filter(quests::id.eq(quest_id))
        .first(conn)
        .optional()
        .map_err(RewardError::from)
}

/// All quest rows for a user, newest first
pub fn list_quests(conn: &mut SqliteConnection, user_id: &str) -> Result<Vec<Quest>, RewardError> {
    quests::table
        .filter(quests::user_id.eq(user_id))
        .order((quests::created_at.desc(), quests::id.asc()))
        .load(conn)
        .map_err(RewardError::from)
}

/// Unexpired quests for a user (any claim/completion state)
pub fn active_quests(
    conn: &mut SqliteConnection,
    user_id: &str,
    now: &str,
) -> Result<Vec<Quest>, RewardError> {
    quests::table
        .filter(quests::user_id.eq(user_id))
        .filter(quests::expires_at.gt(now))
        .order(quests::created_at.asc())
        .load(conn)
        .map_err(RewardError::from)
}

/// The user's live (unexpired, unclaimed) quest of one type, if any
pub fn find_live_quest(
    conn: &mut SqliteConnection,
    user_id: &str,
    quest_type: &str,
    now: &str,
) -> Result<Option<Quest>, RewardError> {
    quests::table
        .filter(quests::user_id.eq(user_id))
        .filter(quests::quest_type.eq(quest_type))
        .filter(quests::is_claimed.eq(0))
        .filter(quests::expires_at.gt(now))
        .first(conn)
        .optional()
        .map_err(RewardError::from)
}

// ============================================================================
// Write Operations
// ============================================================================

/// Insert a fresh quest row with zeroed progress
pub fn insert_quest(
    conn: &mut SqliteConnection,
    input: InsertQuestInput<'_>,
) -> Result<Quest, RewardError> {
    let id = Uuid::new_v4().to_string();
    let now = current_timestamp();

    let new_quest = NewQuest {
        id: &id,
        user_id: input.user_id,
        quest_type: input.quest_type,
        title: input.title,
        description: input.description,
        target_amount: input.target_amount,
        current_amount: 0,
        reward: input.reward,
        is_completed: 0,
        is_claimed: 0,
        expires_at: input.expires_at,
        created_at: &now,
    };

    diesel::insert_into(quests::table)
        .values(&new_quest)
        .execute(conn)?;

    quests::table
        .filter(quests::id.eq(&id))
        .first(conn)
        .map_err(RewardError::from)
}

/// Atomically add `delta` to a quest's progress.
///
/// Guarded against claimed rows so claim stays terminal even if the quest is
/// somehow re-triggered. Returns whether a row was updated.
pub fn increment_progress(
    conn: &mut SqliteConnection,
    quest_id: &str,
    delta: i32,
) -> Result<bool, RewardError> {
    let updated = diesel::update(
        quests::table
            .filter(quests::id.eq(quest_id))
            .filter(quests::is_claimed.eq(0)),
    )
    .set(quests::current_amount.eq(quests::current_amount + delta))
    .execute(conn)?;

    Ok(updated > 0)
}

/// Promote `is_completed` once progress has reached the target.
///
/// Completion is monotonic: the flag is only ever set, never cleared.
pub fn promote_completion(conn: &mut SqliteConnection, quest_id: &str) -> Result<bool, RewardError> {
    let updated = diesel::update(
        quests::table
            .filter(quests::id.eq(quest_id))
            .filter(quests::is_completed.eq(0))
            .filter(quests::current_amount.ge(quests::target_amount)),
    )
    .set(quests::is_completed.eq(1))
    .execute(conn)?;

    Ok(updated > 0)
}

/// Flip `is_claimed`, guarded so at most one concurrent claimer wins
pub fn mark_claimed(conn: &mut SqliteConnection, quest_id: &str) -> Result<bool, RewardError> {
    let updated = diesel::update(
        quests::table
            .filter(quests::id.eq(quest_id))
            .filter(quests::is_claimed.eq(0)),
    )
    .set(quests::is_claimed.eq(1))
    .execute(conn)?;

    Ok(updated > 0)
}

/// Delete all quests whose `expires_at` has passed, any state
pub fn delete_expired(conn: &mut SqliteConnection, now: &str) -> Result<usize, RewardError> {
    diesel::delete(quests::table.filter(quests::expires_at.le(now)))
        .execute(conn)
        .map_err(RewardError::from)
}
