//! User and lifetime-counter operations
//!
//! Coin balances are only ever mutated through the SQL-side credit/debit
//! helpers here, so concurrent engine calls never lose increments.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{current_timestamp, item_types, roles, ActionCount, NewUser, User};
use super::schema::{action_counts, users};
use crate::error::RewardError;

/// Input for creating a user (first authentication)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    #[serde(default)]
    pub id: Option<String>,
    pub username: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    roles::MEMBER.to_string()
}

/// Balance after a credit or debit
#[derive(Debug, Clone, Serialize)]
pub struct BalanceChange {
    pub user_id: String,
    pub amount: i32,
    pub balance: i32,
}

// ============================================================================
// Read Operations
// ============================================================================

/// Get a user by ID
pub fn get_user(conn: &mut SqliteConnection, id: &str) -> Result<Option<User>, RewardError> {
    users::table
        .filter(users::id.eq(id))
        .first(conn)
        .optional()
        .map_err(RewardError::from)
}

/// Get a user by ID, failing when absent
pub fn get_user_required(conn: &mut SqliteConnection, id: &str) -> Result<User, RewardError> {
    get_user(conn, id)?.ok_or_else(|| RewardError::NotFound(format!("user {}", id)))
}

/// Current coin balance for a user
pub fn get_balance(conn: &mut SqliteConnection, user_id: &str) -> Result<i32, RewardError> {
    users::table
        .filter(users::id.eq(user_id))
        .select(users::coins)
        .first(conn)
        .optional()?
        .ok_or_else(|| RewardError::NotFound(format!("user {}", user_id)))
}

// ============================================================================
// Write Operations
// ============================================================================

/// Create a user row
pub fn create_user(conn: &mut SqliteConnection, input: CreateUserInput) -> Result<User, RewardError> {
    if input.username.trim().is_empty() {
        return Err(RewardError::InvalidInput("username is required".into()));
    }
    if !roles::is_valid(&input.role) {
        return Err(RewardError::InvalidInput(format!(
            "Invalid role: {}. Valid roles: {:?}",
            input.role,
            roles::ALL
        )));
    }

    let id = input.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let now = current_timestamp();

    let new_user = NewUser {
        id: &id,
        username: &input.username,
        role: &input.role,
        coins: 0,
        created_at: &now,
        updated_at: &now,
    };

    diesel::insert_into(users::table)
        .values(&new_user)
        .execute(conn)?;

    get_user_required(conn, &id)
}

/// Atomically add coins to a user's balance
pub fn credit_coins(
    conn: &mut SqliteConnection,
    user_id: &str,
    amount: i32,
) -> Result<BalanceChange, RewardError> {
    let updated = diesel::update(users::table.filter(users::id.eq(user_id)))
        .set((
            users::coins.eq(users::coins + amount),
            users::updated_at.eq(current_timestamp()),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(RewardError::NotFound(format!("user {}", user_id)));
    }

    Ok(BalanceChange {
        user_id: user_id.to_string(),
        amount,
        balance: get_balance(conn, user_id)?,
    })
}

/// Atomically subtract coins, guarded so the balance never goes negative.
///
/// Returns `None` when the balance is below `amount`; the caller decides
/// whether that is `InsufficientCoins` or something else.
pub fn debit_coins(
    conn: &mut SqliteConnection,
    user_id: &str,
    amount: i32,
) -> Result<Option<BalanceChange>, RewardError> {
    let updated = diesel::update(
        users::table
            .filter(users::id.eq(user_id))
            .filter(users::coins.ge(amount)),
    )
    .set((
        users::coins.eq(users::coins - amount),
        users::updated_at.eq(current_timestamp()),
    ))
    .execute(conn)?;

    if updated == 0 {
        return Ok(None);
    }

    Ok(Some(BalanceChange {
        user_id: user_id.to_string(),
        amount: -amount,
        balance: get_balance(conn, user_id)?,
    }))
}

/// Point one of the user's cosmetic slots at an inventory item id
pub fn set_selected_slot(
    conn: &mut SqliteConnection,
    user_id: &str,
    slot: &str,
    item_id: Option<&str>,
) -> Result<(), RewardError> {
    let now = current_timestamp();
    let query = users::table.filter(users::id.eq(user_id));

    let updated = match slot {
        item_types::THEME => diesel::update(query)
            .set((users::selected_theme.eq(item_id), users::updated_at.eq(&now)))
            .execute(conn)?,
        item_types::BADGE => diesel::update(query)
            .set((users::selected_badge.eq(item_id), users::updated_at.eq(&now)))
            .execute(conn)?,
        item_types::FRAME => diesel::update(query)
            .set((users::selected_frame.eq(item_id), users::updated_at.eq(&now)))
            .execute(conn)?,
        other => {
            return Err(RewardError::InvalidInput(format!(
                "Invalid slot type: {}. Valid slots: {:?}",
                other,
                item_types::ALL
            )))
        }
    };

    if updated == 0 {
        return Err(RewardError::NotFound(format!("user {}", user_id)));
    }

    Ok(())
}

// ============================================================================
// Lifetime Counters
// ============================================================================

/// Atomically increment a lifetime action counter
pub fn increment_action_count(
    conn: &mut SqliteConnection,
    user_id: &str,
    action: &str,
    delta: i32,
) -> Result<i32, RewardError> {
    diesel::insert_into(action_counts::table)
        .values(&ActionCount {
            user_id: user_id.to_string(),
            action: action.to_string(),
            count: delta,
        })
        .on_conflict((action_counts::user_id, action_counts::action))
        .do_update()
        .set(action_counts::count.eq(action_counts::count + delta))
        .execute(conn)?;

    get_action_count(conn, user_id, action)
}

/// Current value of one lifetime counter (0 when never incremented)
pub fn get_action_count(
    conn: &mut SqliteConnection,
    user_id: &str,
    action: &str,
) -> Result<i32, RewardError> {
    let count: Option<i32> = action_counts::table
        .filter(action_counts::user_id.eq(user_id))
        .filter(action_counts::action.eq(action))
        .select(action_counts::count)
        .first(conn)
        .optional()?;

    Ok(count.unwrap_or(0))
}

/// All lifetime counters for a user
pub fn get_action_counts(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<ActionCount>, RewardError> {
    action_counts::table
        .filter(action_counts::user_id.eq(user_id))
        .order(action_counts::action.asc())
        .load(conn)
        .map_err(RewardError::from)
}
