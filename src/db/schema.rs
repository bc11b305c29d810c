//! Database schema definitions
//!
//! Diesel table declarations plus the raw SQL that creates them. Schema is
//! versioned through a `schema_version` table so upgrades can migrate in
//! place.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_query;
use tracing::info;

use crate::error::RewardError;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

// ============================================================================
// Diesel Table Declarations
// ============================================================================

diesel::table! {
    users (id) {
        id -> Text,
        username -> Text,
        role -> Text,
        coins -> Integer,
        selected_theme -> Nullable<Text>,
        selected_badge -> Nullable<Text>,
        selected_frame -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    quests (id) {
        id -> Text,
        user_id -> Text,
        quest_type -> Text,
        title -> Text,
        description -> Nullable<Text>,
        target_amount -> Integer,
        current_amount -> Integer,
        reward -> Integer,
        is_completed -> Integer,
        is_claimed -> Integer,
        expires_at -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    achievements (id) {
        id -> Text,
        title -> Text,
        description -> Nullable<Text>,
        badge_id -> Text,
        coin_reward -> Integer,
        criteria_type -> Text,
        criteria_target -> Integer,
        created_at -> Text,
    }
}

diesel::table! {
    user_achievements (id) {
        id -> Text,
        user_id -> Text,
        achievement_id -> Text,
        current_progress -> Integer,
        is_unlocked -> Integer,
        unlocked_at -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    shop_items (id) {
        id -> Text,
        name -> Text,
        description -> Nullable<Text>,
        item_type -> Text,
        price -> Integer,
        image_url -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    inventory (id) {
        id -> Text,
        user_id -> Text,
        item_id -> Text,
        is_active -> Integer,
        purchased_at -> Text,
    }
}

diesel::table! {
    action_counts (user_id, action) {
        user_id -> Text,
        action -> Text,
        count -> Integer,
    }
}

diesel::joinable!(inventory -> shop_items (item_id));
diesel::joinable!(user_achievements -> achievements (achievement_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    quests,
    achievements,
    user_achievements,
    shop_items,
    inventory,
    action_counts,
);

// ============================================================================
// Schema Initialization
// ============================================================================

/// Initialize the database schema
pub fn init_schema(conn: &mut SqliteConnection) -> Result<(), RewardError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new ledger schema v{}", SCHEMA_VERSION);
        create_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating ledger schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    }

    Ok(())
}

#[derive(QueryableByName)]
struct VersionRow {
    #[diesel(sql_type = diesel::sql_types::Integer)]
    version: i32,
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &mut SqliteConnection) -> Result<i32, RewardError> {
    conn.batch_execute("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
        .map_err(|e| RewardError::Internal(format!("Failed to create schema_version: {}", e)))?;

    let rows: Vec<VersionRow> = sql_query("SELECT version FROM schema_version LIMIT 1")
        .load(conn)
        .map_err(|e| RewardError::Internal(format!("Failed to read schema_version: {}", e)))?;

    Ok(rows.first().map(|r| r.version).unwrap_or(0))
}

/// Set schema version
fn set_schema_version(conn: &mut SqliteConnection, version: i32) -> Result<(), RewardError> {
    conn.batch_execute(&format!(
        "DELETE FROM schema_version; INSERT INTO schema_version (version) VALUES ({});",
        version
    ))
    .map_err(|e| RewardError::Internal(format!("Failed to set schema_version: {}", e)))?;
    Ok(())
}

/// Create all tables
fn create_tables(conn: &mut SqliteConnection) -> Result<(), RewardError> {
    conn.batch_execute(LEDGER_SCHEMA)
        .map_err(|e| RewardError::Internal(format!("Failed to create ledger tables: {}", e)))?;
    Ok(())
}

/// Migrate schema from an older version
fn migrate_schema(_conn: &mut SqliteConnection, from_version: i32) -> Result<(), RewardError> {
    // No migrations yet; v1 is the first shipped schema
    Err(RewardError::Internal(format!(
        "No migration path from schema v{}",
        from_version
    )))
}

const LEDGER_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL DEFAULT 'member',
    coins INTEGER NOT NULL DEFAULT 0 CHECK (coins >= 0),
    selected_theme TEXT,
    selected_badge TEXT,
    selected_frame TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS quests (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    quest_type TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    target_amount INTEGER NOT NULL CHECK (target_amount > 0),
    current_amount INTEGER NOT NULL DEFAULT 0,
    reward INTEGER NOT NULL,
    is_completed INTEGER NOT NULL DEFAULT 0,
    is_claimed INTEGER NOT NULL DEFAULT 0,
    expires_at TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_quests_user_type ON quests(user_id, quest_type, expires_at);
CREATE INDEX IF NOT EXISTS idx_quests_expiry ON quests(expires_at);

CREATE TABLE IF NOT EXISTS achievements (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    badge_id TEXT NOT NULL,
    coin_reward INTEGER NOT NULL,
    criteria_type TEXT NOT NULL,
    criteria_target INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_achievements (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    achievement_id TEXT NOT NULL REFERENCES achievements(id),
    current_progress INTEGER NOT NULL DEFAULT 0,
    is_unlocked INTEGER NOT NULL DEFAULT 0,
    unlocked_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (user_id, achievement_id)
);

CREATE TABLE IF NOT EXISTS shop_items (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    item_type TEXT NOT NULL,
    price INTEGER NOT NULL CHECK (price >= 0),
    image_url TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS inventory (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    item_id TEXT NOT NULL REFERENCES shop_items(id),
    is_active INTEGER NOT NULL DEFAULT 0,
    purchased_at TEXT NOT NULL,
    UNIQUE (user_id, item_id)
);

CREATE INDEX IF NOT EXISTS idx_inventory_user ON inventory(user_id);

CREATE TABLE IF NOT EXISTS action_counts (
    user_id TEXT NOT NULL REFERENCES users(id),
    action TEXT NOT NULL,
    count INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, action)
);
"#;
