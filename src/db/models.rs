//! Diesel model definitions for ledger tables
//!
//! - Queryable structs: for SELECT queries (reading data)
//! - Insertable structs: for INSERT queries (writing data)
//!
//! SQLite stores booleans as INTEGER (0/1) and timestamps as ISO-8601 TEXT.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::schema::*;

// ============================================================================
// Timestamp Helpers (SQLite stores timestamps as TEXT)
// ============================================================================

/// Get current UTC timestamp as ISO 8601 string for SQLite TEXT columns
pub fn current_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Timestamp a number of hours from now, same format as `current_timestamp`
pub fn timestamp_in_hours(hours: i64) -> String {
    (chrono::Utc::now() + chrono::Duration::hours(hours))
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

/// Whether a stored expiry timestamp has passed, boundary inclusive:
/// a row is live only while `expires_at > now`, matching the liveness
/// filters and the expiry sweep.
///
/// The fixed-width format makes lexicographic comparison equivalent to
/// chronological comparison.
pub fn is_past(timestamp: &str) -> bool {
    timestamp <= current_timestamp().as_str()
}

// ============================================================================
// Vocabularies
// ============================================================================

/// User roles
pub mod roles {
    pub const MEMBER: &str = "member";
    pub const MODERATOR: &str = "moderator";
    pub const ADMIN: &str = "admin";

    pub const ALL: [&str; 3] = [MEMBER, MODERATOR, ADMIN];

    pub fn is_valid(role: &str) -> bool {
        ALL.contains(&role)
    }
}

/// Cosmetic slot types for shop items
pub mod item_types {
    pub const THEME: &str = "theme";
    pub const BADGE: &str = "badge";
    pub const FRAME: &str = "frame";

    pub const ALL: [&str; 3] = [THEME, BADGE, FRAME];

    pub fn is_valid(item_type: &str) -> bool {
        ALL.contains(&item_type)
    }
}

/// Achievement criteria types, each backed by a lifetime action counter
pub mod criteria_types {
    pub const POSTS_CREATED: &str = "posts_created";
    pub const POSTS_READ: &str = "posts_read";
    pub const COMMENTS_MADE: &str = "comments_made";
    pub const FOLLOWERS_GAINED: &str = "followers_gained";
    pub const LIKES_GIVEN: &str = "likes_given";

    pub const ALL: [&str; 5] = [
        POSTS_CREATED,
        POSTS_READ,
        COMMENTS_MADE,
        FOLLOWERS_GAINED,
        LIKES_GIVEN,
    ];

    pub fn is_valid(criteria: &str) -> bool {
        ALL.contains(&criteria)
    }
}

// ============================================================================
// User Models
// ============================================================================

/// User row from SELECT query
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: String,
    pub coins: i32,
    pub selected_theme: Option<String>,
    pub selected_badge: Option<String>,
    pub selected_frame: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New user for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub role: &'a str,
    pub coins: i32,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

// ============================================================================
// Quest Models
// ============================================================================

/// Quest row from SELECT query
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = quests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Quest {
    pub id: String,
    pub user_id: String,
    pub quest_type: String,
    pub title: String,
    pub description: Option<String>,
    pub target_amount: i32,
    pub current_amount: i32,
    pub reward: i32,
    pub is_completed: i32,
    pub is_claimed: i32,
    pub expires_at: String,
    pub created_at: String,
}

/// New quest for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = quests)]
pub struct NewQuest<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub quest_type: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub target_amount: i32,
    pub current_amount: i32,
    pub reward: i32,
    pub is_completed: i32,
    pub is_claimed: i32,
    pub expires_at: &'a str,
    pub created_at: &'a str,
}

// ============================================================================
// Achievement Models
// ============================================================================

/// Achievement definition row (global catalog)
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = achievements)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub badge_id: String,
    pub coin_reward: i32,
    pub criteria_type: String,
    pub criteria_target: i32,
    pub created_at: String,
}

/// New achievement definition for INSERT (seeding)
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = achievements)]
pub struct NewAchievement<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub badge_id: &'a str,
    pub coin_reward: i32,
    pub criteria_type: &'a str,
    pub criteria_target: i32,
    pub created_at: &'a str,
}

/// Per-user achievement progress row
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = user_achievements)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserAchievement {
    pub id: String,
    pub user_id: String,
    pub achievement_id: String,
    pub current_progress: i32,
    pub is_unlocked: i32,
    pub unlocked_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New user achievement row for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_achievements)]
pub struct NewUserAchievement<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub achievement_id: &'a str,
    pub current_progress: i32,
    pub is_unlocked: i32,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

// ============================================================================
// Shop Models
// ============================================================================

/// Shop item row (global catalog)
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = shop_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ShopItem {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub item_type: String,
    pub price: i32,
    pub image_url: Option<String>,
    pub created_at: String,
}

/// New shop item for INSERT (seeding)
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shop_items)]
pub struct NewShopItem<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub item_type: &'a str,
    pub price: i32,
    pub image_url: Option<&'a str>,
    pub created_at: &'a str,
}

/// Inventory ownership row
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = inventory)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InventoryItem {
    pub id: String,
    pub user_id: String,
    pub item_id: String,
    pub is_active: i32,
    pub purchased_at: String,
}

/// New inventory row for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = inventory)]
pub struct NewInventoryItem<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub item_id: &'a str,
    pub is_active: i32,
    pub purchased_at: &'a str,
}

/// Inventory row joined with its catalog item (API response)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItemDetail {
    pub inventory: InventoryItem,
    pub item: ShopItem,
}

// ============================================================================
// Action Counter Models
// ============================================================================

/// Lifetime action counter row
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = action_counts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ActionCount {
    pub user_id: String,
    pub action: String,
    pub count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabularies() {
        assert!(roles::is_valid("member"));
        assert!(!roles::is_valid("superuser"));
        assert!(item_types::is_valid("theme"));
        assert!(!item_types::is_valid("wallpaper"));
        assert!(criteria_types::is_valid("posts_created"));
        assert!(!criteria_types::is_valid("posts_deleted"));
    }

    #[test]
    fn test_timestamp_ordering() {
        let now = current_timestamp();
        let later = timestamp_in_hours(24);
        assert!(now < later);
        assert!(!is_past(&later));
        assert!(is_past("2000-01-01T00:00:00Z"));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        // A timestamp equal to now is expired, never claimable-and-sweepable
        assert!(is_past(&current_timestamp()));
    }
}
