//! SQLite ledger module for reward-progression state
//!
//! All durable state lives here: coin balances, quests, achievement
//! progress, the shop catalog, and inventory. The engines in `services/`
//! hold no state between calls; every operation reads current rows,
//! decides, and writes back inside one transaction.
//!
//! ## Tables
//!
//! - `users` - identity, coin balance, selected cosmetic slots
//! - `quests` - per-user daily quest instances
//! - `achievements` / `user_achievements` - catalog and unlock progress
//! - `shop_items` / `inventory` - catalog and ownership
//! - `action_counts` - lifetime counters feeding achievement criteria

pub mod achievements;
pub mod models;
pub mod quests;
pub mod schema;
pub mod shop;
pub mod users;

use std::path::Path;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use tracing::{debug, info};

use crate::error::RewardError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Applied to every pooled connection before first use
#[derive(Debug)]
struct LedgerConnectionCustomizer;

impl diesel::r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error>
    for LedgerConnectionCustomizer
{
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        // WAL for concurrent readers, busy_timeout so writers queue instead
        // of failing immediately under contention
        conn.batch_execute(
            "PRAGMA journal_mode = WAL; \
             PRAGMA synchronous = NORMAL; \
             PRAGMA busy_timeout = 5000; \
             PRAGMA foreign_keys = ON;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Pooled SQLite database for the reward ledger
pub struct LedgerDb {
    pool: DbPool,
}

impl LedgerDb {
    /// Open or create the ledger database under `storage_dir`
    pub fn open(storage_dir: &Path) -> Result<Self, RewardError> {
        std::fs::create_dir_all(storage_dir)?;
        let db_path = storage_dir.join("ledger.db");
        info!("Opening ledger database at {:?}", db_path);

        let manager = ConnectionManager::<SqliteConnection>::new(db_path.to_string_lossy());
        let pool = Pool::builder()
            .max_size(8)
            .connection_customizer(Box::new(LedgerConnectionCustomizer))
            .build(manager)?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    ///
    /// Pool size is pinned to 1: each in-memory connection would otherwise
    /// see its own empty database.
    pub fn open_in_memory() -> Result<Self, RewardError> {
        debug!("Opening in-memory ledger database");

        let manager = ConnectionManager::<SqliteConnection>::new(":memory:");
        let pool = Pool::builder()
            .max_size(1)
            .connection_customizer(Box::new(LedgerConnectionCustomizer))
            .build(manager)?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), RewardError> {
        let mut conn = self.conn()?;
        schema::init_schema(&mut conn)
    }

    /// Get a pooled connection
    pub fn conn(&self) -> Result<DbConn, RewardError> {
        self.pool.get().map_err(RewardError::from)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<LedgerStats, RewardError> {
        let mut conn = self.conn()?;

        let user_count: i64 = schema::users::table.count().get_result(&mut conn)?;
        let quest_count: i64 = schema::quests::table.count().get_result(&mut conn)?;
        let achievement_count: i64 = schema::achievements::table.count().get_result(&mut conn)?;
        let unlocked_count: i64 = schema::user_achievements::table
            .filter(schema::user_achievements::is_unlocked.eq(1))
            .count()
            .get_result(&mut conn)?;
        let inventory_count: i64 = schema::inventory::table.count().get_result(&mut conn)?;

        Ok(LedgerStats {
            user_count: user_count as u64,
            quest_count: quest_count as u64,
            achievement_count: achievement_count as u64,
            unlocked_count: unlocked_count as u64,
            inventory_count: inventory_count as u64,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct LedgerStats {
    pub user_count: u64,
    pub quest_count: u64,
    pub achievement_count: u64,
    pub unlocked_count: u64,
    pub inventory_count: u64,
}

// Re-exports
pub use models::{
    Achievement, ActionCount, InventoryItem, InventoryItemDetail, Quest, ShopItem, User,
    UserAchievement,
};
