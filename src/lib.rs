//! Reward Ledger - reward-progression core for a gamified knowledge platform
//!
//! Users earn coins by completing daily quests and unlocking achievements,
//! then spend them on cosmetic shop items (themes, badges, frames). This
//! crate owns that whole loop; everything else (routing, auth, notification
//! delivery, file storage) is an external collaborator.
//!
//! ## Architecture
//!
//! - **Ledger Store** (`db/`): pooled SQLite via Diesel; owns every
//!   persisted row (balances, quests, achievement progress, inventory)
//! - **Quest Engine**: generate / progress / claim / sweep daily quests
//! - **Achievement Engine**: recompute lifetime progress, unlock once,
//!   pay out automatically
//! - **Shop & Inventory Engine**: purchases and single-active-per-slot
//!   cosmetic activation
//! - **Action Dispatch**: one entry point for post/comment/like/follow
//!   handlers to report progress-relevant actions
//!
//! Engines hold no in-memory state between calls: every operation reads
//! current rows, decides, and writes back in one transaction, so any number
//! of concurrent requests stay consistent.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use reward_ledger::{config::RewardConfig, db::LedgerDb, services::Services};
//!
//! # fn main() -> Result<(), reward_ledger::RewardError> {
//! let config = RewardConfig::default();
//! let db = Arc::new(LedgerDb::open(&config.storage_dir)?);
//! let services = Services::new(db, config)?;
//!
//! let quests = services.quests.generate_daily_quests("user-1")?;
//! assert_eq!(quests.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod services;

// Re-exports
pub use config::RewardConfig;
pub use db::{LedgerDb, LedgerStats};
pub use error::RewardError;
pub use services::{
    AchievementService, ActionDispatcher, EventBus, QuestService, RewardEvent, Services,
    ShopService, UserAction,
};
