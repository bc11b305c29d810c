//! Service layer for reward-ledger
//!
//! Services encapsulate the reward business logic between the caller
//! (HTTP handlers, schedulers, action dispatch) and the repositories.
//! Each service wraps database operations with:
//! - Input validation
//! - Transaction boundaries
//! - Event emission for notifications/audit
//!
//! ## Architecture
//!
//! ```text
//! Action handlers / HTTP (external)
//!     ↓
//! Service Layer (quest, achievement, shop engines)
//!     ↓
//! Repository Layer (db/*.rs)
//!     ↓
//! SQLite Ledger
//! ```

pub mod achievement_service;
pub mod dispatch;
pub mod events;
pub mod quest_service;
pub mod shop_service;

// Re-exports
pub use achievement_service::{AchievementService, UnlockOutcome, UserAchievementView};
pub use dispatch::{ActionDispatcher, ActionOutcome, UserAction};
pub use events::{EventBus, EventListener, RewardEvent};
pub use quest_service::{ClaimOutcome, QuestService};
pub use shop_service::{CosmeticSelection, PurchaseOutcome, ShopService};

use std::sync::Arc;

use crate::config::RewardConfig;
use crate::db::{achievements, shop, LedgerDb};
use crate::error::RewardError;

/// Service container for dependency injection
///
/// Holds all engines with a shared ledger and event bus.
pub struct Services {
    pub quests: Arc<QuestService>,
    pub achievements: Arc<AchievementService>,
    pub shop: Arc<ShopService>,
    pub dispatch: Arc<ActionDispatcher>,
    pub events: Arc<EventBus>,
}

impl Services {
    /// Create all engines over a shared ledger, seeding the achievement and
    /// shop catalogs from config.
    pub fn new(db: Arc<LedgerDb>, config: RewardConfig) -> Result<Self, RewardError> {
        let config = Arc::new(config);
        let events = Arc::new(EventBus::new());

        {
            let mut conn = db.conn()?;
            achievements::seed_achievements(&mut conn, &config.achievement_catalog)?;
            shop::seed_items(&mut conn, &config.shop_catalog)?;
        }

        let quests = Arc::new(QuestService::new(
            db.clone(),
            config.clone(),
            events.clone(),
        ));
        let achievements = Arc::new(AchievementService::new(db.clone(), events.clone()));
        let shop = Arc::new(ShopService::new(db.clone(), events.clone()));
        let dispatch = Arc::new(ActionDispatcher::new(
            db.clone(),
            quests.clone(),
            achievements.clone(),
        ));

        Ok(Self {
            quests,
            achievements,
            shop,
            dispatch,
            events,
        })
    }
}
