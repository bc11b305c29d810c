//! Shop & inventory engine - purchases and cosmetic slot activation
//!
//! A purchase is one transaction: guarded coin debit plus inventory insert,
//! so a concurrent reader never sees coins gone without the item (or the
//! reverse). Activation enforces the single-active-item-per-slot invariant
//! for both the shop path and the profile-update path.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::models::item_types;
use crate::db::{shop, users, InventoryItem, InventoryItemDetail, LedgerDb, ShopItem, User};
use crate::error::RewardError;

use super::events::{EventBus, RewardEvent};

/// Result of a successful purchase
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOutcome {
    pub balance: i32,
    pub inventory: InventoryItem,
}

/// Profile-update cosmetic selections; `None` leaves a slot untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CosmeticSelection {
    #[serde(default)]
    pub selected_theme: Option<String>,
    #[serde(default)]
    pub selected_badge: Option<String>,
    #[serde(default)]
    pub selected_frame: Option<String>,
}

/// Shop & inventory engine
pub struct ShopService {
    db: Arc<LedgerDb>,
    events: Arc<EventBus>,
}

impl ShopService {
    pub fn new(db: Arc<LedgerDb>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// Full shop catalog
    pub fn get_all_items(&self) -> Result<Vec<ShopItem>, RewardError> {
        let mut conn = self.db.conn()?;
        shop::list_items(&mut conn)
    }

    /// Whether the user owns an item
    pub fn has_item(&self, user_id: &str, item_id: &str) -> Result<bool, RewardError> {
        let mut conn = self.db.conn()?;
        shop::has_item(&mut conn, user_id, item_id)
    }

    /// The user's inventory joined with catalog detail
    pub fn get_user_inventory(
        &self,
        user_id: &str,
    ) -> Result<Vec<InventoryItemDetail>, RewardError> {
        let mut conn = self.db.conn()?;
        shop::list_inventory(&mut conn, user_id)
    }

    /// Buy a catalog item: debit its price and insert an inactive inventory
    /// row, atomically.
    ///
    /// Duplicate purchases are rejected with `Conflict`, not ignored; the
    /// UNIQUE(user, item) index backstops the check under concurrency.
    pub fn purchase_item(
        &self,
        user_id: &str,
        item_id: &str,
    ) -> Result<PurchaseOutcome, RewardError> {
        let mut conn = self.db.conn()?;

        let (outcome, price) = conn.immediate_transaction(|conn| {
            let item = shop::get_item(conn, item_id)?
                .ok_or_else(|| RewardError::NotFound(format!("shop item {}", item_id)))?;

            let user = users::get_user_required(conn, user_id)?;

            if shop::has_item(conn, user_id, item_id)? {
                return Err(RewardError::Conflict(format!(
                    "item {} already owned",
                    item_id
                )));
            }

            let change = users::debit_coins(conn, user_id, item.price)?.ok_or(
                RewardError::InsufficientCoins {
                    required: item.price,
                    available: user.coins,
                },
            )?;

            let inventory = shop::insert_inventory_item(conn, user_id, item_id)?;

            let outcome = PurchaseOutcome {
                balance: change.balance,
                inventory,
            };
            Ok::<_, RewardError>((outcome, item.price))
        })?;

        info!(
            user = %user_id,
            item = %item_id,
            balance = outcome.balance,
            "Item purchased"
        );
        self.events.emit(RewardEvent::ItemPurchased {
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            price,
            balance: outcome.balance,
        });

        Ok(outcome)
    }

    /// Activate an owned item for its cosmetic slot.
    ///
    /// Deactivates every other item of the same slot type and points the
    /// user's `selected_*` column at this item, atomically.
    pub fn activate_item(
        &self,
        user_id: &str,
        item_id: &str,
    ) -> Result<InventoryItemDetail, RewardError> {
        let mut conn = self.db.conn()?;

        let detail = conn.immediate_transaction(|conn| {
            let owned = shop::get_owned_item(conn, user_id, item_id)?
                .ok_or_else(|| RewardError::NotOwned(format!("item {}", item_id)))?;

            shop::deactivate_slot(conn, user_id, &owned.item.item_type)?;
            shop::activate_inventory_item(conn, user_id, item_id)?;
            users::set_selected_slot(conn, user_id, &owned.item.item_type, Some(item_id))?;

            shop::get_owned_item(conn, user_id, item_id)?
                .ok_or_else(|| RewardError::Internal("Failed to retrieve activated item".into()))
        })?;

        debug!(
            user = %user_id,
            item = %item_id,
            slot = %detail.item.item_type,
            "Item activated"
        );
        self.events.emit(RewardEvent::ItemActivated {
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            item_type: detail.item.item_type.clone(),
        });

        Ok(detail)
    }

    /// Apply cosmetic selections coming from a profile update.
    ///
    /// Each named item must be in the user's inventory (`NotFound`
    /// otherwise) and match its slot type. The whole update is one
    /// transaction: every named slot is validated before any slot is
    /// touched, so a rejected selection changes nothing.
    pub fn update_selected_cosmetics(
        &self,
        user_id: &str,
        selection: CosmeticSelection,
    ) -> Result<User, RewardError> {
        let slots = [
            (item_types::THEME, selection.selected_theme),
            (item_types::BADGE, selection.selected_badge),
            (item_types::FRAME, selection.selected_frame),
        ];

        let mut conn = self.db.conn()?;
        let (user, applied) = conn.immediate_transaction(|conn| {
            let mut wanted = Vec::new();
            for (slot, item_id) in slots {
                let Some(item_id) = item_id else { continue };

                let detail = shop::get_owned_item(conn, user_id, &item_id)?.ok_or_else(|| {
                    RewardError::NotFound(format!("item {} not found in inventory", item_id))
                })?;
                if detail.item.item_type != slot {
                    return Err(RewardError::InvalidInput(format!(
                        "item {} is a {}, not a {}",
                        item_id, detail.item.item_type, slot
                    )));
                }
                wanted.push((slot, item_id));
            }

            for (slot, item_id) in &wanted {
                shop::deactivate_slot(conn, user_id, slot)?;
                shop::activate_inventory_item(conn, user_id, item_id)?;
                users::set_selected_slot(conn, user_id, slot, Some(item_id.as_str()))?;
            }

            let user = users::get_user_required(conn, user_id)?;
            Ok::<_, RewardError>((user, wanted))
        })?;

        for (slot, item_id) in &applied {
            debug!(user = %user_id, item = %item_id, slot = %slot, "Item activated");
            self.events.emit(RewardEvent::ItemActivated {
                user_id: user_id.to_string(),
                item_id: item_id.clone(),
                item_type: slot.to_string(),
            });
        }

        Ok(user)
    }
}
