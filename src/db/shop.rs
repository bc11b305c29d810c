//! Shop catalog and inventory operations
//!
//! UNIQUE(user_id, item_id) backstops duplicate purchases; the
//! single-active-item-per-slot invariant is enforced by deactivating the
//! whole slot before activating one row, inside the caller's transaction.

use diesel::prelude::*;
use uuid::Uuid;

use super::models::{
    current_timestamp, item_types, InventoryItem, InventoryItemDetail, NewInventoryItem,
    NewShopItem, ShopItem,
};
use super::schema::{inventory, shop_items};
use crate::config::ShopItemSpec;
use crate::error::RewardError;

// ============================================================================
// Catalog
// ============================================================================

/// Seed the shop catalog; existing ids are left untouched
pub fn seed_items(
    conn: &mut SqliteConnection,
    specs: &[ShopItemSpec],
) -> Result<usize, RewardError> {
    let now = current_timestamp();
    let mut inserted = 0;

    for spec in specs {
        if !item_types::is_valid(&spec.item_type) {
            return Err(RewardError::InvalidInput(format!(
                "Invalid item type: {}. Valid types: {:?}",
                spec.item_type,
                item_types::ALL
            )));
        }
        if spec.price < 0 {
            return Err(RewardError::InvalidInput(format!(
                "price must be >= 0 for {}",
                spec.id
            )));
        }

        let row = NewShopItem {
            id: &spec.id,
            name: &spec.name,
            description: spec.description.as_deref(),
            item_type: &spec.item_type,
            price: spec.price,
            image_url: spec.image_url.as_deref(),
            created_at: &now,
        };

        inserted += diesel::insert_or_ignore_into(shop_items::table)
            .values(&row)
            .execute(conn)?;
    }

    Ok(inserted)
}

/// Full shop catalog
pub fn list_items(conn: &mut SqliteConnection) -> Result<Vec<ShopItem>, RewardError> {
    shop_items::table
        .order(shop_items::created_at.asc())
        .load(conn)
        .map_err(RewardError::from)
}

/// Get one catalog item
pub fn get_item(conn: &mut SqliteConnection, id: &str) -> Result<Option<ShopItem>, RewardError> {
    shop_items::table
        .filter(shop_items::id.eq(id))
        .first(conn)
        .optional()
        .map_err(RewardError::from)
}

// ============================================================================
// Inventory
// ============================================================================

/// Whether the user owns a catalog item
pub fn has_item(
    conn: &mut SqliteConnection,
    user_id: &str,
    item_id: &str,
) -> Result<bool, RewardError> {
    let count: i64 = inventory::table
        .filter(inventory::user_id.eq(user_id))
        .filter(inventory::item_id.eq(item_id))
        .count()
        .get_result(conn)?;

    Ok(count > 0)
}

/// The user's inventory row for one item, joined with catalog detail
pub fn get_owned_item(
    conn: &mut SqliteConnection,
    user_id: &str,
    item_id: &str,
) -> Result<Option<InventoryItemDetail>, RewardError> {
    let row: Option<(InventoryItem, ShopItem)> = inventory::table
        .inner_join(shop_items::table)
        .filter(inventory::user_id.eq(user_id))
        .filter(inventory::item_id.eq(item_id))
        .select((InventoryItem::as_select(), ShopItem::as_select()))
        .first(conn)
        .optional()?;

    Ok(row.map(|(inv, item)| InventoryItemDetail {
        inventory: inv,
        item,
    }))
}

/// All inventory rows for a user, joined with catalog detail
pub fn list_inventory(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<InventoryItemDetail>, RewardError> {
    let rows: Vec<(InventoryItem, ShopItem)> = inventory::table
        .inner_join(shop_items::table)
        .filter(inventory::user_id.eq(user_id))
        .order(inventory::purchased_at.desc())
        .select((InventoryItem::as_select(), ShopItem::as_select()))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(inv, item)| InventoryItemDetail {
            inventory: inv,
            item,
        })
        .collect())
}

/// Insert an ownership row (inactive). Duplicate ownership surfaces as a
/// UNIQUE violation, mapped to `Conflict` by the error layer.
pub fn insert_inventory_item(
    conn: &mut SqliteConnection,
    user_id: &str,
    item_id: &str,
) -> Result<InventoryItem, RewardError> {
    let id = Uuid::new_v4().to_string();
    let now = current_timestamp();

    diesel::insert_into(inventory::table)
        .values(&NewInventoryItem {
            id: &id,
            user_id,
            item_id,
            is_active: 0,
            purchased_at: &now,
        })
        .execute(conn)?;

    inventory::table
        .filter(inventory::id.eq(&id))
        .first(conn)
        .map_err(RewardError::from)
}

/// Deactivate every inventory item of one slot type for a user
pub fn deactivate_slot(
    conn: &mut SqliteConnection,
    user_id: &str,
    item_type: &str,
) -> Result<usize, RewardError> {
    let slot_item_ids: Vec<String> = shop_items::table
        .filter(shop_items::item_type.eq(item_type))
        .select(shop_items::id)
        .load(conn)?;

    diesel::update(
        inventory::table
            .filter(inventory::user_id.eq(user_id))
            .filter(inventory::is_active.eq(1))
            .filter(inventory::item_id.eq_any(slot_item_ids)),
    )
    .set(inventory::is_active.eq(0))
    .execute(conn)
    .map_err(RewardError::from)
}

/// Mark one owned item active
pub fn activate_inventory_item(
    conn: &mut SqliteConnection,
    user_id: &str,
    item_id: &str,
) -> Result<bool, RewardError> {
    let updated = diesel::update(
        inventory::table
            .filter(inventory::user_id.eq(user_id))
            .filter(inventory::item_id.eq(item_id)),
    )
    .set(inventory::is_active.eq(1))
    .execute(conn)?;

    Ok(updated > 0)
}
