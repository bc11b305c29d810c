//! Integration tests for shop purchases and cosmetic slot activation

use std::sync::Arc;

use reward_ledger::config::RewardConfig;
use reward_ledger::db::users::CreateUserInput;
use reward_ledger::db::{users, LedgerDb};
use reward_ledger::error::RewardError;
use reward_ledger::services::{CosmeticSelection, Services};
use tempfile::TempDir;

fn setup() -> (Services, Arc<LedgerDb>, TempDir) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let temp = TempDir::new().unwrap();
    let db = Arc::new(LedgerDb::open(temp.path()).unwrap());
    let services = Services::new(db.clone(), RewardConfig::default()).unwrap();
    (services, db, temp)
}

fn create_user(db: &LedgerDb, username: &str) -> String {
    let mut conn = db.conn().unwrap();
    users::create_user(
        &mut conn,
        CreateUserInput {
            id: None,
            username: username.to_string(),
            role: "member".to_string(),
        },
    )
    .unwrap()
    .id
}

fn credit(db: &LedgerDb, user_id: &str, amount: i32) {
    let mut conn = db.conn().unwrap();
    users::credit_coins(&mut conn, user_id, amount).unwrap();
}

fn get_user(db: &LedgerDb, user_id: &str) -> reward_ledger::db::User {
    let mut conn = db.conn().unwrap();
    users::get_user_required(&mut conn, user_id).unwrap()
}

#[test]
fn test_catalog_is_seeded() {
    let (services, _db, _temp) = setup();

    let items = services.shop.get_all_items().unwrap();
    assert_eq!(items.len(), 4);
    assert!(items.iter().any(|i| i.id == "theme-midnight"));
}

#[test]
fn test_purchase_requires_coins() {
    let (services, db, _temp) = setup();
    let user = create_user(&db, "alice");

    // 0 coins against a 50-coin theme
    let err = services.shop.purchase_item(&user, "theme-midnight");
    assert!(matches!(
        err,
        Err(RewardError::InsufficientCoins {
            required: 50,
            available: 0
        })
    ));
    assert_eq!(get_user(&db, &user).coins, 0);
    assert!(!services.shop.has_item(&user, "theme-midnight").unwrap());
}

#[test]
fn test_purchase_debits_and_stores_inactive() {
    let (services, db, _temp) = setup();
    let user = create_user(&db, "alice");
    credit(&db, &user, 100);

    let outcome = services.shop.purchase_item(&user, "theme-midnight").unwrap();
    assert_eq!(outcome.balance, 50);
    assert_eq!(outcome.inventory.item_id, "theme-midnight");
    assert_eq!(outcome.inventory.is_active, 0);

    assert!(services.shop.has_item(&user, "theme-midnight").unwrap());
    let inventory = services.shop.get_user_inventory(&user).unwrap();
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].item.name, "Midnight Theme");
}

#[test]
fn test_duplicate_purchase_is_conflict() {
    let (services, db, _temp) = setup();
    let user = create_user(&db, "alice");
    credit(&db, &user, 200);

    services.shop.purchase_item(&user, "theme-midnight").unwrap();
    assert!(matches!(
        services.shop.purchase_item(&user, "theme-midnight"),
        Err(RewardError::Conflict(_))
    ));

    // Nothing debited the second time
    assert_eq!(get_user(&db, &user).coins, 150);
}

#[test]
fn test_purchase_unknown_item() {
    let (services, db, _temp) = setup();
    let user = create_user(&db, "alice");

    assert!(matches!(
        services.shop.purchase_item(&user, "no-such-item"),
        Err(RewardError::NotFound(_))
    ));
}

#[test]
fn test_activation_enforces_single_active_per_slot() {
    let (services, db, _temp) = setup();
    let user = create_user(&db, "alice");
    credit(&db, &user, 200);

    services.shop.purchase_item(&user, "theme-midnight").unwrap();
    services.shop.purchase_item(&user, "theme-sepia").unwrap();

    services.shop.activate_item(&user, "theme-midnight").unwrap();
    let detail = services.shop.activate_item(&user, "theme-sepia").unwrap();
    assert_eq!(detail.inventory.is_active, 1);

    let inventory = services.shop.get_user_inventory(&user).unwrap();
    let midnight = inventory
        .iter()
        .find(|d| d.item.id == "theme-midnight")
        .unwrap();
    let sepia = inventory.iter().find(|d| d.item.id == "theme-sepia").unwrap();
    assert_eq!(midnight.inventory.is_active, 0);
    assert_eq!(sepia.inventory.is_active, 1);

    assert_eq!(
        get_user(&db, &user).selected_theme.as_deref(),
        Some("theme-sepia")
    );
}

#[test]
fn test_activation_leaves_other_slots_alone() {
    let (services, db, _temp) = setup();
    let user = create_user(&db, "alice");
    credit(&db, &user, 500);

    services.shop.purchase_item(&user, "theme-midnight").unwrap();
    services.shop.purchase_item(&user, "badge-gold-quill").unwrap();

    services.shop.activate_item(&user, "theme-midnight").unwrap();
    services.shop.activate_item(&user, "badge-gold-quill").unwrap();

    let inventory = services.shop.get_user_inventory(&user).unwrap();
    assert!(inventory.iter().all(|d| d.inventory.is_active == 1));

    let row = get_user(&db, &user);
    assert_eq!(row.selected_theme.as_deref(), Some("theme-midnight"));
    assert_eq!(row.selected_badge.as_deref(), Some("badge-gold-quill"));
    assert_eq!(row.selected_frame, None);
}

#[test]
fn test_activate_unowned_item() {
    let (services, db, _temp) = setup();
    let user = create_user(&db, "alice");

    assert!(matches!(
        services.shop.activate_item(&user, "theme-midnight"),
        Err(RewardError::NotOwned(_))
    ));
}

#[test]
fn test_profile_selection_validates_inventory() {
    let (services, db, _temp) = setup();
    let user = create_user(&db, "alice");
    credit(&db, &user, 100);
    services.shop.purchase_item(&user, "theme-midnight").unwrap();

    // Naming an unowned item fails before anything is applied
    let err = services.shop.update_selected_cosmetics(
        &user,
        CosmeticSelection {
            selected_theme: Some("theme-sepia".into()),
            ..Default::default()
        },
    );
    assert!(matches!(err, Err(RewardError::NotFound(_))));
    assert_eq!(get_user(&db, &user).selected_theme, None);

    // An owned item goes through the same activation path as the shop
    let updated = services
        .shop
        .update_selected_cosmetics(
            &user,
            CosmeticSelection {
                selected_theme: Some("theme-midnight".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.selected_theme.as_deref(), Some("theme-midnight"));

    let inventory = services.shop.get_user_inventory(&user).unwrap();
    assert_eq!(inventory[0].inventory.is_active, 1);
}

#[test]
fn test_profile_selection_is_all_or_nothing() {
    let (services, db, _temp) = setup();
    let user = create_user(&db, "alice");
    credit(&db, &user, 100);
    services.shop.purchase_item(&user, "theme-midnight").unwrap();

    // An owned theme alongside an unowned badge: the rejection must leave
    // every slot untouched, including the valid one
    let err = services.shop.update_selected_cosmetics(
        &user,
        CosmeticSelection {
            selected_theme: Some("theme-midnight".into()),
            selected_badge: Some("badge-gold-quill".into()),
            ..Default::default()
        },
    );
    assert!(matches!(err, Err(RewardError::NotFound(_))));

    let row = get_user(&db, &user);
    assert_eq!(row.selected_theme, None);
    assert_eq!(row.selected_badge, None);

    let inventory = services.shop.get_user_inventory(&user).unwrap();
    assert!(inventory.iter().all(|d| d.inventory.is_active == 0));
}

#[test]
fn test_profile_selection_applies_multiple_slots() {
    let (services, db, _temp) = setup();
    let user = create_user(&db, "alice");
    credit(&db, &user, 200);
    services.shop.purchase_item(&user, "theme-midnight").unwrap();
    services.shop.purchase_item(&user, "badge-gold-quill").unwrap();

    let updated = services
        .shop
        .update_selected_cosmetics(
            &user,
            CosmeticSelection {
                selected_theme: Some("theme-midnight".into()),
                selected_badge: Some("badge-gold-quill".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.selected_theme.as_deref(), Some("theme-midnight"));
    assert_eq!(updated.selected_badge.as_deref(), Some("badge-gold-quill"));

    let inventory = services.shop.get_user_inventory(&user).unwrap();
    assert!(inventory.iter().all(|d| d.inventory.is_active == 1));
}

#[test]
fn test_profile_selection_rejects_wrong_slot() {
    let (services, db, _temp) = setup();
    let user = create_user(&db, "alice");
    credit(&db, &user, 200);
    services.shop.purchase_item(&user, "badge-gold-quill").unwrap();

    // Owned, but a badge cannot fill the theme slot
    let err = services.shop.update_selected_cosmetics(
        &user,
        CosmeticSelection {
            selected_theme: Some("badge-gold-quill".into()),
            ..Default::default()
        },
    );
    assert!(matches!(err, Err(RewardError::InvalidInput(_))));
}

/// The concrete end-to-end scenario: broke user fails, funded user buys,
/// activation selects the theme.
#[test]
fn test_purchase_and_activate_scenario() {
    let (services, db, _temp) = setup();
    let user = create_user(&db, "alice");

    assert!(matches!(
        services.shop.purchase_item(&user, "theme-midnight"),
        Err(RewardError::InsufficientCoins { .. })
    ));

    credit(&db, &user, 100);
    let outcome = services.shop.purchase_item(&user, "theme-midnight").unwrap();
    assert_eq!(outcome.balance, 50);
    assert_eq!(outcome.inventory.is_active, 0);

    services.shop.activate_item(&user, "theme-midnight").unwrap();
    assert_eq!(
        get_user(&db, &user).selected_theme.as_deref(),
        Some("theme-midnight")
    );
}
