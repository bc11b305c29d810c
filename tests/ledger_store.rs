//! Integration tests for the ledger store itself: balances, counters,
//! stats, and claim-vs-sweep interaction.

use std::sync::Arc;

use reward_ledger::config::RewardConfig;
use reward_ledger::db::users::CreateUserInput;
use reward_ledger::db::{users, LedgerDb};
use reward_ledger::error::RewardError;
use reward_ledger::services::Services;
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

#[test]
fn test_open_reuses_existing_database() {
    let temp = TempDir::new().unwrap();
    let user_id;
    {
        let db = LedgerDb::open(temp.path()).unwrap();
        user_id = create_user(&db, "alice");
    }

    // Re-opening sees the same rows and does not re-run schema creation
    let db = LedgerDb::open(temp.path()).unwrap();
    let mut conn = db.conn().unwrap();
    let user = users::get_user_required(&mut conn, &user_id).unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.role, "member");
    assert_eq!(user.coins, 0);
}

#[test]
fn test_create_user_validation() {
    let (_services, db, _temp) = setup();
    let mut conn = db.conn().unwrap();

    assert!(matches!(
        users::create_user(
            &mut conn,
            CreateUserInput {
                id: None,
                username: "".into(),
                role: "member".into(),
            },
        ),
        Err(RewardError::InvalidInput(_))
    ));

    assert!(matches!(
        users::create_user(
            &mut conn,
            CreateUserInput {
                id: None,
                username: "bob".into(),
                role: "superuser".into(),
            },
        ),
        Err(RewardError::InvalidInput(_))
    ));

    // Duplicate username surfaces as a conflict
    users::create_user(
        &mut conn,
        CreateUserInput {
            id: None,
            username: "carol".into(),
            role: "member".into(),
        },
    )
    .unwrap();
    assert!(matches!(
        users::create_user(
            &mut conn,
            CreateUserInput {
                id: None,
                username: "carol".into(),
                role: "member".into(),
            },
        ),
        Err(RewardError::Conflict(_))
    ));
}

#[test]
fn test_debit_never_goes_negative() {
    let (_services, db, _temp) = setup();
    let user = create_user(&db, "alice");
    let mut conn = db.conn().unwrap();

    users::credit_coins(&mut conn, &user, 30).unwrap();

    // Guarded debit refuses rather than underflowing
    assert!(users::debit_coins(&mut conn, &user, 50).unwrap().is_none());
    assert_eq!(users::get_balance(&mut conn, &user).unwrap(), 30);

    let change = users::debit_coins(&mut conn, &user, 30).unwrap().unwrap();
    assert_eq!(change.balance, 0);
}

#[test]
fn test_credit_unknown_user() {
    let (_services, db, _temp) = setup();
    let mut conn = db.conn().unwrap();

    assert!(matches!(
        users::credit_coins(&mut conn, "nobody", 10),
        Err(RewardError::NotFound(_))
    ));
}

#[test]
fn test_action_counters_accumulate() {
    let (_services, db, _temp) = setup();
    let user = create_user(&db, "alice");
    let mut conn = db.conn().unwrap();

    assert_eq!(
        users::get_action_count(&mut conn, &user, "posts_created").unwrap(),
        0
    );

    users::increment_action_count(&mut conn, &user, "posts_created", 1).unwrap();
    users::increment_action_count(&mut conn, &user, "posts_created", 1).unwrap();
    let count = users::increment_action_count(&mut conn, &user, "posts_created", 3).unwrap();
    assert_eq!(count, 5);

    users::increment_action_count(&mut conn, &user, "comments_made", 2).unwrap();
    let counts = users::get_action_counts(&mut conn, &user).unwrap();
    assert_eq!(counts.len(), 2);
}

#[test]
fn test_stats_reflect_ledger_contents() {
    let (services, db, _temp) = setup();
    let user = create_user(&db, "alice");
    services.quests.generate_daily_quests(&user).unwrap();

    let stats = db.stats().unwrap();
    assert_eq!(stats.user_count, 1);
    assert_eq!(stats.quest_count, 3);
    assert_eq!(stats.achievement_count, 5);
    assert_eq!(stats.unlocked_count, 0);
    assert_eq!(stats.inventory_count, 0);
}

#[test]
fn test_claim_after_sweep_is_not_found() {
    let (services, db, _temp) = setup();
    let user = create_user(&db, "alice");

    // A completed quest that expired before the user claimed it
    let quest_id = {
        let mut conn = db.conn().unwrap();
        let expired_at = (chrono::Utc::now() - chrono::Duration::hours(1))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();
        let quest = reward_ledger::db::quests::insert_quest(
            &mut conn,
            reward_ledger::db::quests::InsertQuestInput {
                user_id: &user,
                quest_type: "create_post",
                title: "Share your knowledge",
                description: None,
                target_amount: 1,
                reward: 50,
                expires_at: &expired_at,
            },
        )
        .unwrap();
        reward_ledger::db::quests::increment_progress(&mut conn, &quest.id, 1).unwrap();
        reward_ledger::db::quests::promote_completion(&mut conn, &quest.id).unwrap();
        quest.id
    };

    services.quests.reset_daily_quests().unwrap();

    // The row is gone; the claimer sees NotFound, never a payout
    assert!(matches!(
        services.quests.claim_quest_reward(&user, &quest_id),
        Err(RewardError::NotFound(_))
    ));

    let mut conn = db.conn().unwrap();
    assert_eq!(users::get_balance(&mut conn, &user).unwrap(), 0);
}
