use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, Database, DatabaseConnection, EntityTrait};

use engine::{
    AccountKind, Currency, DepositCmd, Engine, EngineError, OpenAccountCmd, TransferCmd, entries,
    store, transfers, users,
};
use migration::MigratorTrait;

async fn seed_user(db: &DatabaseConnection, username: &str) {
    let user = users::ActiveModel {
        username: ActiveValue::Set(username.to_string()),
        created_at: ActiveValue::Set(Utc::now()),
    };
    user.insert(db).await.unwrap();
}

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    seed_user(&db, "alice").await;
    seed_user(&db, "bob").await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, std::path::PathBuf) {
    let root =
        std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = root.join(format!("ledger_{}_{nanos}.db", std::process::id()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    seed_user(&db, "alice").await;
    seed_user(&db, "bob").await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    (engine, db, path)
}

#[tokio::test]
async fn open_account_creates_settlement_pair() {
    let (engine, _db) = engine_with_db().await;

    let account = engine
        .open_account(OpenAccountCmd::new("alice", Currency::Usd))
        .await
        .unwrap();
    assert_eq!(account.owner, "alice");
    assert_eq!(account.kind, AccountKind::Bank);
    assert_eq!(account.balance_minor, 0);

    let accounts = engine.accounts_for_owner("alice").await.unwrap();
    assert_eq!(accounts.len(), 2);
    let bank = accounts
        .iter()
        .find(|a| a.kind == AccountKind::Bank)
        .unwrap();
    let external = accounts
        .iter()
        .find(|a| a.kind == AccountKind::External)
        .unwrap();
    assert_eq!(bank.id, account.id);
    assert_eq!(external.owner, "alice");
    assert_eq!(external.currency, Currency::Usd);
    assert_eq!(external.balance_minor, 0);
}

#[tokio::test]
async fn open_account_rejects_existing_pair() {
    let (engine, _db) = engine_with_db().await;

    engine
        .open_account(OpenAccountCmd::new("alice", Currency::Usd))
        .await
        .unwrap();
    let err = engine
        .open_account(OpenAccountCmd::new("alice", Currency::Usd))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyExists(_)));

    // The failed call must not have left any extra row behind.
    let accounts = engine.accounts_for_owner("alice").await.unwrap();
    assert_eq!(accounts.len(), 2);

    // A different currency for the same owner is still fine.
    engine
        .open_account(OpenAccountCmd::new("alice", Currency::Eur))
        .await
        .unwrap();
    let accounts = engine.accounts_for_owner("alice").await.unwrap();
    assert_eq!(accounts.len(), 4);
}

#[tokio::test]
async fn failed_provisioning_leaves_no_partial_pair() {
    let (engine, db) = engine_with_db().await;

    // A lone settlement account already exists, so provisioning creates the
    // bank account and then collides on the external one -> full rollback.
    store::create_account(&db, "bob", Currency::Eur, 0, AccountKind::External)
        .await
        .unwrap();

    let err = engine
        .open_account(OpenAccountCmd::new("bob", Currency::Eur))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyExists(_)));

    let accounts = engine.accounts_for_owner("bob").await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].kind, AccountKind::External);
}

#[tokio::test]
async fn transfer_moves_funds_and_writes_balancing_entries() {
    let (engine, _db) = engine_with_db().await;

    let from = engine
        .open_account(OpenAccountCmd::new("alice", Currency::Usd).initial_balance_minor(100))
        .await
        .unwrap();
    let to = engine
        .open_account(OpenAccountCmd::new("bob", Currency::Usd).initial_balance_minor(50))
        .await
        .unwrap();

    let outcome = engine
        .transfer(TransferCmd::new(from.id, to.id, 30))
        .await
        .unwrap();

    assert_eq!(outcome.transfer.from_account_id, from.id);
    assert_eq!(outcome.transfer.to_account_id, to.id);
    assert_eq!(outcome.transfer.amount_minor, 30);
    assert_eq!(outcome.from_account.balance_minor, 70);
    assert_eq!(outcome.to_account.balance_minor, 80);
    assert_eq!(outcome.from_entry.account_id, from.id);
    assert_eq!(outcome.from_entry.amount_minor, -30);
    assert_eq!(outcome.to_entry.account_id, to.id);
    assert_eq!(outcome.to_entry.amount_minor, 30);

    // The snapshots in the outcome match what a re-read observes.
    assert_eq!(engine.account(from.id).await.unwrap().balance_minor, 70);
    assert_eq!(engine.account(to.id).await.unwrap().balance_minor, 80);
}

#[tokio::test]
async fn transfer_works_in_both_id_directions() {
    let (engine, _db) = engine_with_db().await;

    let first = engine
        .open_account(OpenAccountCmd::new("alice", Currency::Usd).initial_balance_minor(100))
        .await
        .unwrap();
    let second = engine
        .open_account(OpenAccountCmd::new("bob", Currency::Usd).initial_balance_minor(100))
        .await
        .unwrap();
    assert!(first.id < second.id);

    // Lower id first and higher id first both go through the shared
    // ascending-id balance helper.
    engine
        .transfer(TransferCmd::new(first.id, second.id, 10))
        .await
        .unwrap();
    engine
        .transfer(TransferCmd::new(second.id, first.id, 25))
        .await
        .unwrap();

    assert_eq!(engine.account(first.id).await.unwrap().balance_minor, 115);
    assert_eq!(engine.account(second.id).await.unwrap().balance_minor, 85);
}

#[tokio::test]
async fn transfer_rejects_invalid_input_without_touching_rows() {
    let (engine, db) = engine_with_db().await;

    let from = engine
        .open_account(OpenAccountCmd::new("alice", Currency::Usd).initial_balance_minor(100))
        .await
        .unwrap();
    let to = engine
        .open_account(OpenAccountCmd::new("bob", Currency::Usd))
        .await
        .unwrap();

    for cmd in [
        TransferCmd::new(from.id, to.id, 0),
        TransferCmd::new(from.id, to.id, -30),
        TransferCmd::new(from.id, from.id, 30),
    ] {
        let err = engine.transfer(cmd).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }

    assert_eq!(engine.account(from.id).await.unwrap().balance_minor, 100);
    assert_eq!(engine.account(to.id).await.unwrap().balance_minor, 0);
    assert!(transfers::Entity::find().all(&db).await.unwrap().is_empty());
    assert!(entries::Entity::find().all(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_transfer_rolls_back_all_rows() {
    let (engine, db) = engine_with_db().await;

    let from = engine
        .open_account(OpenAccountCmd::new("alice", Currency::Usd).initial_balance_minor(100))
        .await
        .unwrap();

    // The destination account does not exist, so the workflow fails after
    // the transfer and entry inserts; everything must be rolled back.
    let err = engine
        .transfer(TransferCmd::new(from.id, 999, 30))
        .await
        .unwrap_err();
    assert!(!matches!(err, EngineError::InvalidAmount(_)));

    assert_eq!(engine.account(from.id).await.unwrap().balance_minor, 100);
    assert!(transfers::Entity::find().all(&db).await.unwrap().is_empty());
    assert!(entries::Entity::find().all(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn deposit_moves_funds_from_settlement_account() {
    let (engine, _db) = engine_with_db().await;

    let bank = engine
        .open_account(OpenAccountCmd::new("alice", Currency::Usd))
        .await
        .unwrap();

    let transfer = engine
        .deposit(DepositCmd::new("alice", Currency::Usd, 40))
        .await
        .unwrap();
    assert_eq!(transfer.to_account_id, bank.id);
    assert_eq!(transfer.amount_minor, 40);

    let accounts = engine.accounts_for_owner("alice").await.unwrap();
    let bank = accounts
        .iter()
        .find(|a| a.kind == AccountKind::Bank)
        .unwrap();
    let external = accounts
        .iter()
        .find(|a| a.kind == AccountKind::External)
        .unwrap();
    assert_eq!(transfer.from_account_id, external.id);
    assert_eq!(bank.balance_minor, 40);
    assert_eq!(external.balance_minor, -40);

    // A second deposit keeps pushing the settlement balance negative.
    engine
        .deposit(DepositCmd::new("alice", Currency::Usd, 30))
        .await
        .unwrap();
    let accounts = engine.accounts_for_owner("alice").await.unwrap();
    let bank = accounts
        .iter()
        .find(|a| a.kind == AccountKind::Bank)
        .unwrap();
    let external = accounts
        .iter()
        .find(|a| a.kind == AccountKind::External)
        .unwrap();
    assert_eq!(bank.balance_minor, 70);
    assert_eq!(external.balance_minor, -70);
}

#[tokio::test]
async fn deposit_rejects_bad_preconditions() {
    let (engine, db) = engine_with_db().await;

    engine
        .open_account(OpenAccountCmd::new("alice", Currency::Usd))
        .await
        .unwrap();

    let err = engine
        .deposit(DepositCmd::new("alice", Currency::Usd, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .deposit(DepositCmd::new("mallory", Currency::Usd, 40))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    // Account pair exists for USD only.
    let err = engine
        .deposit(DepositCmd::new("alice", Currency::Eur, 40))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    assert!(transfers::Entity::find().all(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_transfers_in_mixed_directions_all_complete() {
    let (engine, db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);

    let first = engine
        .open_account(OpenAccountCmd::new("alice", Currency::Usd).initial_balance_minor(1000))
        .await
        .unwrap();
    let second = engine
        .open_account(OpenAccountCmd::new("bob", Currency::Usd).initial_balance_minor(1000))
        .await
        .unwrap();

    // Equal numbers of transfers in each direction between the same pair of
    // accounts. The ascending-id lock order keeps them deadlock-free; they
    // may serialize on row locks but must all complete.
    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = Arc::clone(&engine);
        let (from, to) = if i % 2 == 0 {
            (first.id, second.id)
        } else {
            (second.id, first.id)
        };
        handles.push(tokio::spawn(async move {
            engine.transfer(TransferCmd::new(from, to, 10)).await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(engine.account(first.id).await.unwrap().balance_minor, 1000);
    assert_eq!(engine.account(second.id).await.unwrap().balance_minor, 1000);

    let entry_models = entries::Entity::find().all(&db).await.unwrap();
    assert_eq!(entry_models.len(), 16);
    assert_eq!(entry_models.iter().map(|e| e.amount_minor).sum::<i64>(), 0);

    drop(engine);
    db.close().await.unwrap();
    std::fs::remove_file(path).ok();
}
