use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Currency, Engine, EngineError};
use migration::MigratorTrait;

/// Engine over an in-memory database with one user per `(username, display
/// name)` pair; user ids are assigned 1, 2, ... in order.
async fn engine_with_users(users: &[(&str, &str)]) -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (username, display_name) in users {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password, display_name) VALUES (?, ?, ?)",
            vec![(*username).into(), "password".into(), (*display_name).into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

const ALICE: i64 = 1;
const BOB: i64 = 2;
const CAROL: i64 = 3;

async fn trio_group(engine: &Engine) -> String {
    let group_id = engine
        .new_group("Vacanze", Currency::Eur, ALICE)
        .await
        .unwrap();
    engine
        .upsert_group_member(&group_id, BOB, "member", ALICE)
        .await
        .unwrap();
    engine
        .upsert_group_member(&group_id, CAROL, "member", ALICE)
        .await
        .unwrap();
    group_id
}

#[tokio::test]
async fn new_group_makes_creator_owner() {
    let (engine, _db) = engine_with_users(&[("alice", "Alice")]).await;

    let group_id = engine
        .new_group("Coinquilini", Currency::Eur, ALICE)
        .await
        .unwrap();

    let members = engine.list_group_members(&group_id, ALICE).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].0.id, ALICE);
    assert_eq!(members[0].1, engine::MemberRole::Owner);

    let groups = engine.list_groups(ALICE).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].currency, Currency::Eur);
}

#[tokio::test]
async fn expense_balances_plan_settle_round_trip() {
    let (engine, _db) =
        engine_with_users(&[("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")]).await;
    let group_id = trio_group(&engine).await;

    // Alice pays 60.00, split evenly.
    engine
        .add_expense(&group_id, "Cena", 6000, ALICE, None, ALICE, Utc::now())
        .await
        .unwrap();

    let sheet = engine.group_balances(&group_id, ALICE).await.unwrap();
    let cents: Vec<(i64, i64)> = sheet
        .positions
        .iter()
        .map(|p| (p.balance.member_id, p.balance.amount.cents()))
        .collect();
    assert_eq!(cents, vec![(ALICE, 4000), (BOB, -2000), (CAROL, -2000)]);

    let plan = engine.settlement_plan(&group_id, BOB).await.unwrap();
    assert_eq!(plan.currency, Currency::Eur);
    assert_eq!(plan.transfers.len(), 2);
    assert_eq!(plan.transfers[0].transfer.from, BOB);
    assert_eq!(plan.transfers[0].transfer.to, ALICE);
    assert_eq!(plan.transfers[0].transfer.amount.cents(), 2000);
    assert_eq!(plan.transfers[0].from_name, "Bob");
    assert_eq!(plan.transfers[0].to_name, "Alice");
    assert_eq!(plan.transfers[1].transfer.from, CAROL);

    // Record both proposed transfers as settlements.
    for planned in &plan.transfers {
        engine
            .record_settlement(
                &group_id,
                planned.transfer.from,
                planned.transfer.to,
                planned.transfer.amount.cents(),
                planned.transfer.from,
                Utc::now(),
            )
            .await
            .unwrap();
    }

    let sheet = engine.group_balances(&group_id, ALICE).await.unwrap();
    assert!(sheet.positions.iter().all(|p| p.balance.amount.is_zero()));

    let plan = engine.settlement_plan(&group_id, ALICE).await.unwrap();
    assert!(plan.transfers.is_empty());
}

#[tokio::test]
async fn even_split_remainder_goes_to_earliest_members() {
    let (engine, _db) =
        engine_with_users(&[("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")]).await;
    let group_id = trio_group(&engine).await;

    // 10.00 across three members: 3.34 / 3.33 / 3.33 in roster order.
    engine
        .add_expense(&group_id, "Caffè", 1000, BOB, None, BOB, Utc::now())
        .await
        .unwrap();

    let expenses = engine.list_expenses(&group_id, ALICE, 10).await.unwrap();
    assert_eq!(expenses.len(), 1);
    let shares: Vec<(i64, i64)> = expenses[0]
        .splits
        .iter()
        .map(|s| (s.member_id, s.amount.cents()))
        .collect();
    assert_eq!(shares, vec![(ALICE, 334), (BOB, 333), (CAROL, 333)]);

    let sheet = engine.group_balances(&group_id, ALICE).await.unwrap();
    let total: i64 = sheet
        .positions
        .iter()
        .map(|p| p.balance.amount.cents())
        .sum();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn explicit_splits_must_sum_to_amount() {
    let (engine, _db) = engine_with_users(&[("alice", "Alice"), ("bob", "Bob")]).await;
    let group_id = engine
        .new_group("Spese", Currency::Eur, ALICE)
        .await
        .unwrap();
    engine
        .upsert_group_member(&group_id, BOB, "member", ALICE)
        .await
        .unwrap();

    let result = engine
        .add_expense(
            &group_id,
            "Spesa",
            1000,
            ALICE,
            Some(vec![(ALICE, 600), (BOB, 300)]),
            ALICE,
            Utc::now(),
        )
        .await;
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));
}

#[tokio::test]
async fn splits_may_only_reference_group_members() {
    let (engine, _db) =
        engine_with_users(&[("alice", "Alice"), ("bob", "Bob"), ("mallory", "Mallory")]).await;
    let group_id = engine
        .new_group("Spese", Currency::Eur, ALICE)
        .await
        .unwrap();
    engine
        .upsert_group_member(&group_id, BOB, "member", ALICE)
        .await
        .unwrap();

    let outsider = 3;
    let result = engine
        .add_expense(
            &group_id,
            "Spesa",
            1000,
            ALICE,
            Some(vec![(ALICE, 500), (outsider, 500)]),
            ALICE,
            Utc::now(),
        )
        .await;
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));
}

#[tokio::test]
async fn non_members_cannot_see_the_group() {
    let (engine, _db) = engine_with_users(&[("alice", "Alice"), ("dave", "Dave")]).await;
    let group_id = engine
        .new_group("Privato", Currency::Eur, ALICE)
        .await
        .unwrap();

    let dave = 2;
    assert!(matches!(
        engine.group(&group_id, dave).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.group_balances(&group_id, dave).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn only_owners_manage_the_roster() {
    let (engine, _db) =
        engine_with_users(&[("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")]).await;
    let group_id = engine
        .new_group("Casa", Currency::Eur, ALICE)
        .await
        .unwrap();
    engine
        .upsert_group_member(&group_id, BOB, "member", ALICE)
        .await
        .unwrap();

    let result = engine
        .upsert_group_member(&group_id, CAROL, "member", BOB)
        .await;
    assert!(matches!(result, Err(EngineError::Forbidden(_))));
}

#[tokio::test]
async fn members_with_open_balances_cannot_be_removed() {
    let (engine, _db) = engine_with_users(&[("alice", "Alice"), ("bob", "Bob")]).await;
    let group_id = engine
        .new_group("Casa", Currency::Eur, ALICE)
        .await
        .unwrap();
    engine
        .upsert_group_member(&group_id, BOB, "member", ALICE)
        .await
        .unwrap();

    engine
        .add_expense(&group_id, "Affitto", 10000, ALICE, None, ALICE, Utc::now())
        .await
        .unwrap();

    let result = engine.remove_group_member(&group_id, BOB, ALICE).await;
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));

    // Once Bob pays Alice back, removal is fine.
    engine
        .record_settlement(&group_id, BOB, ALICE, 5000, BOB, Utc::now())
        .await
        .unwrap();
    engine
        .remove_group_member(&group_id, BOB, ALICE)
        .await
        .unwrap();

    let members = engine.list_group_members(&group_id, ALICE).await.unwrap();
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn settlements_require_group_members() {
    let (engine, _db) =
        engine_with_users(&[("alice", "Alice"), ("bob", "Bob"), ("dave", "Dave")]).await;
    let group_id = engine
        .new_group("Casa", Currency::Eur, ALICE)
        .await
        .unwrap();
    engine
        .upsert_group_member(&group_id, BOB, "member", ALICE)
        .await
        .unwrap();

    let dave = 3;
    let result = engine
        .record_settlement(&group_id, dave, ALICE, 1000, ALICE, Utc::now())
        .await;
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));
}

#[tokio::test]
async fn expense_payer_must_be_a_member() {
    let (engine, _db) = engine_with_users(&[("alice", "Alice"), ("dave", "Dave")]).await;
    let group_id = engine
        .new_group("Casa", Currency::Eur, ALICE)
        .await
        .unwrap();

    let dave = 2;
    let result = engine
        .add_expense(&group_id, "Spesa", 1000, dave, None, ALICE, Utc::now())
        .await;
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));
}

#[tokio::test]
async fn fresh_group_has_no_positions() {
    let (engine, _db) = engine_with_users(&[("alice", "Alice")]).await;
    let group_id = engine
        .new_group("Nuovo", Currency::Eur, ALICE)
        .await
        .unwrap();

    let sheet = engine.group_balances(&group_id, ALICE).await.unwrap();
    assert!(sheet.positions.is_empty());

    let plan = engine.settlement_plan(&group_id, ALICE).await.unwrap();
    assert!(plan.transfers.is_empty());
}
