use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{CorrectionCmd, Engine, EngineError, SeatEntry, SettlementCmd};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_tenant() -> (Engine, DatabaseConnection, Uuid) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();

    let tenant = engine
        .create_tenant("friday-night", None, "admin", "phc-hash", "operator")
        .await
        .unwrap();
    (engine, db, tenant.id)
}

async fn add_players(engine: &Engine, tenant_id: Uuid, names: &[&str]) {
    for name in names {
        engine
            .create_player(tenant_id, name, false, "admin", None)
            .await
            .unwrap();
    }
}

fn seat(username: &str, cashout: i64, rebuys: i64) -> SeatEntry {
    SeatEntry {
        username: username.to_string(),
        cashout,
        rebuys,
    }
}

fn cmd(tenant_id: Uuid, buyin: i64, seats: Vec<SeatEntry>) -> SettlementCmd {
    SettlementCmd {
        tenant_id,
        date: NaiveDate::from_ymd_opt(2026, 8, 14).unwrap(),
        buyin,
        seats,
        actor: "admin".to_string(),
        ip: None,
    }
}

async fn balance_of(engine: &Engine, tenant_id: Uuid, username: &str) -> i64 {
    engine
        .player_by_username(tenant_id, username)
        .await
        .unwrap()
        .unwrap()
        .balance
}

#[tokio::test]
async fn settlement_updates_balances_and_derives_winner() {
    let (engine, _db, tenant_id) = engine_with_tenant().await;
    add_players(&engine, tenant_id, &["alice", "bob"]).await;

    let game_id = engine
        .settle_game(cmd(
            tenant_id,
            100,
            vec![seat("alice", 150, 0), seat("bob", 50, 0)],
        ))
        .await
        .unwrap();

    let (game, parts) = engine.game(tenant_id, game_id).await.unwrap();
    assert_eq!(game.winner, "alice");
    assert_eq!(game.amount, 50);
    assert_eq!(game.rebuys, 0);
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].net, 50);
    assert_eq!(parts[1].net, -50);

    assert_eq!(balance_of(&engine, tenant_id, "alice").await, 50);
    assert_eq!(balance_of(&engine, tenant_id, "bob").await, -50);
}

#[tokio::test]
async fn balances_equal_sum_of_nets_across_games() {
    let (engine, _db, tenant_id) = engine_with_tenant().await;
    add_players(&engine, tenant_id, &["alice", "bob", "carol"]).await;

    engine
        .settle_game(cmd(
            tenant_id,
            100,
            vec![seat("alice", 250, 0), seat("bob", 30, 1), seat("carol", 20, 0)],
        ))
        .await
        .unwrap();
    engine
        .settle_game(cmd(
            tenant_id,
            50,
            vec![seat("alice", 10, 0), seat("bob", 90, 0)],
        ))
        .await
        .unwrap();

    // Game 1: alice +150, bob -170, carol -80. Game 2: alice -40, bob +40.
    assert_eq!(balance_of(&engine, tenant_id, "alice").await, 110);
    assert_eq!(balance_of(&engine, tenant_id, "bob").await, -130);
    assert_eq!(balance_of(&engine, tenant_id, "carol").await, -80);
}

#[tokio::test]
async fn cashout_above_cap_is_rejected() {
    let (engine, _db, tenant_id) = engine_with_tenant().await;
    add_players(&engine, tenant_id, &["alice"]).await;

    // One seat, one rebuy: 100 * (1 + 1) = 200 on the table, 300 claimed.
    let err = engine
        .settle_game(cmd(tenant_id, 100, vec![seat("alice", 300, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    assert!(engine.list_games(tenant_id).await.unwrap().is_empty());
    assert_eq!(balance_of(&engine, tenant_id, "alice").await, 0);
}

#[tokio::test]
async fn cashout_equal_to_cap_is_accepted() {
    let (engine, _db, tenant_id) = engine_with_tenant().await;
    add_players(&engine, tenant_id, &["alice", "bob"]).await;

    // 2 seats + 1 rebuy = 300 on the table, exactly 300 claimed.
    engine
        .settle_game(cmd(
            tenant_id,
            100,
            vec![seat("alice", 300, 1), seat("bob", 0, 0)],
        ))
        .await
        .unwrap();

    assert_eq!(engine.list_games(tenant_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn validation_rejects_bad_inputs() {
    let (engine, _db, tenant_id) = engine_with_tenant().await;
    add_players(&engine, tenant_id, &["alice"]).await;

    let err = engine
        .settle_game(cmd(tenant_id, 0, vec![seat("alice", 0, 0)]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .settle_game(cmd(tenant_id, 100, vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .settle_game(cmd(tenant_id, 100, vec![seat("alice", -1, 0)]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .settle_game(cmd(tenant_id, 100, vec![seat("alice", 0, -1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn duplicate_seat_is_rejected_before_writes() {
    let (engine, _db, tenant_id) = engine_with_tenant().await;
    add_players(&engine, tenant_id, &["alice"]).await;

    let err = engine
        .settle_game(cmd(
            tenant_id,
            100,
            vec![seat("alice", 100, 0), seat("alice", 100, 0)],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    assert!(engine.list_games(tenant_id).await.unwrap().is_empty());
    assert_eq!(balance_of(&engine, tenant_id, "alice").await, 0);
}

#[tokio::test]
async fn absurd_amounts_are_rejected_not_wrapped() {
    let (engine, _db, tenant_id) = engine_with_tenant().await;
    add_players(&engine, tenant_id, &["alice", "bob"]).await;

    // The cap i64::MAX * 2 does not fit; reject instead of wrapping.
    let err = engine
        .settle_game(cmd(
            tenant_id,
            i64::MAX,
            vec![seat("alice", 0, 0), seat("bob", 0, 0)],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .settle_game(cmd(
            tenant_id,
            100,
            vec![seat("alice", i64::MAX, 0), seat("bob", i64::MAX, 0)],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    assert!(engine.list_games(tenant_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_player_rejects_whole_settlement() {
    let (engine, _db, tenant_id) = engine_with_tenant().await;
    add_players(&engine, tenant_id, &["alice"]).await;

    let err = engine
        .settle_game(cmd(
            tenant_id,
            100,
            vec![seat("alice", 100, 0), seat("ghost", 100, 0)],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    // No partial writes.
    assert!(engine.list_games(tenant_id).await.unwrap().is_empty());
    assert_eq!(balance_of(&engine, tenant_id, "alice").await, 0);
}

#[tokio::test]
async fn winner_tie_goes_to_first_submitted_seat() {
    let (engine, _db, tenant_id) = engine_with_tenant().await;
    add_players(&engine, tenant_id, &["bob", "alice", "carol"]).await;

    // bob and alice both net +50; carol funds them with one rebuy.
    let game_id = engine
        .settle_game(cmd(
            tenant_id,
            100,
            vec![
                seat("bob", 150, 0),
                seat("alice", 150, 0),
                seat("carol", 100, 1),
            ],
        ))
        .await
        .unwrap();

    let (game, _) = engine.game(tenant_id, game_id).await.unwrap();
    assert_eq!(game.winner, "bob");
    assert_eq!(game.amount, 50);
}

#[tokio::test]
async fn correction_rederives_winner_and_balances() {
    let (engine, _db, tenant_id) = engine_with_tenant().await;
    add_players(&engine, tenant_id, &["alice", "bob"]).await;

    let game_id = engine
        .settle_game(cmd(
            tenant_id,
            100,
            vec![seat("alice", 150, 0), seat("bob", 50, 0)],
        ))
        .await
        .unwrap();

    // Bob actually cashed out 200 with one rebuy: net 200 - 200 = 0,
    // alice's +50 now wins unchanged... flip it further: 260 - 200 = 60.
    engine
        .correct_participation(CorrectionCmd {
            tenant_id,
            game_id,
            username: "bob".to_string(),
            cashout: 260,
            rebuys: 1,
            actor: "admin".to_string(),
            ip: None,
        })
        .await
        .unwrap();

    let (game, parts) = engine.game(tenant_id, game_id).await.unwrap();
    assert_eq!(game.winner, "bob");
    assert_eq!(game.amount, 60);
    assert_eq!(game.rebuys, 1);
    assert_eq!(parts[1].net, 60);

    assert_eq!(balance_of(&engine, tenant_id, "alice").await, 50);
    assert_eq!(balance_of(&engine, tenant_id, "bob").await, 60);
}

#[tokio::test]
async fn deleted_player_keeps_historical_username() {
    let (engine, _db, tenant_id) = engine_with_tenant().await;
    add_players(&engine, tenant_id, &["alice", "bob"]).await;

    let game_id = engine
        .settle_game(cmd(
            tenant_id,
            100,
            vec![seat("alice", 150, 0), seat("bob", 50, 0)],
        ))
        .await
        .unwrap();

    engine
        .delete_player(tenant_id, "bob", "admin", None)
        .await
        .unwrap();

    assert!(
        engine
            .player_by_username(tenant_id, "bob")
            .await
            .unwrap()
            .is_none()
    );
    let (_, parts) = engine.game(tenant_id, game_id).await.unwrap();
    assert!(parts.iter().any(|p| p.username == "bob"));
}

#[tokio::test]
async fn tenants_are_isolated() {
    let (engine, _db, tenant_a) = engine_with_tenant().await;
    let tenant_b = engine
        .create_tenant("saturday", None, "admin", "phc-hash", "operator")
        .await
        .unwrap()
        .id;
    add_players(&engine, tenant_a, &["alice"]).await;
    add_players(&engine, tenant_b, &["alice"]).await;

    engine
        .settle_game(cmd(tenant_a, 100, vec![seat("alice", 100, 0)]))
        .await
        .unwrap();

    assert_eq!(engine.list_games(tenant_a).await.unwrap().len(), 1);
    assert!(engine.list_games(tenant_b).await.unwrap().is_empty());
    assert_eq!(balance_of(&engine, tenant_b, "alice").await, 0);
}

#[tokio::test]
async fn deleting_a_tenant_cascades() {
    let (engine, _db, tenant_id) = engine_with_tenant().await;
    add_players(&engine, tenant_id, &["alice"]).await;
    engine
        .settle_game(cmd(tenant_id, 100, vec![seat("alice", 100, 0)]))
        .await
        .unwrap();

    engine.delete_tenant("friday-night").await.unwrap();

    assert!(engine.tenant_by_name("friday-night").await.unwrap().is_none());
    assert!(engine.list_players(tenant_id).await.unwrap().is_empty());
    assert!(engine.list_games(tenant_id).await.unwrap().is_empty());
    assert!(engine.list_audit(tenant_id, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn privileged_mutations_are_audited() {
    let (engine, _db, tenant_id) = engine_with_tenant().await;
    add_players(&engine, tenant_id, &["alice"]).await;
    engine
        .settle_game(cmd(tenant_id, 100, vec![seat("alice", 100, 0)]))
        .await
        .unwrap();
    engine
        .set_balance(tenant_id, "alice", 7, "admin", Some("10.0.0.1".to_string()))
        .await
        .unwrap();

    let entries = engine.list_audit(tenant_id, 50).await.unwrap();
    // Tenant provisioning, player creation, settlement, balance override.
    assert_eq!(entries.len(), 4);
    let override_entry = entries
        .iter()
        .find(|e| e.action.contains("Balance override"))
        .unwrap();
    assert_eq!(override_entry.ip.as_deref(), Some("10.0.0.1"));
    assert_eq!(override_entry.target.as_deref(), Some("alice"));

    let limited = engine.list_audit(tenant_id, 2).await.unwrap();
    assert_eq!(limited.len(), 2);
}

#[tokio::test]
async fn self_deletion_is_forbidden() {
    let (engine, _db, tenant_id) = engine_with_tenant().await;

    let err = engine
        .delete_player(tenant_id, "admin", "admin", None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn duplicate_usernames_are_rejected_per_tenant() {
    let (engine, _db, tenant_id) = engine_with_tenant().await;
    add_players(&engine, tenant_id, &["alice"]).await;

    let err = engine
        .create_player(tenant_id, "alice", false, "admin", None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}
