use chrono::NaiveDate;
use sea_orm::Database;

use engine::{Engine, LeaderboardSort, SeatEntry, SettlementCmd};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_players(names: &[&str]) -> (Engine, Uuid) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build();

    let tenant = engine
        .create_tenant("friday-night", None, "admin", "phc-hash", "operator")
        .await
        .unwrap();
    for name in names {
        engine
            .create_player(tenant.id, name, false, "admin", None)
            .await
            .unwrap();
    }
    (engine, tenant.id)
}

fn seat(username: &str, cashout: i64, rebuys: i64) -> SeatEntry {
    SeatEntry {
        username: username.to_string(),
        cashout,
        rebuys,
    }
}

async fn settle(engine: &Engine, tenant_id: Uuid, date: &str, buyin: i64, seats: Vec<SeatEntry>) {
    engine
        .settle_game(SettlementCmd {
            tenant_id,
            date: date.parse().unwrap(),
            buyin,
            seats,
            actor: "admin".to_string(),
            ip: None,
        })
        .await
        .unwrap();
}

fn mid_august() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 15).unwrap()
}

#[tokio::test]
async fn empty_ledger_yields_zeros_not_errors() {
    let (engine, tenant_id) = engine_with_players(&[]).await;

    let stats = engine
        .table_stats(tenant_id, None, mid_august())
        .await
        .unwrap();
    assert_eq!(stats.total_games, 0);
    assert_eq!(stats.total_money, 0);
    assert!(stats.top_earner.is_none());
    assert!(stats.player_of_month.is_none());
    assert!(stats.per_player.is_empty());
}

#[tokio::test]
async fn per_player_totals_and_picks() {
    let (engine, tenant_id) = engine_with_players(&["alice", "bob", "carol"]).await;

    settle(
        &engine,
        tenant_id,
        "2026-08-07",
        100,
        vec![seat("alice", 250, 0), seat("bob", 30, 1), seat("carol", 20, 0)],
    )
    .await;
    settle(
        &engine,
        tenant_id,
        "2026-08-14",
        100,
        vec![seat("alice", 50, 0), seat("bob", 150, 0)],
    )
    .await;

    let stats = engine
        .table_stats(tenant_id, None, mid_august())
        .await
        .unwrap();

    assert_eq!(stats.total_games, 2);
    // Winner nets: game 1 alice +150, game 2 bob +50.
    assert_eq!(stats.total_money, 200);
    assert!((stats.avg_winner_profit - 100.0).abs() < f64::EPSILON);

    let alice = &stats.per_player[0];
    assert_eq!(alice.username, "alice");
    assert_eq!(alice.games, 2);
    assert_eq!(alice.invested, 200);
    assert_eq!(alice.net, 100);
    assert_eq!(alice.biggest_win, 150);
    assert_eq!(alice.biggest_loss, -50);
    assert!((alice.roi - 50.0).abs() < f64::EPSILON);

    assert_eq!(stats.top_earner.as_ref().unwrap().username, "alice");
    assert_eq!(stats.top_earner.as_ref().unwrap().value, 100);
    // bob: -170 + 50 = -120; carol: -80.
    assert_eq!(stats.top_loser.as_ref().unwrap().username, "bob");
    assert_eq!(stats.most_rebuys.as_ref().unwrap().username, "bob");
    assert_eq!(stats.biggest_single_win.as_ref().unwrap().username, "alice");
    assert_eq!(stats.biggest_single_win.as_ref().unwrap().value, 150);
    assert_eq!(stats.worst_single_loss.as_ref().unwrap().username, "bob");
    assert_eq!(stats.worst_single_loss.as_ref().unwrap().value, -170);
    assert_eq!(stats.unique_winners, 2);
    assert_eq!(stats.top_earners.len(), 3);
    assert_eq!(stats.top_earners[0].username, "alice");
}

#[tokio::test]
async fn month_window_filters_games() {
    let (engine, tenant_id) = engine_with_players(&["alice", "bob"]).await;

    settle(
        &engine,
        tenant_id,
        "2026-07-31",
        100,
        vec![seat("alice", 200, 0), seat("bob", 0, 0)],
    )
    .await;
    settle(
        &engine,
        tenant_id,
        "2026-08-01",
        100,
        vec![seat("alice", 0, 0), seat("bob", 200, 0)],
    )
    .await;

    let july = engine
        .table_stats(tenant_id, Some("2026-07".to_string()), mid_august())
        .await
        .unwrap();
    assert_eq!(july.total_games, 1);
    assert_eq!(july.top_earner.as_ref().unwrap().username, "alice");

    let august = engine
        .table_stats(tenant_id, Some("2026-08".to_string()), mid_august())
        .await
        .unwrap();
    assert_eq!(august.total_games, 1);
    assert_eq!(august.top_earner.as_ref().unwrap().username, "bob");
}

#[tokio::test]
async fn potm_history_written_once_on_last_day_only() {
    let (engine, tenant_id) = engine_with_players(&["alice", "bob"]).await;
    settle(
        &engine,
        tenant_id,
        "2026-08-07",
        100,
        vec![seat("alice", 200, 0), seat("bob", 0, 0)],
    )
    .await;

    // Mid-month runs never persist.
    engine
        .table_stats(tenant_id, Some("2026-08".to_string()), mid_august())
        .await
        .unwrap();
    assert!(engine.monthly_award_history(tenant_id).await.unwrap().is_empty());

    // Last day persists exactly once, repeated calls included.
    let last_day = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
    for _ in 0..3 {
        engine
            .table_stats(tenant_id, Some("2026-08".to_string()), last_day)
            .await
            .unwrap();
    }
    let history = engine.monthly_award_history(tenant_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].month, "2026-08");
    assert_eq!(history[0].username, "alice");

    // A different month's window on that day does not persist.
    engine
        .table_stats(tenant_id, Some("2026-07".to_string()), last_day)
        .await
        .unwrap();
    assert_eq!(engine.monthly_award_history(tenant_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn leaderboard_counts_and_orderings() {
    let (engine, tenant_id) = engine_with_players(&["alice", "bob"]).await;
    settle(
        &engine,
        tenant_id,
        "2026-08-07",
        100,
        vec![seat("alice", 150, 0), seat("bob", 50, 2)],
    )
    .await;
    settle(
        &engine,
        tenant_id,
        "2026-08-14",
        100,
        vec![seat("alice", 100, 0)],
    )
    .await;

    let by_balance = engine
        .leaderboard(tenant_id, LeaderboardSort::BalanceDesc)
        .await
        .unwrap();
    assert_eq!(by_balance[0].username, "alice");
    assert_eq!(by_balance[0].balance, 50);
    assert_eq!(by_balance[0].games_played, 2);
    // admin has played nothing but is still listed.
    assert_eq!(by_balance.len(), 3);

    let by_rebuys = engine
        .leaderboard(tenant_id, LeaderboardSort::RebuysDesc)
        .await
        .unwrap();
    assert_eq!(by_rebuys[0].username, "bob");
    assert_eq!(by_rebuys[0].total_rebuys, 2);

    let by_username = engine
        .leaderboard(tenant_id, LeaderboardSort::UsernameAsc)
        .await
        .unwrap();
    assert_eq!(by_username[0].username, "admin");
    assert_eq!(by_username[1].username, "alice");
}

#[tokio::test]
async fn player_report_cumulative_and_win_rate() {
    let (engine, tenant_id) = engine_with_players(&["alice", "bob"]).await;
    settle(
        &engine,
        tenant_id,
        "2026-08-07",
        100,
        vec![seat("alice", 150, 0), seat("bob", 50, 0)],
    )
    .await;
    settle(
        &engine,
        tenant_id,
        "2026-08-14",
        100,
        vec![seat("alice", 80, 0), seat("bob", 120, 0)],
    )
    .await;

    let report = engine.player_report(tenant_id, "alice").await.unwrap();
    assert_eq!(report.total_games, 2);
    assert_eq!(report.net_sum, 30);
    assert!((report.avg_profit - 15.0).abs() < f64::EPSILON);
    assert!((report.win_rate - 50.0).abs() < f64::EPSILON);
    assert_eq!(report.cumulative, vec![50, 30]);
    assert_eq!(report.recent.len(), 2);
    // Newest first.
    assert_eq!(report.recent[0].net, -20);

    // Unknown names produce an empty report, not an error.
    let empty = engine.player_report(tenant_id, "ghost").await.unwrap();
    assert_eq!(empty.total_games, 0);
}

#[tokio::test]
async fn progress_series_covers_all_players_and_dates() {
    let (engine, tenant_id) = engine_with_players(&["alice", "bob"]).await;
    settle(
        &engine,
        tenant_id,
        "2026-08-07",
        100,
        vec![seat("alice", 150, 0), seat("bob", 50, 0)],
    )
    .await;
    settle(
        &engine,
        tenant_id,
        "2026-08-14",
        100,
        vec![seat("alice", 0, 0), seat("bob", 200, 0)],
    )
    .await;

    let series = engine.progress_series(tenant_id).await.unwrap();
    assert_eq!(series.labels.len(), 2);
    assert_eq!(series.players.len(), 3);

    let alice = series
        .players
        .iter()
        .find(|p| p.username == "alice")
        .unwrap();
    assert_eq!(alice.data, vec![50, -50]);
    let admin = series
        .players
        .iter()
        .find(|p| p.username == "admin")
        .unwrap();
    assert_eq!(admin.data, vec![0, 0]);
}

#[tokio::test]
async fn potm_composite_score_prefers_steady_winners() {
    let (engine, tenant_id) = engine_with_players(&["alice", "bob"]).await;
    // alice: two modest wins, no rebuys. bob: one big win, heavy rebuys.
    settle(
        &engine,
        tenant_id,
        "2026-08-07",
        100,
        vec![seat("alice", 160, 0), seat("bob", 40, 0)],
    )
    .await;
    settle(
        &engine,
        tenant_id,
        "2026-08-14",
        100,
        vec![seat("alice", 160, 0), seat("bob", 240, 3)],
    )
    .await;

    let stats = engine
        .table_stats(tenant_id, Some("2026-08".to_string()), mid_august())
        .await
        .unwrap();

    // alice: net 120, invested 200, roi 60 -> 120 + 120 + 10 - 0 = 250.
    // bob: net -220, invested 500, roi -44 -> -220 - 88 + 10 - 6 = -304.
    let pick = stats.player_of_month.as_ref().unwrap();
    assert_eq!(pick.username, "alice");
    assert!((pick.score - 250.0).abs() < 1e-9);
}
