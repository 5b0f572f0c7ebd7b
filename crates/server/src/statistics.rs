//! Statistics API endpoints.
//!
//! These are thin wrappers over the aggregation engine; the heavier
//! result types serialize straight from the engine crate.

use api_types::stats::{
    LeaderboardEntry, LeaderboardQuery, LeaderboardResponse, MonthlyAwardView, MonthlyQuery,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::{Datelike, Utc};
use engine::{
    CumulativeSeries, EngineError, LeaderboardSort, Player, PlayerReport, TableStats, Tenant,
};
use serde::Serialize;

use crate::{ServerError, server::ServerState};

/// The signed-in player's own report.
pub async fn dashboard(
    Extension(tenant): Extension<Tenant>,
    Extension(player): Extension<Player>,
    State(state): State<ServerState>,
) -> Result<Json<PlayerReport>, ServerError> {
    let report = state
        .engine
        .player_report(tenant.id, &player.username)
        .await?;
    Ok(Json(report))
}

/// Public profile of any player, including names that only remain in
/// the historical ledger.
pub async fn profile(
    Extension(tenant): Extension<Tenant>,
    State(state): State<ServerState>,
    Path(username): Path<String>,
) -> Result<Json<PlayerReport>, ServerError> {
    let report = state.engine.player_report(tenant.id, &username).await?;
    if report.total_games == 0
        && state
            .engine
            .player_by_username(tenant.id, &username)
            .await?
            .is_none()
    {
        return Err(ServerError::Engine(EngineError::KeyNotFound(username)));
    }
    Ok(Json(report))
}

pub async fn leaderboard(
    Extension(tenant): Extension<Tenant>,
    State(state): State<ServerState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, ServerError> {
    let sort = query
        .sort
        .as_deref()
        .map(LeaderboardSort::from_key)
        .unwrap_or_default();
    let rows = state.engine.leaderboard(tenant.id, sort).await?;

    Ok(Json(LeaderboardResponse {
        sort: sort.as_key().to_string(),
        entries: rows
            .into_iter()
            .map(|row| LeaderboardEntry {
                username: row.username,
                balance: row.balance,
                games_played: row.games_played,
                total_rebuys: row.total_rebuys,
                avatar_ref: row.avatar_ref,
            })
            .collect(),
    }))
}

/// Stats scoped to one calendar month, defaulting to the current one.
/// Requesting the current month on its last day also records the
/// player-of-the-month award.
pub async fn monthly(
    Extension(tenant): Extension<Tenant>,
    State(state): State<ServerState>,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<TableStats>, ServerError> {
    let today = Utc::now().date_naive();
    let month = query
        .month
        .unwrap_or_else(|| format!("{:04}-{:02}", today.year(), today.month()));

    let stats = state
        .engine
        .table_stats(tenant.id, Some(month), today)
        .await?;
    Ok(Json(stats))
}

#[derive(Serialize)]
pub struct GlobalStatsView {
    #[serde(flatten)]
    pub stats: TableStats,
    /// Player-of-the-month history, most recent first.
    pub awards: Vec<MonthlyAwardView>,
}

pub async fn global(
    Extension(tenant): Extension<Tenant>,
    State(state): State<ServerState>,
) -> Result<Json<GlobalStatsView>, ServerError> {
    let today = Utc::now().date_naive();
    let stats = state.engine.table_stats(tenant.id, None, today).await?;
    let awards = state
        .engine
        .monthly_award_history(tenant.id)
        .await?
        .into_iter()
        .map(|award| MonthlyAwardView {
            month: award.month,
            username: award.username,
            score: award.score,
        })
        .collect();

    Ok(Json(GlobalStatsView { stats, awards }))
}

/// Cumulative per-player chart data.
pub async fn progress(
    Extension(tenant): Extension<Tenant>,
    State(state): State<ServerState>,
) -> Result<Json<CumulativeSeries>, ServerError> {
    let series = state.engine.progress_series(tenant.id).await?;
    Ok(Json(series))
}
