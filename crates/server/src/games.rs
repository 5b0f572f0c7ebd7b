//! Ledger endpoints: settlement, listing, corrections.

use api_types::game::{
    GameCreated, GameDefaults, GameDetail, GameNew, GameView, SeatCorrection, SeatView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{CorrectionCmd, Game, Participation, Player, SeatEntry, SettlementCmd, Tenant};
use uuid::Uuid;

use crate::{
    ServerError, players,
    server::{ClientIp, ServerState},
};

fn game_view(game: &Game) -> GameView {
    GameView {
        id: game.id,
        date: game.date,
        buyin: game.buyin,
        winner: game.winner.clone(),
        amount: game.amount,
        rebuys: game.rebuys,
    }
}

fn seat_view(part: &Participation) -> SeatView {
    SeatView {
        username: part.username.clone(),
        buyin: part.buyin,
        rebuys: part.rebuys,
        cashout: part.cashout,
        net: part.net,
    }
}

/// Settle a finished game. Seat order in the payload is preserved and
/// breaks winner ties.
pub async fn create(
    Extension(tenant): Extension<Tenant>,
    Extension(actor): Extension<Player>,
    Extension(ip): Extension<ClientIp>,
    State(state): State<ServerState>,
    Json(payload): Json<GameNew>,
) -> Result<(StatusCode, Json<GameCreated>), ServerError> {
    players::require_admin(&actor)?;

    let seats = payload
        .seats
        .into_iter()
        .map(|seat| SeatEntry {
            username: seat.username,
            cashout: seat.cashout,
            rebuys: seat.rebuys,
        })
        .collect();
    let id = state
        .engine
        .settle_game(SettlementCmd {
            tenant_id: tenant.id,
            date: payload.date,
            buyin: payload.buyin,
            seats,
            actor: actor.username,
            ip: ip.0,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(GameCreated { id })))
}

pub async fn list(
    Extension(tenant): Extension<Tenant>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<GameView>>, ServerError> {
    let games = state.engine.list_games(tenant.id).await?;
    Ok(Json(games.iter().map(game_view).collect()))
}

pub async fn detail(
    Extension(tenant): Extension<Tenant>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameDetail>, ServerError> {
    let (game, seats) = state.engine.game(tenant.id, id).await?;
    Ok(Json(GameDetail {
        game: game_view(&game),
        seats: seats.iter().map(seat_view).collect(),
    }))
}

/// Patch one seat of a settled game and re-derive the dependent fields.
pub async fn correct(
    Extension(tenant): Extension<Tenant>,
    Extension(actor): Extension<Player>,
    Extension(ip): Extension<ClientIp>,
    State(state): State<ServerState>,
    Path((id, username)): Path<(Uuid, String)>,
    Json(payload): Json<SeatCorrection>,
) -> Result<Json<GameDetail>, ServerError> {
    players::require_admin(&actor)?;

    state
        .engine
        .correct_participation(CorrectionCmd {
            tenant_id: tenant.id,
            game_id: id,
            username,
            cashout: payload.cashout,
            rebuys: payload.rebuys,
            actor: actor.username,
            ip: ip.0,
        })
        .await?;

    let (game, seats) = state.engine.game(tenant.id, id).await?;
    Ok(Json(GameDetail {
        game: game_view(&game),
        seats: seats.iter().map(seat_view).collect(),
    }))
}

/// Pre-filled values for the new-game form.
pub async fn defaults(
    Extension(tenant): Extension<Tenant>,
    State(state): State<ServerState>,
) -> Result<Json<GameDefaults>, ServerError> {
    let roster = state
        .engine
        .list_players(tenant.id)
        .await?
        .into_iter()
        .map(|p| p.username)
        .collect();

    Ok(Json(GameDefaults {
        date: chrono::Utc::now().date_naive(),
        buyin: state.config.default_buyin,
        roster,
    }))
}
