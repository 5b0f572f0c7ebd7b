//! Player roster endpoints. Mutations are admin-only and audited.

use api_types::player::{AdminToggled, BalanceSet, PlayerNew, PlayerView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{EngineError, Player, Tenant};

use crate::{
    ServerError,
    server::{ClientIp, ServerState},
};

fn view(player: &Player) -> PlayerView {
    PlayerView {
        username: player.username.clone(),
        balance: player.balance,
        is_admin: player.is_admin,
        must_set_password: player.must_set_password,
        avatar_ref: player.avatar_ref.clone(),
    }
}

pub(crate) fn require_admin(player: &Player) -> Result<(), ServerError> {
    if player.is_admin {
        Ok(())
    } else {
        Err(ServerError::Engine(EngineError::Forbidden(
            "admin privileges required".to_string(),
        )))
    }
}

pub async fn list(
    Extension(tenant): Extension<Tenant>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<PlayerView>>, ServerError> {
    let players = state.engine.list_players(tenant.id).await?;
    Ok(Json(players.iter().map(view).collect()))
}

pub async fn create(
    Extension(tenant): Extension<Tenant>,
    Extension(actor): Extension<Player>,
    Extension(ip): Extension<ClientIp>,
    State(state): State<ServerState>,
    Json(payload): Json<PlayerNew>,
) -> Result<(StatusCode, Json<PlayerView>), ServerError> {
    require_admin(&actor)?;

    let player = state
        .engine
        .create_player(
            tenant.id,
            &payload.username,
            payload.is_admin,
            &actor.username,
            ip.0,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(view(&player))))
}

pub async fn remove(
    Extension(tenant): Extension<Tenant>,
    Extension(actor): Extension<Player>,
    Extension(ip): Extension<ClientIp>,
    State(state): State<ServerState>,
    Path(username): Path<String>,
) -> Result<StatusCode, ServerError> {
    require_admin(&actor)?;

    state
        .engine
        .delete_player(tenant.id, &username, &actor.username, ip.0)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_admin(
    Extension(tenant): Extension<Tenant>,
    Extension(actor): Extension<Player>,
    Extension(ip): Extension<ClientIp>,
    State(state): State<ServerState>,
    Path(username): Path<String>,
) -> Result<Json<AdminToggled>, ServerError> {
    require_admin(&actor)?;

    let is_admin = state
        .engine
        .toggle_admin(tenant.id, &username, &actor.username, ip.0)
        .await?;

    Ok(Json(AdminToggled { username, is_admin }))
}

pub async fn set_balance(
    Extension(tenant): Extension<Tenant>,
    Extension(actor): Extension<Player>,
    Extension(ip): Extension<ClientIp>,
    State(state): State<ServerState>,
    Path(username): Path<String>,
    Json(payload): Json<BalanceSet>,
) -> Result<StatusCode, ServerError> {
    require_admin(&actor)?;

    state
        .engine
        .set_balance(tenant.id, &username, payload.balance, &actor.username, ip.0)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn reset_password(
    Extension(tenant): Extension<Tenant>,
    Extension(actor): Extension<Player>,
    Extension(ip): Extension<ClientIp>,
    State(state): State<ServerState>,
    Path(username): Path<String>,
) -> Result<StatusCode, ServerError> {
    require_admin(&actor)?;

    state
        .engine
        .reset_password(tenant.id, &username, &actor.username, ip.0)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
