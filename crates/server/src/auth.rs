//! Credential endpoints: first-login set-password and change-password.

use api_types::player::{ChangePassword, SetPassword};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{Player, Tenant};

use crate::{ServerError, password, server::ServerState};

fn check_strength(candidate: &str) -> Result<(), ServerError> {
    if candidate.len() < 8 {
        return Err(ServerError::Generic(
            "password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

/// First-login bootstrap: the only endpoint a player flagged
/// must-set-password can reach.
pub async fn set_password(
    Extension(tenant): Extension<Tenant>,
    Extension(player): Extension<Player>,
    State(state): State<ServerState>,
    Json(payload): Json<SetPassword>,
) -> Result<StatusCode, ServerError> {
    check_strength(&payload.password)?;

    let hash = password::hash_password(&payload.password)?;
    state
        .engine
        .set_password(tenant.id, &player.username, &hash)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_password(
    Extension(tenant): Extension<Tenant>,
    Extension(player): Extension<Player>,
    State(state): State<ServerState>,
    Json(payload): Json<ChangePassword>,
) -> Result<StatusCode, ServerError> {
    if !password::verify_password(&payload.current_password, &player.password_hash) {
        return Err(ServerError::Generic(
            "current password is incorrect".to_string(),
        ));
    }
    check_strength(&payload.new_password)?;

    let hash = password::hash_password(&payload.new_password)?;
    state
        .engine
        .set_password(tenant.id, &player.username, &hash)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
