//! Operator-scope tenant directory endpoints.

use api_types::tenant::{TenantNew, TenantView};
use axum::{Json, extract::Path, extract::State, http::StatusCode};

use crate::{ServerError, password, server::ServerState};

fn view(tenant: &engine::Tenant) -> TenantView {
    TenantView {
        id: tenant.id,
        name: tenant.name.clone(),
        owner_id: tenant.owner_id.clone(),
        created_at: tenant.created_at,
    }
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<TenantView>>, ServerError> {
    let tenants = state.engine.list_tenants().await?;
    Ok(Json(tenants.iter().map(view).collect()))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TenantNew>,
) -> Result<(StatusCode, Json<TenantView>), ServerError> {
    let valid_admin = (3..=30).contains(&payload.admin_username.len())
        && payload
            .admin_username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_admin {
        return Err(ServerError::Generic(
            "admin username must be 3-30 chars of letters, digits or underscore".to_string(),
        ));
    }
    if payload.admin_password.len() < 8 {
        return Err(ServerError::Generic(
            "admin password must be at least 8 characters".to_string(),
        ));
    }

    let hash = password::hash_password(&payload.admin_password)?;
    let tenant = state
        .engine
        .create_tenant(
            &payload.name,
            payload.owner_id,
            &payload.admin_username,
            &hash,
            &state.config.operator_username,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(view(&tenant))))
}

pub async fn remove(
    State(state): State<ServerState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_tenant(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
