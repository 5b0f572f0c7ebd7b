//! Audit log viewer, admin-only.

use api_types::audit::{AuditEntryView, AuditQuery};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use engine::{Player, Tenant};

use crate::{ServerError, players, server::ServerState};

const DEFAULT_LIMIT: u64 = 50;
const MAX_LIMIT: u64 = 500;

pub async fn list(
    Extension(tenant): Extension<Tenant>,
    Extension(actor): Extension<Player>,
    State(state): State<ServerState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntryView>>, ServerError> {
    players::require_admin(&actor)?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let entries = state.engine.list_audit(tenant.id, limit).await?;

    Ok(Json(
        entries
            .into_iter()
            .map(|entry| AuditEntryView {
                actor: entry.actor,
                action: entry.action,
                target: entry.target,
                ip: entry.ip,
                timestamp: entry.timestamp,
            })
            .collect(),
    ))
}
