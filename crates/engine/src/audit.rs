//! Audit log table.
//!
//! Append-only, tenant-scoped. One row per privileged mutation, written
//! in the same DB transaction as the mutation so it never records a
//! failed action. The application never updates or deletes rows here.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub actor: String,
    pub action: String,
    pub target: Option<String>,
    pub ip: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        tenant_id: Uuid,
        actor: String,
        action: String,
        target: Option<String>,
        ip: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            actor,
            action,
            target,
            ip,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub actor: String,
    pub action: String,
    pub target: Option<String>,
    pub ip: Option<String>,
    pub timestamp: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&AuditEntry> for ActiveModel {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            tenant_id: ActiveValue::Set(entry.tenant_id.to_string()),
            actor: ActiveValue::Set(entry.actor.clone()),
            action: ActiveValue::Set(entry.action.clone()),
            target: ActiveValue::Set(entry.target.clone()),
            ip: ActiveValue::Set(entry.ip.clone()),
            timestamp: ActiveValue::Set(entry.timestamp),
        }
    }
}

impl TryFrom<Model> for AuditEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("audit entry not exists".to_string()))?,
            tenant_id: Uuid::parse_str(&model.tenant_id)
                .map_err(|_| EngineError::KeyNotFound("tenant not exists".to_string()))?,
            actor: model.actor,
            action: model.action,
            target: model.target,
            ip: model.ip,
            timestamp: model.timestamp,
        })
    }
}
