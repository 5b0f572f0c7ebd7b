//! Audit log reads. Writes happen inside the mutating operations.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use crate::{AuditEntry, ResultEngine, audit};

use super::Engine;

impl Engine {
    /// Most recent audit entries for one tenant, newest first.
    pub async fn list_audit(&self, tenant_id: Uuid, limit: u64) -> ResultEngine<Vec<AuditEntry>> {
        let models = audit::Entity::find()
            .filter(audit::Column::TenantId.eq(tenant_id.to_string()))
            .order_by_desc(audit::Column::Timestamp)
            .limit(limit)
            .all(&self.database)
            .await?;
        let mut out = Vec::with_capacity(models.len());
        for model in models {
            out.push(AuditEntry::try_from(model)?);
        }
        Ok(out)
    }
}
