//! Tenant directory and provisioning.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    AuditEntry, EngineError, Player, ResultEngine, Tenant, audit, players, tenants,
};

use super::{Engine, normalize_tenant_name, normalize_username, with_tx};

impl Engine {
    /// Directory lookup: subdomain label to tenant. One query per call,
    /// no caching.
    pub async fn tenant_by_name(&self, name: &str) -> ResultEngine<Option<Tenant>> {
        let model = tenants::Entity::find()
            .filter(tenants::Column::Name.eq(name.to_string()))
            .one(&self.database)
            .await?;
        model.map(Tenant::try_from).transpose()
    }

    /// List all tenants, newest first. Operator-scope only.
    pub async fn list_tenants(&self) -> ResultEngine<Vec<Tenant>> {
        let models = tenants::Entity::find()
            .order_by_desc(tenants::Column::CreatedAt)
            .all(&self.database)
            .await?;
        let mut out = Vec::with_capacity(models.len());
        for model in models {
            out.push(Tenant::try_from(model)?);
        }
        Ok(out)
    }

    /// Provision a tenant together with its first site admin.
    ///
    /// The admin gets the supplied password hash but still goes through
    /// set-password on first login.
    pub async fn create_tenant(
        &self,
        name: &str,
        owner_id: Option<String>,
        site_admin_username: &str,
        site_admin_password_hash: &str,
        actor: &str,
    ) -> ResultEngine<Tenant> {
        let name = normalize_tenant_name(name)?;
        let admin_username = normalize_username(site_admin_username)?;

        let tenant = Tenant::new(name.clone(), owner_id);
        let mut admin = Player::new(tenant.id, admin_username.clone(), true);
        admin.password_hash = site_admin_password_hash.to_string();

        with_tx!(self, |db_tx| {
            let exists = tenants::Entity::find()
                .filter(tenants::Column::Name.eq(name.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name.clone()));
            }

            tenants::ActiveModel::from(&tenant).insert(&db_tx).await?;
            players::ActiveModel::from(&admin).insert(&db_tx).await?;

            let entry = AuditEntry::new(
                tenant.id,
                actor.to_string(),
                format!("Provisioned tenant \"{name}\" with site admin {admin_username}"),
                Some(admin_username.clone()),
                None,
            );
            audit::ActiveModel::from(&entry).insert(&db_tx).await?;

            Ok(())
        })?;

        tracing::info!(tenant = %name, "tenant provisioned");
        Ok(tenant)
    }

    /// Delete a tenant and every row scoped to it.
    ///
    /// FKs do not all declare ON DELETE CASCADE, so the cascade is
    /// explicit and runs inside one DB transaction.
    pub async fn delete_tenant(&self, name: &str) -> ResultEngine<()> {
        let name = normalize_tenant_name(name)?;

        let tenant_id: Uuid = with_tx!(self, |db_tx| {
            let tenant_model = tenants::Entity::find()
                .filter(tenants::Column::Name.eq(name.clone()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(name.clone()))?;
            let tenant = Tenant::try_from(tenant_model)?;
            let key = tenant.id.to_string();

            let backend = db_tx.get_database_backend();
            for table in [
                "game_players",
                "games",
                "players",
                "audit_log",
                "potm_history",
            ] {
                db_tx
                    .execute(Statement::from_sql_and_values(
                        backend,
                        format!("DELETE FROM {table} WHERE tenant_id = ?;"),
                        vec![key.clone().into()],
                    ))
                    .await?;
            }
            tenants::Entity::delete_by_id(key).exec(&db_tx).await?;

            Ok(tenant.id)
        })?;

        tracing::info!(tenant = %name, id = %tenant_id, "tenant deleted");
        Ok(())
    }
}
