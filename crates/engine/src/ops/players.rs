//! Account store operations: player CRUD, credentials, admin flags.
//!
//! Every admin-privileged mutation writes its audit row inside the same
//! DB transaction; nothing is audited on failure.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{AuditEntry, EngineError, Player, ResultEngine, audit, players};

use super::{Engine, normalize_username, with_tx};

impl Engine {
    pub async fn player_by_username(
        &self,
        tenant_id: Uuid,
        username: &str,
    ) -> ResultEngine<Option<Player>> {
        let model = players::Entity::find()
            .filter(players::Column::TenantId.eq(tenant_id.to_string()))
            .filter(players::Column::Username.eq(username.to_string()))
            .one(&self.database)
            .await?;
        model.map(Player::try_from).transpose()
    }

    pub async fn list_players(&self, tenant_id: Uuid) -> ResultEngine<Vec<Player>> {
        let models = players::Entity::find()
            .filter(players::Column::TenantId.eq(tenant_id.to_string()))
            .order_by_asc(players::Column::Username)
            .all(&self.database)
            .await?;
        let mut out = Vec::with_capacity(models.len());
        for model in models {
            out.push(Player::try_from(model)?);
        }
        Ok(out)
    }

    /// Admin-create a player: no credentials, forced through
    /// set-password on first login.
    pub async fn create_player(
        &self,
        tenant_id: Uuid,
        username: &str,
        is_admin: bool,
        actor: &str,
        ip: Option<String>,
    ) -> ResultEngine<Player> {
        let username = normalize_username(username)?;
        let player = Player::new(tenant_id, username.clone(), is_admin);

        with_tx!(self, |db_tx| {
            let exists = players::Entity::find()
                .filter(players::Column::TenantId.eq(tenant_id.to_string()))
                .filter(players::Column::Username.eq(username.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(username.clone()));
            }

            players::ActiveModel::from(&player).insert(&db_tx).await?;

            let entry = AuditEntry::new(
                tenant_id,
                actor.to_string(),
                format!("Created player {username}"),
                Some(username.clone()),
                ip.clone(),
            );
            audit::ActiveModel::from(&entry).insert(&db_tx).await?;

            Ok(())
        })?;

        Ok(player)
    }

    /// Delete a player. Historical game and participation rows keep the
    /// username on purpose; only the account row goes away.
    pub async fn delete_player(
        &self,
        tenant_id: Uuid,
        username: &str,
        actor: &str,
        ip: Option<String>,
    ) -> ResultEngine<()> {
        if username == actor {
            return Err(EngineError::Forbidden(
                "cannot delete your own account".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let model = players::Entity::find()
                .filter(players::Column::TenantId.eq(tenant_id.to_string()))
                .filter(players::Column::Username.eq(username.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(username.to_string()))?;

            players::Entity::delete_by_id(model.id).exec(&db_tx).await?;

            let entry = AuditEntry::new(
                tenant_id,
                actor.to_string(),
                format!("Deleted player {username}"),
                Some(username.to_string()),
                ip,
            );
            audit::ActiveModel::from(&entry).insert(&db_tx).await?;

            Ok(())
        })
    }

    /// Flip a player's admin flag; returns the new value.
    pub async fn toggle_admin(
        &self,
        tenant_id: Uuid,
        username: &str,
        actor: &str,
        ip: Option<String>,
    ) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            let model = players::Entity::find()
                .filter(players::Column::TenantId.eq(tenant_id.to_string()))
                .filter(players::Column::Username.eq(username.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(username.to_string()))?;

            let new_status = !model.is_admin;
            let mut player: players::ActiveModel = model.into();
            player.is_admin = ActiveValue::Set(new_status);
            player.update(&db_tx).await?;

            let entry = AuditEntry::new(
                tenant_id,
                actor.to_string(),
                format!("Set admin={new_status} for {username}"),
                Some(username.to_string()),
                ip,
            );
            audit::ActiveModel::from(&entry).insert(&db_tx).await?;

            Ok(new_status)
        })
    }

    /// Store a new password hash and clear the must-set-password flag.
    /// Self-service, so not audited.
    pub async fn set_password(
        &self,
        tenant_id: Uuid,
        username: &str,
        password_hash: &str,
    ) -> ResultEngine<()> {
        if password_hash.is_empty() {
            return Err(EngineError::InvalidInput(
                "password hash must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let model = players::Entity::find()
                .filter(players::Column::TenantId.eq(tenant_id.to_string()))
                .filter(players::Column::Username.eq(username.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(username.to_string()))?;

            let mut player: players::ActiveModel = model.into();
            player.password_hash = ActiveValue::Set(password_hash.to_string());
            player.must_set_password = ActiveValue::Set(false);
            player.password_changed_at = ActiveValue::Set(Some(Utc::now()));
            player.update(&db_tx).await?;

            Ok(())
        })
    }

    /// Admin reset: wipe the credentials and force set-password again.
    pub async fn reset_password(
        &self,
        tenant_id: Uuid,
        username: &str,
        actor: &str,
        ip: Option<String>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = players::Entity::find()
                .filter(players::Column::TenantId.eq(tenant_id.to_string()))
                .filter(players::Column::Username.eq(username.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(username.to_string()))?;

            let mut player: players::ActiveModel = model.into();
            player.password_hash = ActiveValue::Set(String::new());
            player.must_set_password = ActiveValue::Set(true);
            player.update(&db_tx).await?;

            let entry = AuditEntry::new(
                tenant_id,
                actor.to_string(),
                format!("Reset password for {username}"),
                Some(username.to_string()),
                ip,
            );
            audit::ActiveModel::from(&entry).insert(&db_tx).await?;

            Ok(())
        })
    }

    /// Admin override of the materialized balance. Breaks the
    /// balance-equals-sum-of-nets invariant by definition, which is why
    /// the audit row records both values.
    pub async fn set_balance(
        &self,
        tenant_id: Uuid,
        username: &str,
        balance: i64,
        actor: &str,
        ip: Option<String>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = players::Entity::find()
                .filter(players::Column::TenantId.eq(tenant_id.to_string()))
                .filter(players::Column::Username.eq(username.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(username.to_string()))?;

            let old_balance = model.balance;
            let mut player: players::ActiveModel = model.into();
            player.balance = ActiveValue::Set(balance);
            player.update(&db_tx).await?;

            let entry = AuditEntry::new(
                tenant_id,
                actor.to_string(),
                format!("Balance override for {username}: {old_balance} -> {balance}"),
                Some(username.to_string()),
                ip,
            );
            audit::ActiveModel::from(&entry).insert(&db_tx).await?;

            Ok(())
        })
    }
}
