//! Players table.
//!
//! Usernames are unique per tenant. `balance` is materialized: outside
//! of an explicit admin override it always equals the sum of `net`
//! across the player's participation rows.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub balance: i64,
    pub is_admin: bool,
    pub must_set_password: bool,
    pub avatar_ref: Option<String>,
    pub password_changed_at: Option<DateTime<Utc>>,
}

impl Player {
    /// A freshly provisioned player: no credentials yet, zero balance,
    /// forced through set-password on first login.
    pub fn new(tenant_id: Uuid, username: String, is_admin: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            username,
            password_hash: String::new(),
            balance: 0,
            is_admin,
            must_set_password: true,
            avatar_ref: None,
            password_changed_at: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "players")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub username: String,
    pub password_hash: String,
    pub balance: i64,
    pub is_admin: bool,
    pub must_set_password: bool,
    pub avatar_ref: Option<String>,
    pub password_changed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenants::Entity",
        from = "Column::TenantId",
        to = "super::tenants::Column::Id"
    )]
    Tenants,
}

impl Related<super::tenants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Player> for ActiveModel {
    fn from(player: &Player) -> Self {
        Self {
            id: ActiveValue::Set(player.id.to_string()),
            tenant_id: ActiveValue::Set(player.tenant_id.to_string()),
            username: ActiveValue::Set(player.username.clone()),
            password_hash: ActiveValue::Set(player.password_hash.clone()),
            balance: ActiveValue::Set(player.balance),
            is_admin: ActiveValue::Set(player.is_admin),
            must_set_password: ActiveValue::Set(player.must_set_password),
            avatar_ref: ActiveValue::Set(player.avatar_ref.clone()),
            password_changed_at: ActiveValue::Set(player.password_changed_at),
        }
    }
}

impl TryFrom<Model> for Player {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("player not exists".to_string()))?,
            tenant_id: Uuid::parse_str(&model.tenant_id)
                .map_err(|_| EngineError::KeyNotFound("tenant not exists".to_string()))?,
            username: model.username,
            password_hash: model.password_hash,
            balance: model.balance,
            is_admin: model.is_admin,
            must_set_password: model.must_set_password,
            avatar_ref: model.avatar_ref,
            password_changed_at: model.password_changed_at,
        })
    }
}
