//! Tenants table.
//!
//! A tenant is one poker group, addressed by its subdomain slug. Every
//! other table is scoped by `tenant_id`; deleting a tenant cascades to
//! all of its rows.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// A poker group, keyed by its subdomain-safe slug.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    pub fn new(name: String, owner_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            owner_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub owner_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::players::Entity")]
    Players,
    #[sea_orm(has_many = "super::games::Entity")]
    Games,
}

impl Related<super::players::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Players.def()
    }
}

impl Related<super::games::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Games.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Tenant> for ActiveModel {
    fn from(tenant: &Tenant) -> Self {
        Self {
            id: ActiveValue::Set(tenant.id.to_string()),
            name: ActiveValue::Set(tenant.name.clone()),
            owner_id: ActiveValue::Set(tenant.owner_id.clone()),
            created_at: ActiveValue::Set(tenant.created_at),
        }
    }
}

impl TryFrom<Model> for Tenant {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("tenant not exists".to_string()))?,
            name: model.name,
            owner_id: model.owner_id,
            created_at: model.created_at,
        })
    }
}
