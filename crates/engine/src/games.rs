//! Games table.
//!
//! One row per session. `winner`, `amount` and `rebuys` are derived
//! from the participation rows at settlement time and re-derived on
//! every admin correction:
//!
//! - `winner` is the username with the greatest `net` (first submitted
//!   wins ties)
//! - `amount` is that participant's `net`, not their cash-out
//! - `rebuys` is the sum of all participants' rebuys

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub date: NaiveDate,
    pub buyin: i64,
    pub winner: String,
    pub amount: i64,
    pub rebuys: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "games")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub date: Date,
    pub buyin: i64,
    pub winner: String,
    pub amount: i64,
    pub rebuys: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenants::Entity",
        from = "Column::TenantId",
        to = "super::tenants::Column::Id"
    )]
    Tenants,
    #[sea_orm(has_many = "super::participations::Entity")]
    Participations,
}

impl Related<super::tenants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenants.def()
    }
}

impl Related<super::participations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Game> for ActiveModel {
    fn from(game: &Game) -> Self {
        Self {
            id: ActiveValue::Set(game.id.to_string()),
            tenant_id: ActiveValue::Set(game.tenant_id.to_string()),
            date: ActiveValue::Set(game.date),
            buyin: ActiveValue::Set(game.buyin),
            winner: ActiveValue::Set(game.winner.clone()),
            amount: ActiveValue::Set(game.amount),
            rebuys: ActiveValue::Set(game.rebuys),
        }
    }
}

impl TryFrom<Model> for Game {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("game not exists".to_string()))?,
            tenant_id: Uuid::parse_str(&model.tenant_id)
                .map_err(|_| EngineError::KeyNotFound("tenant not exists".to_string()))?,
            date: model.date,
            buyin: model.buyin,
            winner: model.winner,
            amount: model.amount,
            rebuys: model.rebuys,
        })
    }
}
