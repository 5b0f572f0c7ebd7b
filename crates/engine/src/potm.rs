//! Player-of-the-month history table.
//!
//! At most one row per `(tenant, month)`; the insert is idempotent and
//! only happens when the monthly aggregation runs on the last day of
//! that month.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAward {
    pub tenant_id: Uuid,
    /// Calendar month key, `YYYY-MM`.
    pub month: String,
    pub username: String,
    pub score: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "potm_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub tenant_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub month: String,
    pub username: String,
    pub score: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&MonthlyAward> for ActiveModel {
    fn from(award: &MonthlyAward) -> Self {
        Self {
            tenant_id: ActiveValue::Set(award.tenant_id.to_string()),
            month: ActiveValue::Set(award.month.clone()),
            username: ActiveValue::Set(award.username.clone()),
            score: ActiveValue::Set(award.score),
        }
    }
}

impl TryFrom<Model> for MonthlyAward {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            tenant_id: Uuid::parse_str(&model.tenant_id)
                .map_err(|_| EngineError::KeyNotFound("tenant not exists".to_string()))?,
            month: model.month,
            username: model.username,
            score: model.score,
        })
    }
}
