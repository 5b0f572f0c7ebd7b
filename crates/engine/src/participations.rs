//! Game participations table (`game_players`).
//!
//! One row per `(game, username)`. `net = cashout - buyin * (1 + rebuys)`
//! against the participant's own cost; nets across a game need not sum
//! to zero. The username is kept verbatim even if the player row is
//! later deleted, so the historical ledger stays intact.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    pub id: Uuid,
    pub game_id: Uuid,
    pub tenant_id: Uuid,
    /// Submission order within the game; the winner tie-break and all
    /// insertion-order iteration rely on it.
    pub seat: i64,
    pub username: String,
    pub buyin: i64,
    pub rebuys: i64,
    pub cashout: i64,
    pub net: i64,
}

impl Participation {
    /// Settle one seat: the participant paid `buyin * (1 + rebuys)` and
    /// walked away with `cashout`.
    pub fn settle(
        game_id: Uuid,
        tenant_id: Uuid,
        seat: i64,
        username: String,
        buyin: i64,
        rebuys: i64,
        cashout: i64,
    ) -> Self {
        let net = cashout - buyin * (1 + rebuys);
        Self {
            id: Uuid::new_v4(),
            game_id,
            tenant_id,
            seat,
            username,
            buyin,
            rebuys,
            cashout,
            net,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "game_players")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub game_id: String,
    pub tenant_id: String,
    pub seat: i64,
    pub username: String,
    pub buyin: i64,
    pub rebuys: i64,
    pub cashout: i64,
    pub net: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::games::Entity",
        from = "Column::GameId",
        to = "super::games::Column::Id"
    )]
    Games,
}

impl Related<super::games::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Games.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Participation> for ActiveModel {
    fn from(p: &Participation) -> Self {
        Self {
            id: ActiveValue::Set(p.id.to_string()),
            game_id: ActiveValue::Set(p.game_id.to_string()),
            tenant_id: ActiveValue::Set(p.tenant_id.to_string()),
            seat: ActiveValue::Set(p.seat),
            username: ActiveValue::Set(p.username.clone()),
            buyin: ActiveValue::Set(p.buyin),
            rebuys: ActiveValue::Set(p.rebuys),
            cashout: ActiveValue::Set(p.cashout),
            net: ActiveValue::Set(p.net),
        }
    }
}

impl TryFrom<Model> for Participation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("participation not exists".to_string()))?,
            game_id: Uuid::parse_str(&model.game_id)
                .map_err(|_| EngineError::KeyNotFound("game not exists".to_string()))?,
            tenant_id: Uuid::parse_str(&model.tenant_id)
                .map_err(|_| EngineError::KeyNotFound("tenant not exists".to_string()))?,
            seat: model.seat,
            username: model.username,
            buyin: model.buyin,
            rebuys: model.rebuys,
            cashout: model.cashout,
            net: model.net,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_subtracts_buyin_and_rebuys() {
        let p = Participation::settle(Uuid::new_v4(), Uuid::new_v4(), 0, "a".into(), 100, 2, 450);
        assert_eq!(p.net, 450 - 300);
    }

    #[test]
    fn net_can_be_negative() {
        let p = Participation::settle(Uuid::new_v4(), Uuid::new_v4(), 0, "a".into(), 100, 0, 40);
        assert_eq!(p.net, -60);
    }
}
