//! Game settlement and admin corrections.
//!
//! Settlement is the only multi-row write in the system: one game row,
//! one participation row per seat, one balance update per player and
//! the derived winner fields all commit in a single DB transaction.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::Expr,
};
use uuid::Uuid;

use crate::{
    AuditEntry, EngineError, Game, Participation, ResultEngine, audit, games, participations,
    players,
};

use super::{Engine, with_tx};

/// One seat in a settlement request.
#[derive(Clone, Debug)]
pub struct SeatEntry {
    pub username: String,
    pub cashout: i64,
    pub rebuys: i64,
}

/// Inputs for settling one finished session.
#[derive(Clone, Debug)]
pub struct SettlementCmd {
    pub tenant_id: Uuid,
    pub date: NaiveDate,
    pub buyin: i64,
    pub seats: Vec<SeatEntry>,
    /// Admin recording the game; written to the audit log.
    pub actor: String,
    pub ip: Option<String>,
}

/// Admin correction of one participation row.
#[derive(Clone, Debug)]
pub struct CorrectionCmd {
    pub tenant_id: Uuid,
    pub game_id: Uuid,
    pub username: String,
    pub cashout: i64,
    pub rebuys: i64,
    pub actor: String,
    pub ip: Option<String>,
}

/// Pick the winning seat: strictly greatest net, first seen wins ties.
fn pick_winner(parts: &[Participation]) -> Option<(&str, i64)> {
    let mut best: Option<(&str, i64)> = None;
    for p in parts {
        match best {
            Some((_, net)) if p.net <= net => {}
            _ => best = Some((&p.username, p.net)),
        }
    }
    best
}

impl Engine {
    /// Settle a finished game: validate, then atomically write the game,
    /// its participations, the balance updates and the derived winner
    /// fields. Any validation failure rejects the whole settlement with
    /// no partial writes.
    pub async fn settle_game(&self, cmd: SettlementCmd) -> ResultEngine<Uuid> {
        if cmd.buyin <= 0 {
            return Err(EngineError::InvalidInput(
                "buy-in must be a positive amount".to_string(),
            ));
        }
        if cmd.seats.is_empty() {
            return Err(EngineError::InvalidInput(
                "at least one player must be selected".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        let mut total_rebuys: i64 = 0;
        let mut total_cashout: i64 = 0;
        for seat in &cmd.seats {
            if !seen.insert(seat.username.as_str()) {
                return Err(EngineError::InvalidInput(format!(
                    "{} is seated more than once",
                    seat.username
                )));
            }
            if seat.cashout < 0 {
                return Err(EngineError::InvalidInput(format!(
                    "cash-out for {} must not be negative",
                    seat.username
                )));
            }
            if seat.rebuys < 0 {
                return Err(EngineError::InvalidInput(format!(
                    "rebuys for {} must not be negative",
                    seat.username
                )));
            }
            total_rebuys = total_rebuys
                .checked_add(seat.rebuys)
                .ok_or_else(|| EngineError::InvalidInput("rebuys are too large".to_string()))?;
            total_cashout = total_cashout.checked_add(seat.cashout).ok_or_else(|| {
                EngineError::InvalidInput("cash-out amounts are too large".to_string())
            })?;
        }
        // Conservation cap: the table cannot pay out more than went in.
        // Equality is allowed.
        let cap = (cmd.seats.len() as i64)
            .checked_add(total_rebuys)
            .and_then(|stakes| cmd.buyin.checked_mul(stakes))
            .ok_or_else(|| {
                EngineError::InvalidInput("amounts on the table are too large".to_string())
            })?;
        if total_cashout > cap {
            return Err(EngineError::InvalidInput(format!(
                "total cash-out {total_cashout} exceeds money on the table {cap}"
            )));
        }

        let tenant_key = cmd.tenant_id.to_string();
        let game_id = Uuid::new_v4();

        with_tx!(self, |db_tx| {
            // Every seat must belong to an existing player of this tenant.
            let mut parts: Vec<Participation> = Vec::with_capacity(cmd.seats.len());
            for (index, seat) in cmd.seats.iter().enumerate() {
                let known = players::Entity::find()
                    .filter(players::Column::TenantId.eq(tenant_key.clone()))
                    .filter(players::Column::Username.eq(seat.username.clone()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if !known {
                    return Err(EngineError::KeyNotFound(seat.username.clone()));
                }
                parts.push(Participation::settle(
                    game_id,
                    cmd.tenant_id,
                    index as i64,
                    seat.username.clone(),
                    cmd.buyin,
                    seat.rebuys,
                    seat.cashout,
                ));
            }

            let (winner, amount) = pick_winner(&parts)
                .map(|(name, net)| (name.to_string(), net))
                .unwrap_or_default();

            let game = Game {
                id: game_id,
                tenant_id: cmd.tenant_id,
                date: cmd.date,
                buyin: cmd.buyin,
                winner,
                amount,
                rebuys: total_rebuys,
            };
            games::ActiveModel::from(&game).insert(&db_tx).await?;

            for part in &parts {
                participations::ActiveModel::from(part)
                    .insert(&db_tx)
                    .await?;
                players::Entity::update_many()
                    .col_expr(
                        players::Column::Balance,
                        Expr::col(players::Column::Balance).add(part.net),
                    )
                    .filter(players::Column::TenantId.eq(tenant_key.clone()))
                    .filter(players::Column::Username.eq(part.username.clone()))
                    .exec(&db_tx)
                    .await?;
            }

            let entry = AuditEntry::new(
                cmd.tenant_id,
                cmd.actor.clone(),
                format!(
                    "Settled game on {}: buyin={}, seats={}",
                    cmd.date,
                    cmd.buyin,
                    parts.len()
                ),
                None,
                cmd.ip.clone(),
            );
            audit::ActiveModel::from(&entry).insert(&db_tx).await?;

            Ok(game_id)
        })
    }

    /// Patch one participation row and re-derive everything that depends
    /// on it: the player's balance delta, and the game's winner, amount
    /// and total rebuys.
    pub async fn correct_participation(&self, cmd: CorrectionCmd) -> ResultEngine<()> {
        if cmd.cashout < 0 || cmd.rebuys < 0 {
            return Err(EngineError::InvalidInput(
                "cash-out and rebuys must not be negative".to_string(),
            ));
        }

        let tenant_key = cmd.tenant_id.to_string();
        let game_key = cmd.game_id.to_string();

        with_tx!(self, |db_tx| {
            let game_model = games::Entity::find_by_id(game_key.clone())
                .filter(games::Column::TenantId.eq(tenant_key.clone()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("game not exists".to_string()))?;

            let part_model = participations::Entity::find()
                .filter(participations::Column::GameId.eq(game_key.clone()))
                .filter(participations::Column::Username.eq(cmd.username.clone()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("player not in this game".to_string()))?;

            let old_net = part_model.net;
            let stake = cmd
                .rebuys
                .checked_add(1)
                .and_then(|stakes| game_model.buyin.checked_mul(stakes))
                .ok_or_else(|| EngineError::InvalidInput("rebuys are too large".to_string()))?;
            let new_net = cmd.cashout - stake;

            let mut part: participations::ActiveModel = part_model.into();
            part.cashout = ActiveValue::Set(cmd.cashout);
            part.rebuys = ActiveValue::Set(cmd.rebuys);
            part.net = ActiveValue::Set(new_net);
            part.update(&db_tx).await?;

            players::Entity::update_many()
                .col_expr(
                    players::Column::Balance,
                    Expr::col(players::Column::Balance).add(new_net - old_net),
                )
                .filter(players::Column::TenantId.eq(tenant_key.clone()))
                .filter(players::Column::Username.eq(cmd.username.clone()))
                .exec(&db_tx)
                .await?;

            // Re-derive winner/amount/rebuys from the corrected rows, in
            // insertion order so the tie-break stays stable.
            let part_models = participations::Entity::find()
                .filter(participations::Column::GameId.eq(game_key.clone()))
                .order_by_asc(participations::Column::Seat)
                .all(&db_tx)
                .await?;
            let mut parts = Vec::with_capacity(part_models.len());
            for model in part_models {
                parts.push(Participation::try_from(model)?);
            }
            let (winner, amount) = pick_winner(&parts)
                .map(|(name, net)| (name.to_string(), net))
                .unwrap_or_default();
            let total_rebuys: i64 = parts.iter().map(|p| p.rebuys).sum();

            let mut game: games::ActiveModel = game_model.into();
            game.winner = ActiveValue::Set(winner);
            game.amount = ActiveValue::Set(amount);
            game.rebuys = ActiveValue::Set(total_rebuys);
            game.update(&db_tx).await?;

            let entry = AuditEntry::new(
                cmd.tenant_id,
                cmd.actor.clone(),
                format!(
                    "Corrected game {}: {} cashout={}, rebuys={}, net={}",
                    cmd.game_id, cmd.username, cmd.cashout, cmd.rebuys, new_net
                ),
                Some(cmd.username.clone()),
                cmd.ip.clone(),
            );
            audit::ActiveModel::from(&entry).insert(&db_tx).await?;

            Ok(())
        })
    }

    /// Return a game with its participation rows in insertion order.
    pub async fn game(
        &self,
        tenant_id: Uuid,
        game_id: Uuid,
    ) -> ResultEngine<(Game, Vec<Participation>)> {
        let game_model = games::Entity::find_by_id(game_id.to_string())
            .filter(games::Column::TenantId.eq(tenant_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("game not exists".to_string()))?;
        let game = Game::try_from(game_model)?;

        let part_models = participations::Entity::find()
            .filter(participations::Column::GameId.eq(game_id.to_string()))
            .order_by_asc(participations::Column::Seat)
            .all(&self.database)
            .await?;
        let mut parts = Vec::with_capacity(part_models.len());
        for model in part_models {
            parts.push(Participation::try_from(model)?);
        }

        Ok((game, parts))
    }

    /// List a tenant's games, newest first.
    pub async fn list_games(&self, tenant_id: Uuid) -> ResultEngine<Vec<Game>> {
        let models = games::Entity::find()
            .filter(games::Column::TenantId.eq(tenant_id.to_string()))
            .order_by_desc(games::Column::Date)
            .all(&self.database)
            .await?;
        let mut out = Vec::with_capacity(models.len());
        for model in models {
            out.push(Game::try_from(model)?);
        }
        Ok(out)
    }
}
