//! Aggregation engine: leaderboard, periodic stats, progress series.
//!
//! Everything is read-only and recomputed per call from the ledger; the
//! one write is the idempotent player-of-the-month history row. All
//! max/min picks use strict comparisons while iterating in insertion
//! order, so the first candidate seen wins ties.

use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    CumulativeSeries, EngineError, Game, LeaderboardRow, LeaderboardSort, MonthlyAward,
    Participation, PlayerReport, ResultEngine, TableStats, games, participations, players, potm,
    stats::{PlayerSeries, PotmPick, RoiPick, SessionRow, StatPick},
};

use super::{Engine, with_tx};

/// Parse a `YYYY-MM` key into the month's first day and the first day
/// of the following month.
fn month_bounds(month: &str) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let invalid = || EngineError::InvalidInput(format!("\"{month}\" is not a valid month"));
    let (year_s, month_s) = month.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year_s.parse().map_err(|_| invalid())?;
    let mon: u32 = month_s.parse().map_err(|_| invalid())?;
    let start = NaiveDate::from_ymd_opt(year, mon, 1).ok_or_else(invalid)?;
    let end = if mon == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, mon + 1, 1)
    }
    .ok_or_else(invalid)?;
    Ok((start, end))
}

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

fn is_last_day_of_month(date: NaiveDate) -> bool {
    match date.checked_add_days(Days::new(1)) {
        Some(next) => next.month() != date.month(),
        None => true,
    }
}

/// Per-player accumulator, kept in first-seen order.
#[derive(Default)]
struct Totals {
    games: i64,
    invested: i64,
    rebuys: i64,
    net: i64,
    biggest_win: i64,
    biggest_loss: i64,
}

impl Engine {
    /// Tenant-wide statistics, all-time (`month == None`) or scoped to
    /// one `YYYY-MM` calendar month.
    ///
    /// When the scoped month is the current one and `today` is its last
    /// day, the player-of-the-month pick is persisted once per
    /// `(tenant, month)`; repeated calls do not duplicate the row.
    pub async fn table_stats(
        &self,
        tenant_id: Uuid,
        month: Option<String>,
        today: NaiveDate,
    ) -> ResultEngine<TableStats> {
        let tenant_key = tenant_id.to_string();

        let mut query = games::Entity::find()
            .filter(games::Column::TenantId.eq(tenant_key.clone()))
            .order_by_asc(games::Column::Date);
        if let Some(ref m) = month {
            let (start, end) = month_bounds(m)?;
            query = query
                .filter(games::Column::Date.gte(start))
                .filter(games::Column::Date.lt(end));
        }
        let game_models = query.all(&self.database).await?;

        let mut window_games: Vec<Game> = Vec::with_capacity(game_models.len());
        for model in game_models {
            window_games.push(Game::try_from(model)?);
        }

        let mut out = TableStats {
            month: month.clone(),
            ..TableStats::default()
        };
        if window_games.is_empty() {
            return Ok(out);
        }

        out.total_games = window_games.len() as i64;
        out.total_money = window_games.iter().map(|g| g.amount).sum();
        out.avg_winner_profit = out.total_money as f64 / out.total_games as f64;

        // Biggest single win comes off the game rows (winner net).
        for game in &window_games {
            let better = out
                .biggest_single_win
                .as_ref()
                .is_none_or(|best| game.amount > best.value);
            if better {
                out.biggest_single_win = Some(StatPick {
                    username: game.winner.clone(),
                    value: game.amount,
                });
            }
        }

        // Wins per player and distinct winners.
        let mut wins: Vec<(String, i64)> = Vec::new();
        for game in &window_games {
            match wins.iter_mut().find(|(name, _)| *name == game.winner) {
                Some((_, count)) => *count += 1,
                None => wins.push((game.winner.clone(), 1)),
            }
        }
        out.unique_winners = wins.len() as i64;
        for (name, count) in &wins {
            let better = out.most_wins.as_ref().is_none_or(|best| *count > best.value);
            if better {
                out.most_wins = Some(StatPick {
                    username: name.clone(),
                    value: *count,
                });
            }
        }

        // Participation rows, ordered by game then seat so folds see
        // players in submission order.
        let game_order: HashMap<String, usize> = window_games
            .iter()
            .enumerate()
            .map(|(i, g)| (g.id.to_string(), i))
            .collect();
        let part_models = participations::Entity::find()
            .filter(participations::Column::TenantId.eq(tenant_key.clone()))
            .filter(
                participations::Column::GameId
                    .is_in(game_order.keys().cloned().collect::<Vec<_>>()),
            )
            .all(&self.database)
            .await?;
        let mut parts: Vec<Participation> = Vec::with_capacity(part_models.len());
        for model in part_models {
            parts.push(Participation::try_from(model)?);
        }
        parts.sort_by_key(|p| {
            (
                game_order.get(&p.game_id.to_string()).copied().unwrap_or(0),
                p.seat,
            )
        });

        let mut order: Vec<String> = Vec::new();
        let mut totals: HashMap<String, Totals> = HashMap::new();
        for part in &parts {
            let entry = totals.entry(part.username.clone()).or_insert_with(|| {
                order.push(part.username.clone());
                Totals::default()
            });
            entry.games += 1;
            entry.invested += part.buyin * (1 + part.rebuys);
            entry.rebuys += part.rebuys;
            entry.net += part.net;
            if part.net > entry.biggest_win {
                entry.biggest_win = part.net;
            }
            if part.net < entry.biggest_loss {
                entry.biggest_loss = part.net;
            }

            let worse = out
                .worst_single_loss
                .as_ref()
                .is_none_or(|worst| part.net < worst.value);
            if worse {
                out.worst_single_loss = Some(StatPick {
                    username: part.username.clone(),
                    value: part.net,
                });
            }
        }

        for name in &order {
            let Some(t) = totals.get(name) else { continue };
            let roi = if t.invested > 0 {
                t.net as f64 / t.invested as f64 * 100.0
            } else {
                0.0
            };

            if out.top_earner.as_ref().is_none_or(|p| t.net > p.value) {
                out.top_earner = Some(StatPick {
                    username: name.clone(),
                    value: t.net,
                });
            }
            if out.top_loser.as_ref().is_none_or(|p| t.net < p.value) {
                out.top_loser = Some(StatPick {
                    username: name.clone(),
                    value: t.net,
                });
            }
            if out.most_rebuys.as_ref().is_none_or(|p| t.rebuys > p.value) {
                out.most_rebuys = Some(StatPick {
                    username: name.clone(),
                    value: t.rebuys,
                });
            }
            if t.invested > 0 && out.best_roi.as_ref().is_none_or(|p| roi > p.roi) {
                out.best_roi = Some(RoiPick {
                    username: name.clone(),
                    roi,
                });
            }
            if t.games >= 3
                && out
                    .most_consistent
                    .as_ref()
                    .is_none_or(|p| t.net.abs() < p.value)
            {
                out.most_consistent = Some(StatPick {
                    username: name.clone(),
                    value: t.net.abs(),
                });
            }
            if t.net > 0
                && t.rebuys >= 2
                && out.comeback.as_ref().is_none_or(|p| t.net > p.value)
            {
                out.comeback = Some(StatPick {
                    username: name.clone(),
                    value: t.net,
                });
            }
            if out.most_games.as_ref().is_none_or(|p| t.games > p.value) {
                out.most_games = Some(StatPick {
                    username: name.clone(),
                    value: t.games,
                });
            }

            let score = t.net as f64 + roi * 2.0 + t.games as f64 * 5.0 - t.rebuys as f64 * 2.0;
            if out
                .player_of_month
                .as_ref()
                .is_none_or(|p| score > p.score)
            {
                out.player_of_month = Some(PotmPick {
                    username: name.clone(),
                    score,
                });
            }

            out.per_player.push(crate::PlayerTotals {
                username: name.clone(),
                games: t.games,
                invested: t.invested,
                rebuys: t.rebuys,
                net: t.net,
                roi,
                biggest_win: t.biggest_win,
                biggest_loss: t.biggest_loss,
            });
        }

        let mut earners = out.per_player.clone();
        earners.sort_by(|a, b| b.net.cmp(&a.net));
        out.top_earners = earners
            .into_iter()
            .take(5)
            .map(|t| StatPick {
                username: t.username,
                value: t.net,
            })
            .collect();

        // Persist the monthly award once, on the month's last day.
        if let (Some(m), Some(pick)) = (&month, &out.player_of_month)
            && *m == month_key(today)
            && is_last_day_of_month(today)
        {
            self.record_monthly_award(tenant_id, m, pick).await?;
        }

        Ok(out)
    }

    async fn monthly_award_exists(&self, tenant_key: &str, month: &str) -> ResultEngine<bool> {
        Ok(potm::Entity::find_by_id((tenant_key.to_string(), month.to_string()))
            .one(&self.database)
            .await?
            .is_some())
    }

    async fn record_monthly_award(
        &self,
        tenant_id: Uuid,
        month: &str,
        pick: &PotmPick,
    ) -> ResultEngine<()> {
        let tenant_key = tenant_id.to_string();
        if self.monthly_award_exists(&tenant_key, month).await? {
            return Ok(());
        }

        let award = MonthlyAward {
            tenant_id,
            month: month.to_string(),
            username: pick.username.clone(),
            score: pick.score.round() as i64,
        };

        with_tx!(self, |db_tx| {
            // Re-check inside the transaction; a concurrent caller may
            // have inserted the row between the lookup above and here.
            let exists = potm::Entity::find_by_id((tenant_key.clone(), month.to_string()))
                .one(&db_tx)
                .await?
                .is_some();
            if !exists {
                potm::ActiveModel::from(&award).insert(&db_tx).await?;
                tracing::info!(
                    tenant = %tenant_key,
                    month,
                    winner = %award.username,
                    "player of the month recorded"
                );
            }
            Ok(())
        })
    }

    /// Player-of-the-month history, most recent month first.
    pub async fn monthly_award_history(
        &self,
        tenant_id: Uuid,
    ) -> ResultEngine<Vec<MonthlyAward>> {
        let models = potm::Entity::find()
            .filter(potm::Column::TenantId.eq(tenant_id.to_string()))
            .order_by_desc(potm::Column::Month)
            .all(&self.database)
            .await?;
        let mut out = Vec::with_capacity(models.len());
        for model in models {
            out.push(MonthlyAward::try_from(model)?);
        }
        Ok(out)
    }

    /// All tenant players ranked by an allow-listed sort key.
    pub async fn leaderboard(
        &self,
        tenant_id: Uuid,
        sort: LeaderboardSort,
    ) -> ResultEngine<Vec<LeaderboardRow>> {
        let tenant_key = tenant_id.to_string();

        let player_models = players::Entity::find()
            .filter(players::Column::TenantId.eq(tenant_key.clone()))
            .order_by_asc(players::Column::Username)
            .all(&self.database)
            .await?;

        let part_models = participations::Entity::find()
            .filter(participations::Column::TenantId.eq(tenant_key))
            .all(&self.database)
            .await?;
        let mut games_played: HashMap<String, i64> = HashMap::new();
        let mut total_rebuys: HashMap<String, i64> = HashMap::new();
        for part in &part_models {
            *games_played.entry(part.username.clone()).or_default() += 1;
            *total_rebuys.entry(part.username.clone()).or_default() += part.rebuys;
        }

        let mut rows: Vec<LeaderboardRow> = player_models
            .into_iter()
            .map(|p| LeaderboardRow {
                games_played: games_played.get(&p.username).copied().unwrap_or(0),
                total_rebuys: total_rebuys.get(&p.username).copied().unwrap_or(0),
                username: p.username,
                balance: p.balance,
                avatar_ref: p.avatar_ref,
            })
            .collect();

        match sort {
            // Rows already come out of the store username-ascending.
            LeaderboardSort::UsernameAsc => {}
            LeaderboardSort::GamesDesc => rows.sort_by(|a, b| b.games_played.cmp(&a.games_played)),
            LeaderboardSort::RebuysDesc => {
                rows.sort_by(|a, b| b.total_rebuys.cmp(&a.total_rebuys));
            }
            LeaderboardSort::BalanceDesc => rows.sort_by(|a, b| b.balance.cmp(&a.balance)),
        }

        Ok(rows)
    }

    /// Personal report: session history plus the dashboard numbers.
    ///
    /// The report is keyed by username, not player id, so it also works
    /// for names that only exist in the historical ledger.
    pub async fn player_report(
        &self,
        tenant_id: Uuid,
        username: &str,
    ) -> ResultEngine<PlayerReport> {
        let rows = self.sessions_for(tenant_id, username).await?;

        let total_games = rows.len() as i64;
        let net_sum: i64 = rows.iter().map(|r| r.net).sum();
        let profitable = rows.iter().filter(|r| r.net > 0).count() as i64;
        let (avg_profit, win_rate) = if total_games > 0 {
            (
                net_sum as f64 / total_games as f64,
                profitable as f64 / total_games as f64 * 100.0,
            )
        } else {
            (0.0, 0.0)
        };

        // Running total grouped per date, chronological.
        let mut dates: Vec<NaiveDate> = Vec::new();
        let mut cumulative: Vec<i64> = Vec::new();
        let mut running = 0;
        for row in &rows {
            running += row.net;
            if dates.last() == Some(&row.date) {
                if let Some(last) = cumulative.last_mut() {
                    *last = running;
                }
            } else {
                dates.push(row.date);
                cumulative.push(running);
            }
        }

        let recent: Vec<SessionRow> = rows.iter().rev().take(10).cloned().collect();

        Ok(PlayerReport {
            username: username.to_string(),
            total_games,
            net_sum,
            avg_profit,
            win_rate,
            dates,
            cumulative,
            recent,
        })
    }

    /// Cumulative per-player series over the tenant's distinct game
    /// dates, for charting. Includes players with no games yet.
    pub async fn progress_series(&self, tenant_id: Uuid) -> ResultEngine<CumulativeSeries> {
        let tenant_key = tenant_id.to_string();

        let usernames: Vec<String> = players::Entity::find()
            .filter(players::Column::TenantId.eq(tenant_key.clone()))
            .order_by_asc(players::Column::Username)
            .all(&self.database)
            .await?
            .into_iter()
            .map(|p| p.username)
            .collect();

        let rows: Vec<(participations::Model, Option<games::Model>)> =
            participations::Entity::find()
                .filter(participations::Column::TenantId.eq(tenant_key))
                .find_also_related(games::Entity)
                .all(&self.database)
                .await?;

        // (username, date) -> net sum for that day.
        let mut daily: HashMap<(String, NaiveDate), i64> = HashMap::new();
        let mut labels: Vec<NaiveDate> = Vec::new();
        for (part, game) in &rows {
            let Some(game) = game else { continue };
            *daily
                .entry((part.username.clone(), game.date))
                .or_default() += part.net;
            if !labels.contains(&game.date) {
                labels.push(game.date);
            }
        }
        labels.sort();

        let players = usernames
            .into_iter()
            .map(|username| {
                let mut running = 0;
                let data = labels
                    .iter()
                    .map(|date| {
                        running += daily
                            .get(&(username.clone(), *date))
                            .copied()
                            .unwrap_or(0);
                        running
                    })
                    .collect();
                PlayerSeries { username, data }
            })
            .collect();

        Ok(CumulativeSeries { labels, players })
    }

    /// A player's sessions joined with game dates, chronological.
    async fn sessions_for(
        &self,
        tenant_id: Uuid,
        username: &str,
    ) -> ResultEngine<Vec<SessionRow>> {
        let rows: Vec<(participations::Model, Option<games::Model>)> =
            participations::Entity::find()
                .filter(participations::Column::TenantId.eq(tenant_id.to_string()))
                .filter(participations::Column::Username.eq(username.to_string()))
                .find_also_related(games::Entity)
                .all(&self.database)
                .await?;

        let mut sessions: Vec<SessionRow> = rows
            .into_iter()
            .filter_map(|(part, game)| {
                game.map(|g| SessionRow {
                    date: g.date,
                    net: part.net,
                })
            })
            .collect();
        sessions.sort_by_key(|s| s.date);
        Ok(sessions)
    }
}
