//! Aggregation result types.
//!
//! Everything here is derived, computed fresh per call and never
//! persisted (the single exception is the player-of-the-month history
//! row, see [`crate::potm`]).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A cross-player pick: who, and the value that won them the pick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatPick {
    pub username: String,
    pub value: i64,
}

/// Best-ROI pick; ROI is a percentage, so it stays a float.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiPick {
    pub username: String,
    pub roi: f64,
}

/// Composite player-of-the-month pick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PotmPick {
    pub username: String,
    pub score: f64,
}

/// Per-player totals within a window (whole history or one month).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerTotals {
    pub username: String,
    pub games: i64,
    /// Total buy-in exposure: `buyin * (1 + rebuys)` summed over games.
    pub invested: i64,
    pub rebuys: i64,
    pub net: i64,
    /// `net / invested * 100`; zero when nothing was invested.
    pub roi: f64,
    pub biggest_win: i64,
    pub biggest_loss: i64,
}

/// Tenant-wide statistics, optionally scoped to one calendar month.
///
/// An empty ledger yields zero totals and `None` picks, never an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct TableStats {
    /// `YYYY-MM` when month-scoped, `None` for all-time.
    pub month: Option<String>,
    pub total_games: i64,
    /// Sum of winners' nets across games in the window.
    pub total_money: i64,
    /// Average winner net per game.
    pub avg_winner_profit: f64,
    pub biggest_single_win: Option<StatPick>,
    pub worst_single_loss: Option<StatPick>,
    pub top_earner: Option<StatPick>,
    pub top_loser: Option<StatPick>,
    pub most_rebuys: Option<StatPick>,
    pub best_roi: Option<RoiPick>,
    /// Minimum `|net|` among players with at least 3 games in-window.
    pub most_consistent: Option<StatPick>,
    /// Maximum net among players with positive net and at least 2 rebuys.
    pub comeback: Option<StatPick>,
    pub most_games: Option<StatPick>,
    pub player_of_month: Option<PotmPick>,
    pub unique_winners: i64,
    pub most_wins: Option<StatPick>,
    pub top_earners: Vec<StatPick>,
    pub per_player: Vec<PlayerTotals>,
}

/// One session in a player's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRow {
    pub date: NaiveDate,
    pub net: i64,
}

/// Personal dashboard / public profile numbers for one player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerReport {
    pub username: String,
    pub total_games: i64,
    pub net_sum: i64,
    pub avg_profit: f64,
    /// Share of sessions with positive net, in percent.
    pub win_rate: f64,
    /// Chronological running total, one point per session date.
    pub dates: Vec<NaiveDate>,
    pub cumulative: Vec<i64>,
    /// Most recent sessions, newest first.
    pub recent: Vec<SessionRow>,
}

/// Per-player running totals over the tenant's distinct game dates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeSeries {
    pub labels: Vec<NaiveDate>,
    pub players: Vec<PlayerSeries>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSeries {
    pub username: String,
    pub data: Vec<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub username: String,
    pub balance: i64,
    pub games_played: i64,
    pub total_rebuys: i64,
    pub avatar_ref: Option<String>,
}

/// Allow-listed leaderboard orderings. Anything outside the list falls
/// back to the default instead of erroring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardSort {
    UsernameAsc,
    GamesDesc,
    RebuysDesc,
    #[default]
    BalanceDesc,
}

impl LeaderboardSort {
    /// Parse a caller-supplied sort key. Unknown keys fall back to
    /// `balance desc` rather than being rejected.
    pub fn from_key(key: &str) -> Self {
        match key {
            "username" => Self::UsernameAsc,
            "games" => Self::GamesDesc,
            "rebuys" => Self::RebuysDesc,
            _ => Self::BalanceDesc,
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::UsernameAsc => "username",
            Self::GamesDesc => "games",
            Self::RebuysDesc => "rebuys",
            Self::BalanceDesc => "balance",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_allow_list() {
        assert_eq!(
            LeaderboardSort::from_key("username"),
            LeaderboardSort::UsernameAsc
        );
        assert_eq!(LeaderboardSort::from_key("games"), LeaderboardSort::GamesDesc);
        assert_eq!(
            LeaderboardSort::from_key("rebuys"),
            LeaderboardSort::RebuysDesc
        );
        assert_eq!(
            LeaderboardSort::from_key("balance"),
            LeaderboardSort::BalanceDesc
        );
    }

    #[test]
    fn unknown_sort_key_falls_back_to_balance() {
        assert_eq!(
            LeaderboardSort::from_key("net; DROP TABLE players"),
            LeaderboardSort::BalanceDesc
        );
        assert_eq!(LeaderboardSort::from_key(""), LeaderboardSort::BalanceDesc);
    }
}
