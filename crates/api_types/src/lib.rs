//! Shared request/response bodies for the HTTP API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod tenant {
    use super::*;

    /// Operator request to provision a tenant with its first site admin.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TenantNew {
        /// Subdomain label, lowercase `[a-z0-9-]`, 3-30 chars.
        pub name: String,
        pub owner_id: Option<String>,
        pub admin_username: String,
        pub admin_password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TenantView {
        pub id: Uuid,
        pub name: String,
        pub owner_id: Option<String>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod player {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PlayerNew {
        pub username: String,
        #[serde(default)]
        pub is_admin: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PlayerView {
        pub username: String,
        pub balance: i64,
        pub is_admin: bool,
        pub must_set_password: bool,
        pub avatar_ref: Option<String>,
    }

    /// First-login credential bootstrap.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SetPassword {
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ChangePassword {
        pub current_password: String,
        pub new_password: String,
    }

    /// Admin override of a materialized balance.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceSet {
        pub balance: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AdminToggled {
        pub username: String,
        pub is_admin: bool,
    }
}

pub mod game {
    use super::*;

    /// One seat in a settlement request. Order matters: ties on net are
    /// broken in favor of the seat submitted first.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SeatNew {
        pub username: String,
        pub cashout: i64,
        #[serde(default)]
        pub rebuys: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GameNew {
        pub date: NaiveDate,
        pub buyin: i64,
        pub seats: Vec<SeatNew>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GameCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GameView {
        pub id: Uuid,
        pub date: NaiveDate,
        pub buyin: i64,
        pub winner: String,
        pub amount: i64,
        pub rebuys: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SeatView {
        pub username: String,
        pub buyin: i64,
        pub rebuys: i64,
        pub cashout: i64,
        pub net: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GameDetail {
        pub game: GameView,
        pub seats: Vec<SeatView>,
    }

    /// Admin correction of one seat in a settled game.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SeatCorrection {
        pub cashout: i64,
        pub rebuys: i64,
    }

    /// Pre-filled values for the new-game form.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GameDefaults {
        pub date: NaiveDate,
        pub buyin: i64,
        /// All tenant usernames, for seat selection.
        pub roster: Vec<String>,
    }
}

pub mod stats {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LeaderboardQuery {
        /// One of `username`, `games`, `rebuys`, `balance`; anything else
        /// falls back to `balance`.
        pub sort: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LeaderboardEntry {
        pub username: String,
        pub balance: i64,
        pub games_played: i64,
        pub total_rebuys: i64,
        pub avatar_ref: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LeaderboardResponse {
        pub sort: String,
        pub entries: Vec<LeaderboardEntry>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthlyQuery {
        /// `YYYY-MM`; defaults to the current month.
        pub month: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthlyAwardView {
        pub month: String,
        pub username: String,
        pub score: i64,
    }
}

pub mod audit {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuditQuery {
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuditEntryView {
        pub actor: String,
        pub action: String,
        pub target: Option<String>,
        pub ip: Option<String>,
        pub timestamp: DateTime<Utc>,
    }
}
