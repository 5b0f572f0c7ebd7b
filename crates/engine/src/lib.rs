//! Core ledger for a multi-table home poker results service.
//!
//! Everything is tenant-scoped: each table (tenant) has its own players,
//! games and audit trail, and no operation ever crosses tenants. The
//! [`Engine`] owns the database connection and exposes the whole write
//! and read surface; HTTP and CLI frontends stay thin.

pub mod audit;
pub mod error;
pub mod games;
mod ops;
pub mod participations;
pub mod players;
pub mod potm;
pub mod stats;
pub mod tenants;

pub use audit::AuditEntry;
pub use error::EngineError;
pub use games::Game;
pub use ops::{CorrectionCmd, Engine, EngineBuilder, SeatEntry, SettlementCmd};
pub use participations::Participation;
pub use players::Player;
pub use potm::MonthlyAward;
pub use stats::{
    CumulativeSeries, LeaderboardRow, LeaderboardSort, PlayerReport, PlayerSeries, PlayerTotals,
    PotmPick, RoiPick, SessionRow, StatPick, TableStats,
};
pub use tenants::Tenant;

/// Convenient `Result` alias for engine operations.
pub type ResultEngine<T> = Result<T, EngineError>;
