use sea_orm::DatabaseConnection;
use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine};

mod audit;
mod players;
mod settlement;
mod stats;
mod tenants;

pub use settlement::{CorrectionCmd, SeatEntry, SettlementCmd};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: crate::ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The ledger core: all tenant, player, game and statistics operations
/// run through here, scoped by tenant id.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// Trim and NFC-normalize a username; reject empty input.
fn normalize_username(value: &str) -> ResultEngine<String> {
    let trimmed: String = value.trim().nfc().collect();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(
            "username must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Validate a tenant slug: lowercase alphanumerics and hyphens, 3-30 chars.
fn normalize_tenant_name(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    let valid_len = (3..=30).contains(&trimmed.len());
    let valid_chars = trimmed
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid_len || !valid_chars {
        return Err(EngineError::InvalidInput(format!(
            "\"{trimmed}\" is not a valid tenant name"
        )));
    }
    Ok(trimmed.to_string())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_name_rules() {
        assert!(normalize_tenant_name("friday-game").is_ok());
        assert!(normalize_tenant_name("ab").is_err());
        assert!(normalize_tenant_name("UPPER").is_err());
        assert!(normalize_tenant_name("has space").is_err());
        assert!(normalize_tenant_name(&"x".repeat(31)).is_err());
    }

    #[test]
    fn username_is_trimmed_and_nonempty() {
        assert_eq!(normalize_username("  bob  ").unwrap(), "bob");
        assert!(normalize_username("   ").is_err());
    }
}
