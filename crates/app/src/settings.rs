//! Application settings, read from `settings.toml`.
//!
//! Everything configurable lives here and is passed down explicitly;
//! nothing else in the workspace reads configuration on its own.

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level filter, e.g. `info` or `debug`.
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub database: Database,
    pub bind: Option<String>,
    pub port: u16,
    /// Bare domain for the operator scope; tenants live one label below.
    pub base_domain: String,
    /// Pre-filled buy-in for the new-game form.
    pub default_buyin: i64,
}

/// Operator (super-admin) credentials. No database row backs the
/// operator; the hash comes from `chiplog_admin hash-password`.
#[derive(Debug, Deserialize)]
pub struct Operator {
    pub username: String,
    /// Argon2 PHC-format hash.
    pub password_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub operator: Operator,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}
