//! Application configuration.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Poll-creation lock configuration.
    #[serde(default)]
    pub lock: LockConfig,
    /// Vote aggregation configuration.
    #[serde(default)]
    pub vote: VoteConfig,
    /// Rating denormalization routing table.
    #[serde(default)]
    pub dependents: DependentsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Configuration for the poll-creation mutual exclusion gate.
#[derive(Debug, Clone, Deserialize)]
pub struct LockConfig {
    /// Whether the gate is enabled. Disable only when an external
    /// unique constraint guards poll titles instead.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Lock file path.
    #[serde(default = "default_lock_path")]
    pub path: String,
    /// Delay between acquire attempts while the lock is held elsewhere.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    /// Age after which an existing lock file is considered abandoned
    /// and forcibly reclaimed.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_lock_path(),
            retry_interval_ms: default_retry_interval_ms(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

/// Vote aggregation configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoteConfig {
    /// When set, `num_total` is reported as the raw signed difference
    /// instead of being clamped to a minimum of 0.
    #[serde(default)]
    pub allow_negative_num_total_votes: bool,
}

/// Rating denormalization routing table:
/// `dependents.<kind>.<code>.totals.<entity>.field = <column>`.
pub type DependentsConfig = HashMap<String, HashMap<String, CodeRouting>>;

/// Routing for one (kind, code) partition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeRouting {
    /// Target entities keyed by entity (table) name.
    #[serde(default)]
    pub totals: HashMap<String, TotalTarget>,
}

/// One denormalization target.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TotalTarget {
    /// Column that receives the computed rating.
    pub field: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_true() -> bool {
    true
}

fn default_lock_path() -> String {
    "./.ballot.lock".to_string()
}

const fn default_retry_interval_ms() -> u64 {
    10
}

const fn default_stale_after_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `BALLOT_ENV`)
    /// 3. Environment variables with `BALLOT_` prefix
    ///
    /// The `[dependents]` routing table is validated eagerly: a
    /// malformed table fails the load, so the service never becomes
    /// ready with broken denormalization routing.
    pub fn load() -> AppResult<Self> {
        let env = std::env::var("BALLOT_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("BALLOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        validate_dependents(&config.dependents)?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("BALLOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        validate_dependents(&config.dependents)?;
        Ok(config)
    }
}

/// Validate a `[dependents]` routing table.
///
/// Entity names and field names end up interpolated into SQL
/// identifiers by the dependent repository, so they are restricted to
/// identifier syntax here, once, at startup.
pub fn validate_dependents(dependents: &DependentsConfig) -> AppResult<()> {
    for (kind, codes) in dependents {
        if kind.trim().is_empty() {
            return Err(AppError::Config(format!(
                "dependents.{kind}: vote kind must not be blank"
            )));
        }

        for (code, routing) in codes {
            if code.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "dependents.{kind}.{code}: vote code must not be blank"
                )));
            }

            for (entity, target) in &routing.totals {
                if !is_sql_identifier(entity) {
                    return Err(AppError::Config(format!(
                        "dependents.{kind}.{code}.totals.{entity}: entity name must be a valid identifier"
                    )));
                }

                if !is_sql_identifier(&target.field) {
                    return Err(AppError::Config(format!(
                        "dependents.{kind}.{code}.totals.{entity}.field: field must be a valid identifier"
                    )));
                }
            }
        }
    }

    Ok(())
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_sql_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
