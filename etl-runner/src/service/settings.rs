//! Retail sync settings
//!
//! Connection targets and tuning knobs of the retail sync job. They are read
//! from the environment at the start of every run so that a missing variable
//! shows up as a failed run (and gets retried) instead of a crash at startup.

use anyhow::{Context, Result};
use etl_clickhouse::ClickHouseConfig;
use std::path::PathBuf;

/// Rows sent to ClickHouse per insert
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Where the last loaded `updated_at` is kept between runs
pub const DEFAULT_WATERMARK_FILE: &str = "etl_watermark.json";

/// Source database settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
}

/// Everything the retail sync job needs for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub postgres: PostgresSettings,
    pub clickhouse: ClickHouseConfig,
    pub batch_size: usize,
    pub watermark_file: PathBuf,
}

impl SyncSettings {
    /// Reads settings from environment variables
    ///
    /// Required: PG_HOST, PG_DB, PG_USER, CH_HOST.
    /// Optional: PG_PORT (5432), PG_PASSWORD, CH_PORT (8123), CH_USER,
    /// CH_PASSWORD, CH_DB, ETL_BATCH_SIZE (5000), WATERMARK_FILE.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .with_context(|| format!("{} environment variable not set", key))
        };
        let port = |key: &str, default: u16| -> Result<u16> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a port number, got '{}'", key, raw)),
                None => Ok(default),
            }
        };

        let postgres = PostgresSettings {
            host: required("PG_HOST")?,
            port: port("PG_PORT", 5432)?,
            database: required("PG_DB")?,
            user: required("PG_USER")?,
            password: lookup("PG_PASSWORD"),
        };

        let mut clickhouse = ClickHouseConfig::new(required("CH_HOST")?, port("CH_PORT", 8123)?);
        clickhouse.username = lookup("CH_USER");
        clickhouse.password = lookup("CH_PASSWORD");
        clickhouse.database = lookup("CH_DB");

        let batch_size = lookup("ETL_BATCH_SIZE")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_BATCH_SIZE);

        let watermark_file = lookup("WATERMARK_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WATERMARK_FILE));

        Ok(Self {
            postgres,
            clickhouse,
            batch_size,
            watermark_file,
        })
    }
}
