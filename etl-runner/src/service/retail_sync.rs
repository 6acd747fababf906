//! Retail sync job
//!
//! Moves retail transactions from PostgreSQL into ClickHouse, incrementally:
//! - load the watermark left by the previous run
//! - stream rows updated after it, in `updated_at` order
//! - insert them into ClickHouse in fixed-size batches
//! - save the newest `updated_at` seen as the next watermark

use anyhow::{Context, Result};
use async_trait::async_trait;
use etl_clickhouse::ClickHouseClient;
use etl_core::domain::transaction::RetailTransaction;
use etl_core::domain::watermark::Watermark;
use futures::TryStreamExt;
use sqlx::PgPool;
use std::time::Instant;
use tracing::{error, info};

use crate::db;
use crate::repository::{WatermarkStore, transactions, warehouse};
use crate::service::job::EtlJob;
use crate::service::settings::SyncSettings;

type SettingsSource = Box<dyn Fn() -> Result<SyncSettings> + Send + Sync>;

/// PostgreSQL to ClickHouse sync of the `retail_transaction` table
pub struct RetailSyncJob {
    settings: SettingsSource,
}

impl RetailSyncJob {
    /// Creates a job that reads its settings from the environment on each run
    pub fn new() -> Self {
        Self::with_settings(SyncSettings::from_env)
    }

    /// Creates a job that resolves its settings through `settings` on each run
    pub fn with_settings(
        settings: impl Fn() -> Result<SyncSettings> + Send + Sync + 'static,
    ) -> Self {
        Self {
            settings: Box::new(settings),
        }
    }

    /// Extract, load, and return the number of rows moved and the new watermark
    async fn sync(
        &self,
        pool: &PgPool,
        settings: &SyncSettings,
        last_watermark: Option<Watermark>,
    ) -> Result<LoadProgress> {
        let warehouse = ClickHouseClient::new(settings.clickhouse.clone());
        warehouse
            .ping()
            .await
            .context("Failed to connect to ClickHouse")?;
        info!("ClickHouse client created successfully");

        warehouse::ensure_table(&warehouse)
            .await
            .context("Failed to create ClickHouse table")?;

        let mut progress = LoadProgress::new(settings.batch_size, last_watermark);
        let mut rows = transactions::stream_since(pool, last_watermark);

        while let Some(row) = rows
            .try_next()
            .await
            .context("Failed to read transactions from PostgreSQL")?
        {
            if let Some(batch) = progress.push(row) {
                warehouse::insert_batch(&warehouse, &batch)
                    .await
                    .context("Insert operation failed")?;
            }
        }

        if let Some(batch) = progress.take_remaining() {
            warehouse::insert_batch(&warehouse, &batch)
                .await
                .context("Insert operation failed")?;
        }

        Ok(progress)
    }
}

impl Default for RetailSyncJob {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EtlJob for RetailSyncJob {
    fn name(&self) -> &str {
        "retail-sync"
    }

    async fn execute(&self) -> Result<()> {
        let started = Instant::now();
        info!("Starting ETL pipeline...");

        let settings = (self.settings)().context("Invalid ETL settings")?;

        let store = WatermarkStore::new(&settings.watermark_file);
        let last_watermark = store.load().await;
        match last_watermark {
            Some(watermark) => info!("Loaded last watermark: {}", watermark),
            None => info!("No watermark found, running a full load"),
        }

        let pool = db::create_pool(&settings.postgres)
            .await
            .context("Failed to connect to PostgreSQL")?;
        info!("PostgreSQL connection established successfully");

        let result = self.sync(&pool, &settings, last_watermark).await;

        pool.close().await;
        info!("PostgreSQL connection closed");

        let progress = result?;

        if let Some(watermark) = progress.watermark() {
            if let Err(e) = store.save(watermark).await {
                error!("Failed to save watermark: {:#}", e);
            }
        }

        info!(
            "ETL completed! Processed {} records in {:.2} seconds",
            progress.loaded(),
            started.elapsed().as_secs_f64()
        );

        Ok(())
    }
}

/// Batching and watermark bookkeeping for one run
///
/// Rows are buffered until `batch_size` is reached; the watermark tracks the
/// newest `updated_at` pushed so far.
#[derive(Debug)]
pub struct LoadProgress {
    batch_size: usize,
    buffer: Vec<RetailTransaction>,
    loaded: u64,
    watermark: Option<Watermark>,
}

impl LoadProgress {
    pub fn new(batch_size: usize, watermark: Option<Watermark>) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            loaded: 0,
            watermark,
        }
    }

    /// Buffer a row, returning a full batch once `batch_size` is reached
    pub fn push(&mut self, row: RetailTransaction) -> Option<Vec<RetailTransaction>> {
        self.watermark = Watermark::advance(self.watermark, std::slice::from_ref(&row));
        self.buffer.push(row);

        if self.buffer.len() >= self.batch_size {
            self.take_remaining()
        } else {
            None
        }
    }

    /// Drain whatever is buffered, `None` when empty
    pub fn take_remaining(&mut self) -> Option<Vec<RetailTransaction>> {
        if self.buffer.is_empty() {
            return None;
        }

        let batch = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.batch_size));
        self.loaded += batch.len() as u64;
        Some(batch)
    }

    /// Rows handed out as batches so far
    pub fn loaded(&self) -> u64 {
        self.loaded
    }

    pub fn watermark(&self) -> Option<Watermark> {
        self.watermark
    }
}
