//! Watermark Repository
//!
//! Persists the incremental-load checkpoint as a small JSON file:
//!
//! ```json
//! {
//!   "last_updated_at": "2024-01-02 10:00:00"
//! }
//! ```

use anyhow::{Context, Result};
use etl_core::domain::watermark::{Watermark, WatermarkRecord};
use std::path::PathBuf;
use tracing::{info, warn};

/// File-backed watermark storage
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the last saved watermark
    ///
    /// A missing file means nothing was loaded yet. An unreadable or corrupt
    /// file is logged and treated the same way, which triggers a full load.
    pub async fn load(&self) -> Option<Watermark> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Could not read watermark file {}: {}", self.path.display(), e);
                return None;
            }
        };

        let record: WatermarkRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("Could not read watermark file {}: {}", self.path.display(), e);
                return None;
            }
        };

        match record.watermark() {
            Ok(watermark) => watermark,
            Err(e) => {
                warn!("Ignoring watermark file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Write `watermark` to the file, replacing any previous value
    pub async fn save(&self, watermark: Watermark) -> Result<()> {
        let json = serde_json::to_string_pretty(&WatermarkRecord::from(watermark))
            .context("Failed to encode watermark")?;

        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        info!("Watermark saved: {}", watermark);
        Ok(())
    }
}
