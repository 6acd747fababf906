//! Watermark domain types
//!
//! A watermark is the greatest `updated_at` already loaded into the
//! destination. Only rows updated after it are extracted on the next run.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::transaction::RetailTransaction;

/// Accepted textual layouts, the first one is also the one written back
const FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WatermarkError {
    #[error("invalid watermark timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// Incremental load checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(NaiveDateTime);

impl Watermark {
    pub fn new(updated_at: NaiveDateTime) -> Self {
        Self(updated_at)
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.0
    }

    /// Moves the watermark forward to the newest row of `batch`
    ///
    /// Never moves backwards; an empty batch leaves it untouched.
    pub fn advance(current: Option<Self>, batch: &[RetailTransaction]) -> Option<Self> {
        let newest = batch.iter().map(|row| Self(row.updated_at)).max();
        match (current, newest) {
            (Some(current), Some(newest)) => Some(current.max(newest)),
            (current, newest) => current.or(newest),
        }
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(FORMATS[0]))
    }
}

impl FromStr for Watermark {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
            .map(Self)
            .ok_or_else(|| WatermarkError::InvalidTimestamp(s.to_string()))
    }
}

/// On-disk representation of the watermark file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkRecord {
    pub last_updated_at: Option<String>,
}

impl WatermarkRecord {
    /// Parses the stored timestamp, `Ok(None)` when nothing was stored yet
    pub fn watermark(&self) -> Result<Option<Watermark>, WatermarkError> {
        self.last_updated_at
            .as_deref()
            .map(Watermark::from_str)
            .transpose()
    }
}

impl From<Watermark> for WatermarkRecord {
    fn from(watermark: Watermark) -> Self {
        Self {
            last_updated_at: Some(watermark.to_string()),
        }
    }
}
