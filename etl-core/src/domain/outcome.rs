//! Job outcome types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Placeholder used when a failure carries no message of its own
pub const UNKNOWN_FAILURE: &str = "unknown failure";

/// Result of one ETL execution attempt
///
/// Created once per attempt and never mutated afterwards. The supervisor
/// logs it and drops it before the next attempt starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: JobStatus,
}

/// Status of a finished attempt
///
/// The diagnostic only exists on the failure variant, so an outcome is always
/// exactly one of the two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Success,
    Failure { diagnostic: String },
}

impl JobOutcome {
    /// Builds a successful outcome for an attempt that started at `started_at`
    pub fn success(run_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: Utc::now().max(started_at),
            status: JobStatus::Success,
        }
    }

    /// Builds a failed outcome
    ///
    /// Blank diagnostics are replaced with [`UNKNOWN_FAILURE`].
    pub fn failure(run_id: Uuid, started_at: DateTime<Utc>, diagnostic: impl Into<String>) -> Self {
        let diagnostic = diagnostic.into();
        let diagnostic = if diagnostic.trim().is_empty() {
            UNKNOWN_FAILURE.to_string()
        } else {
            diagnostic
        };

        Self {
            run_id,
            started_at,
            finished_at: Utc::now().max(started_at),
            status: JobStatus::Failure { diagnostic },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, JobStatus::Success)
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Failure detail, present iff the attempt failed
    pub fn diagnostic(&self) -> Option<&str> {
        match &self.status {
            JobStatus::Success => None,
            JobStatus::Failure { diagnostic } => Some(diagnostic),
        }
    }

    /// Wall-clock time the attempt took
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}
