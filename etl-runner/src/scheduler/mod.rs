//! Scheduler layer for the runner
//!
//! This layer keeps the ETL job running forever: it invokes the job runner,
//! looks at the outcome, and sleeps according to the retry policy before the
//! next attempt.

pub mod policy;
pub mod supervisor;

pub use policy::{Backoff, RetryPolicy};
pub use supervisor::Supervisor;
