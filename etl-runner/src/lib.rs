//! ETL Runner
//!
//! Supervises a periodic ETL job: the job is run over and over, failures are
//! logged and followed by a fixed backoff, and the loop never stops on its
//! own.
//!
//! Architecture:
//! - Configuration: supervisor timing, loaded from environment or defaults
//! - Scheduler: the supervisor loop and its retry policy
//! - Services: the job runner boundary and the retail sync job
//! - Repositories: PostgreSQL source, ClickHouse destination, watermark file

pub mod config;
pub mod db;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod signal;
