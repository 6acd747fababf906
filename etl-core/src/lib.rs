//! ETL Core
//!
//! Core types shared by the ETL supervisor and its jobs.
//!
//! This crate contains:
//! - Job outcomes: the structured result of one ETL execution attempt
//! - Domain records: rows moved from the source to the destination
//! - Watermarks: the incremental-load checkpoint

pub mod domain;
