//! Core domain types
//!
//! These types are shared between the supervisor (which only looks at
//! outcomes) and the ETL jobs (which move records and track watermarks).

pub mod outcome;
pub mod transaction;
pub mod watermark;
