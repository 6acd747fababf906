//! Repository layer
//!
//! Data access for the retail sync job, one module per system it touches:
//! - transactions: source rows in PostgreSQL
//! - warehouse: destination table in ClickHouse
//! - watermark: the checkpoint file on local disk

pub mod transactions;
pub mod warehouse;
pub mod watermark;

pub use watermark::WatermarkStore;
