//! Service layer
//!
//! Services contain the job-side logic of the runner:
//! - the job runner, which turns one ETL execution into a `JobOutcome`
//! - the retail sync job, the ETL unit run under supervision
//! - the settings the retail sync job reads on every run
//!
//! Jobs sit behind the `EtlJob` trait so the supervisor can be driven by
//! scripted jobs in tests.

pub mod job;
pub mod retail_sync;
pub mod settings;

// Re-export traits
pub use job::EtlJob;

// Re-export implementations
pub use job::JobRunner;
pub use retail_sync::RetailSyncJob;
pub use settings::SyncSettings;
