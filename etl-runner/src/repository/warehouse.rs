//! Warehouse Repository
//!
//! Destination table management and loading in ClickHouse.

use etl_clickhouse::{ClickHouseClient, Result};
use etl_core::domain::transaction::{RETAIL_TRANSACTION_COLUMNS, RetailTransaction};
use tracing::{info, warn};

pub const TABLE: &str = "retail_transaction";

/// ReplacingMergeTree keeps the row with the latest `updated_at` per id
const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS retail_transaction (
        id UInt64,
        customer_id UInt64,
        last_status String,
        pos_origin String,
        pos_destination String,
        created_at DateTime,
        updated_at DateTime,
        deleted_at Nullable(DateTime)
    ) ENGINE = ReplacingMergeTree(updated_at)
    ORDER BY (id)
"#;

/// Create the destination table if it does not exist yet
pub async fn ensure_table(client: &ClickHouseClient) -> Result<()> {
    client.command(CREATE_TABLE).await?;
    info!("ClickHouse table {} is ready", TABLE);
    Ok(())
}

/// Load one batch of transactions
///
/// # Returns
/// Number of rows inserted
pub async fn insert_batch(client: &ClickHouseClient, rows: &[RetailTransaction]) -> Result<usize> {
    if rows.is_empty() {
        warn!("No data to insert");
        return Ok(0);
    }

    let inserted = client
        .insert_json_each_row(TABLE, &RETAIL_TRANSACTION_COLUMNS, rows)
        .await?;
    info!("Successfully inserted {} rows", inserted);

    Ok(inserted)
}
