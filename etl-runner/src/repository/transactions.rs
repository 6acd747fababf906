//! Transaction Repository
//!
//! Reads retail transactions from the source database.

use chrono::NaiveDateTime;
use etl_core::domain::transaction::RetailTransaction;
use etl_core::domain::watermark::Watermark;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use sqlx::PgPool;

const SELECT_ALL: &str = r#"
    SELECT id, customer_id, last_status, pos_origin, pos_destination,
           created_at, updated_at, deleted_at
    FROM retail_transaction
    WHERE deleted_at IS NOT NULL
    ORDER BY updated_at
"#;

const SELECT_SINCE: &str = r#"
    SELECT id, customer_id, last_status, pos_origin, pos_destination,
           created_at, updated_at, deleted_at
    FROM retail_transaction
    WHERE updated_at > $1 AND deleted_at IS NOT NULL
    ORDER BY updated_at
"#;

/// Stream transactions updated after `watermark`, oldest first
///
/// Without a watermark every matching row is returned (first full load).
/// Rows are fetched lazily, so memory use does not depend on table size.
pub fn stream_since(
    pool: &PgPool,
    watermark: Option<Watermark>,
) -> BoxStream<'_, Result<RetailTransaction, sqlx::Error>> {
    let rows = match watermark {
        Some(watermark) => sqlx::query_as::<_, TransactionRow>(SELECT_SINCE)
            .bind(watermark.timestamp())
            .fetch(pool),
        None => sqlx::query_as::<_, TransactionRow>(SELECT_ALL).fetch(pool),
    };

    rows.map_ok(RetailTransaction::from).boxed()
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    customer_id: i64,
    last_status: String,
    pos_origin: String,
    pos_destination: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    deleted_at: Option<NaiveDateTime>,
}

impl From<TransactionRow> for RetailTransaction {
    fn from(row: TransactionRow) -> Self {
        RetailTransaction {
            id: row.id,
            customer_id: row.customer_id,
            last_status: row.last_status,
            pos_origin: row.pos_origin,
            pos_destination: row.pos_destination,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}
