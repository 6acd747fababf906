//! Query and insert endpoints

use crate::ClickHouseClient;
use crate::error::{ClientError, Result};
use serde::Serialize;
use tracing::debug;

impl ClickHouseClient {
    // =============================================================================
    // Health
    // =============================================================================

    /// Check that the server is reachable
    ///
    /// ClickHouse answers `GET /ping` with `Ok.`.
    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/ping", self.base_url);
        let response = self.client.get(&url).send().await?;
        let body = self.handle_response(response).await?;

        if body.trim() != "Ok." {
            return Err(ClientError::UnexpectedPing(body));
        }

        Ok(())
    }

    // =============================================================================
    // Statements
    // =============================================================================

    /// Execute a statement that returns no rows of interest (DDL, SET, ...)
    ///
    /// # Returns
    /// The raw response body
    pub async fn command(&self, sql: &str) -> Result<String> {
        debug!("Executing ClickHouse command");
        let response = self.query_request().body(sql.to_string()).send().await?;

        self.handle_response(response).await
    }

    /// Insert rows into `table` using the `JSONEachRow` format
    ///
    /// Each row is serialized to one JSON object per line. An empty slice is
    /// a no-op and sends nothing.
    ///
    /// # Arguments
    /// * `table` - Destination table name
    /// * `columns` - Column list, matching the serialized field names
    /// * `rows` - Rows to insert
    ///
    /// # Returns
    /// Number of rows sent
    pub async fn insert_json_each_row<T: Serialize>(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[T],
    ) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let body = encode_json_each_row(rows)?;
        let response = self
            .query_request()
            .query(&[("query", insert_statement(table, columns))])
            .body(body)
            .send()
            .await?;

        self.handle_response(response).await?;
        debug!("Inserted {} rows into {}", rows.len(), table);

        Ok(rows.len())
    }
}

/// Build the `INSERT ... FORMAT JSONEachRow` statement for `table`
pub(crate) fn insert_statement(table: &str, columns: &[&str]) -> String {
    if columns.is_empty() {
        format!("INSERT INTO {} FORMAT JSONEachRow", table)
    } else {
        format!(
            "INSERT INTO {} ({}) FORMAT JSONEachRow",
            table,
            columns.join(", ")
        )
    }
}

/// Serialize rows as newline-delimited JSON objects
pub(crate) fn encode_json_each_row<T: Serialize>(rows: &[T]) -> Result<String> {
    let mut body = String::new();
    for row in rows {
        body.push_str(&serde_json::to_string(row)?);
        body.push('\n');
    }
    Ok(body)
}
