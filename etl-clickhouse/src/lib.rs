//! ClickHouse HTTP Client
//!
//! A small, typed client for the ClickHouse HTTP interface, used by the ETL
//! jobs to create destination tables and load rows.
//!
//! # Example
//!
//! ```no_run
//! use etl_clickhouse::{ClickHouseClient, ClickHouseConfig};
//!
//! #[tokio::main]
//! async fn main() -> etl_clickhouse::Result<()> {
//!     let client = ClickHouseClient::new(ClickHouseConfig::new("localhost", 8123));
//!
//!     client.ping().await?;
//!     client.command("SELECT 1").await?;
//!     Ok(())
//! }
//! ```

pub mod error;
mod queries;

pub use error::{ClientError, Result};

use reqwest::{Client, RequestBuilder};

/// Connection settings for a ClickHouse server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickHouseConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl ClickHouseConfig {
    /// Creates settings for an unauthenticated server using the default database
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: None,
            password: None,
            database: None,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Base URL of the HTTP interface
    ///
    /// A host that already carries a scheme is used as-is, otherwise plain
    /// `http://` is assumed.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}:{}", host, self.port)
        } else {
            format!("http://{}:{}", host, self.port)
        }
    }
}

/// HTTP client for a ClickHouse server
#[derive(Debug, Clone)]
pub struct ClickHouseClient {
    /// Base URL of the server (e.g., "http://localhost:8123")
    base_url: String,
    /// Connection settings
    config: ClickHouseConfig,
    /// HTTP client instance
    client: Client,
}

impl ClickHouseClient {
    /// Create a new client with a default HTTP client
    pub fn new(config: ClickHouseConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(config: ClickHouseConfig, client: Client) -> Self {
        Self {
            base_url: config.base_url(),
            config,
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds a POST to the query endpoint with credentials and database applied
    fn query_request(&self) -> RequestBuilder {
        let mut request = self.client.post(format!("{}/", self.base_url));

        if let Some(database) = &self.config.database {
            request = request.query(&[("database", database)]);
        }
        if let Some(username) = &self.config.username {
            request = request.header("X-ClickHouse-User", username);
        }
        if let Some(password) = &self.config.password {
            request = request.header("X-ClickHouse-Key", password);
        }

        request
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and return the response body as text
    async fn handle_response(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text.trim()));
        }

        Ok(response.text().await?)
    }
}
