//! Database abstraction layer for DataWhisperer.
//!
//! Provides a trait-based interface for database operations so the pipeline
//! can run against MySQL or an in-memory stand-in.

mod mock;
mod mysql;
mod schema;
mod types;

pub use mock::{FailingDatabaseClient, MockConnector, MockDatabaseClient};
pub use mysql::{connect_error_for_code, MySqlClient, ER_BAD_DB_ERROR};
pub use schema::{Column, ForeignKey, Schema, Table, SAMPLE_ROWS_PER_TABLE};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Opens a MySQL connection for the given configuration.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    let client = MySqlClient::connect(config).await?;
    Ok(Box::new(client))
}

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with WhisperError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Introspects the database schema, returning table and relationship information.
    async fn introspect_schema(&self) -> Result<Schema>;

    /// Returns the textual schema description fed to both prompts.
    async fn schema_text(&self) -> Result<String> {
        Ok(self.introspect_schema().await?.format_for_llm())
    }

    /// Executes a SQL statement and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

/// Opens database handles. The connection manager goes through this seam so
/// tests and `--mock-db` can swap the server out.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a new handle for `config`.
    async fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>>;
}

/// Connector for real MySQL servers.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

#[async_trait]
impl Connector for MySqlConnector {
    async fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
        connect(config).await
    }
}
