//! MySQL database client implementation.
//!
//! Provides the `MySqlClient` struct that implements the `DatabaseClient` trait
//! for MySQL databases using sqlx.

use crate::config::ConnectionConfig;
use crate::db::{
    Column, ColumnInfo, DatabaseClient, ForeignKey, QueryResult, Row, Schema, Table, Value,
    SAMPLE_ROWS_PER_TABLE,
};
use crate::error::{Result, WhisperError};
use async_trait::async_trait;
use sqlx::mysql::{MySqlDatabaseError, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, TypeInfo};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// MySQL server error number for "Unknown database".
pub const ER_BAD_DB_ERROR: u16 = 1049;

/// Maximum rows to return from a query.
const MAX_ROWS: usize = 1000;

/// How long to wait for the server to accept the first connection.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Leading keywords of statements that produce a result set.
const ROW_RETURNING_KEYWORDS: &[&str] = &[
    "SELECT", "WITH", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "TABLE", "VALUES", "(",
];

/// MySQL database client.
#[derive(Debug)]
pub struct MySqlClient {
    pool: MySqlPool,
}

impl MySqlClient {
    /// Opens a connection to the server described by `config`.
    ///
    /// A single attempt is made. The pool holds one connection because a
    /// session runs one statement at a time.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        debug!(database = %config.display_string(), "Opening MySQL connection");

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Successfully connected to database");
        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        let tables = self.fetch_tables().await?;
        let foreign_keys = self.fetch_foreign_keys().await?;

        Ok(Schema {
            tables,
            foreign_keys,
        })
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let statement = strip_terminator(sql);
        let start = Instant::now();

        if !returns_rows(statement) {
            let done = self
                .pool
                .execute(statement)
                .await
                .map_err(|e| WhisperError::query(format_query_error(e)))?;

            return Ok(QueryResult::affected(done.rows_affected())
                .with_execution_time(start.elapsed()));
        }

        // Plain-text statements go over the text protocol, so every value
        // arrives as its textual form regardless of column type.
        let result = self
            .pool
            .fetch_all(statement)
            .await
            .map_err(|e| WhisperError::query(format_query_error(e)))?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            None => self.fetch_column_metadata(statement).await,
        };

        let total_rows = result.len();
        let was_truncated = total_rows > MAX_ROWS;

        if was_truncated {
            warn!(
                "Query returned {} rows, truncating to {} rows",
                total_rows, MAX_ROWS
            );
        }

        let rows: Vec<Row> = result.iter().take(MAX_ROWS).map(convert_row).collect();
        let row_count = rows.len();

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            row_count,
            total_rows: Some(total_rows),
            was_truncated,
            rows_affected: None,
        })
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

impl MySqlClient {
    /// Column names for a statement that returned no rows.
    ///
    /// Best effort: a statement the server cannot prepare yields no columns.
    async fn fetch_column_metadata(&self, sql: &str) -> Vec<ColumnInfo> {
        match self.pool.describe(sql).await {
            Ok(described) => described
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            Err(e) => {
                debug!(error = %e, "Could not describe empty result set");
                Vec::new()
            }
        }
    }

    /// Fetches all base tables of the current database.
    async fn fetch_tables(&self) -> Result<Vec<Table>> {
        let table_names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT CAST(TABLE_NAME AS CHAR)
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| WhisperError::query(format!("Failed to fetch tables: {e}")))?;

        let mut tables = Vec::with_capacity(table_names.len());

        for table_name in table_names {
            let (columns, primary_key) = self.fetch_columns(&table_name).await?;
            let sample_rows = self.fetch_sample_rows(&table_name).await;

            tables.push(Table {
                name: table_name,
                columns,
                primary_key,
                sample_rows,
            });
        }

        Ok(tables)
    }

    /// Fetches columns and primary key columns for a specific table.
    async fn fetch_columns(&self, table_name: &str) -> Result<(Vec<Column>, Vec<String>)> {
        let rows: Vec<(String, String, String, Option<String>, String)> = sqlx::query_as(
            r#"
            SELECT
                CAST(COLUMN_NAME AS CHAR),
                CAST(COLUMN_TYPE AS CHAR),
                CAST(IS_NULLABLE AS CHAR),
                CAST(COLUMN_DEFAULT AS CHAR),
                CAST(COLUMN_KEY AS CHAR)
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
            "#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            WhisperError::query(format!("Failed to fetch columns for {table_name}: {e}"))
        })?;

        let primary_key = rows
            .iter()
            .filter(|(_, _, _, _, key)| key == "PRI")
            .map(|(name, ..)| name.clone())
            .collect();

        let columns = rows
            .into_iter()
            .map(|(name, data_type, is_nullable, default, _)| Column {
                name,
                data_type,
                is_nullable: is_nullable == "YES",
                default,
            })
            .collect();

        Ok((columns, primary_key))
    }

    /// Reads a few rows from a table for the prompt.
    ///
    /// Failures are logged and yield no rows; a table the user cannot read
    /// still appears in the schema.
    async fn fetch_sample_rows(&self, table_name: &str) -> Vec<Row> {
        let sql = format!(
            "SELECT * FROM {} LIMIT {}",
            quote_identifier(table_name),
            SAMPLE_ROWS_PER_TABLE
        );

        match self.pool.fetch_all(sql.as_str()).await {
            Ok(rows) => rows.iter().map(convert_row).collect(),
            Err(e) => {
                warn!(table = table_name, error = %e, "Failed to read sample rows");
                Vec::new()
            }
        }
    }

    /// Fetches all foreign key relationships, grouped by constraint.
    async fn fetch_foreign_keys(&self) -> Result<Vec<ForeignKey>> {
        let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT
                CAST(CONSTRAINT_NAME AS CHAR),
                CAST(TABLE_NAME AS CHAR),
                CAST(COLUMN_NAME AS CHAR),
                CAST(REFERENCED_TABLE_NAME AS CHAR),
                CAST(REFERENCED_COLUMN_NAME AS CHAR)
            FROM information_schema.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = DATABASE() AND REFERENCED_TABLE_NAME IS NOT NULL
            ORDER BY TABLE_NAME, CONSTRAINT_NAME, ORDINAL_POSITION
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| WhisperError::query(format!("Failed to fetch foreign keys: {e}")))?;

        let mut foreign_keys: Vec<(String, ForeignKey)> = Vec::new();

        for (constraint, from_table, from_column, to_table, to_column) in rows {
            match foreign_keys.last_mut() {
                Some((name, fk)) if *name == constraint && fk.from_table == from_table => {
                    fk.from_columns.push(from_column);
                    fk.to_columns.push(to_column);
                }
                _ => foreign_keys.push((
                    constraint,
                    ForeignKey::new(from_table, vec![from_column], to_table, vec![to_column]),
                )),
            }
        }

        Ok(foreign_keys.into_iter().map(|(_, fk)| fk).collect())
    }
}

/// Drops trailing whitespace and statement terminators.
fn strip_terminator(sql: &str) -> &str {
    sql.trim().trim_end_matches(';').trim_end()
}

/// Whether a statement produces a result set rather than an affected-row count.
fn returns_rows(sql: &str) -> bool {
    let first = sql
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or("");
    let keyword = if first.is_empty() && sql.starts_with('(') {
        "("
    } else {
        first
    };

    ROW_RETURNING_KEYWORDS
        .iter()
        .any(|k| k.eq_ignore_ascii_case(keyword))
}

/// Quotes an identifier with backticks.
fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a MySqlRow to our Value type.
///
/// Rows come from the text protocol, so the value is read as text and then
/// interpreted according to the column type.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    let type_name = type_name.to_uppercase();

    if matches!(
        type_name.as_str(),
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" | "BIT"
            | "GEOMETRY"
    ) {
        return row
            .try_get_unchecked::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null);
    }

    let Some(text) = row
        .try_get_unchecked::<Option<String>, _>(index)
        .ok()
        .flatten()
    else {
        return Value::Null;
    };

    parse_text_value(&type_name, text)
}

/// Interprets the textual form of a value by its MySQL type name.
fn parse_text_value(type_name: &str, text: String) -> Value {
    let base = type_name.split_whitespace().next().unwrap_or("");

    match base {
        "BOOLEAN" => match text.as_str() {
            "0" => Value::Bool(false),
            "1" => Value::Bool(true),
            _ => Value::String(text),
        },
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" | "YEAR" => text
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or(Value::String(text)),
        "FLOAT" | "DOUBLE" | "REAL" => text
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or(Value::String(text)),
        _ => Value::String(text),
    }
}

/// Maps a failed connection attempt to a DataWhisperer error.
///
/// Server errors carry a MySQL error number; "Unknown database" becomes
/// `DatabaseNotFound` and everything else a connection error.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> WhisperError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port();
    let database = config.database.as_deref().unwrap_or_default();

    match &error {
        sqlx::Error::Database(db_error) => {
            let number = db_error
                .try_downcast_ref::<MySqlDatabaseError>()
                .map(MySqlDatabaseError::number);
            match number {
                Some(code) => connect_error_for_code(code, db_error.message(), database),
                None => WhisperError::connection(db_error.message().to_string()),
            }
        }
        sqlx::Error::Io(_) => WhisperError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        )),
        sqlx::Error::PoolTimedOut => WhisperError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        )),
        sqlx::Error::Tls(e) => WhisperError::connection(format!("TLS error: {e}")),
        sqlx::Error::Protocol(msg) => WhisperError::connection(msg.clone()),
        sqlx::Error::Configuration(e) => WhisperError::config(e.to_string()),
        _ => WhisperError::internal(error.to_string()),
    }
}

/// Classifies a MySQL server error number raised while connecting.
pub fn connect_error_for_code(code: u16, message: &str, database: &str) -> WhisperError {
    if code == ER_BAD_DB_ERROR {
        WhisperError::database_not_found(database)
    } else {
        WhisperError::connection(format!("{message} (error {code})"))
    }
}

/// Formats a query error with the server error number when available.
fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => match db_error.try_downcast_ref::<MySqlDatabaseError>() {
            Some(mysql_error) => format!(
                "ERROR {} ({}): {}",
                mysql_error.number(),
                mysql_error.code().unwrap_or("HY000"),
                mysql_error.message()
            ),
            None => format!("ERROR: {}", db_error.message()),
        },
        None => error.to_string(),
    }
}
