//! SQL execution stage.
//!
//! Runs a validated statement once against the active handle and times it.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::db::{DatabaseClient, QueryResult};
use crate::error::{Result, WhisperError};

/// Executes validated statements against a database client.
pub struct QueryExecutor<'a> {
    db: &'a dyn DatabaseClient,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(db: &'a dyn DatabaseClient) -> Self {
        Self { db }
    }

    /// Executes `sql` exactly once.
    ///
    /// Driver failures are reported as `WhisperError::Query`.
    pub async fn execute(&self, sql: &str) -> Result<QueryOutcome> {
        debug!(sql = %sql, "Executing statement");

        let start = Instant::now();
        let result = self.db.execute_query(sql).await;
        let execution_time = start.elapsed();

        match result {
            Ok(result) => {
                info!(
                    rows = result.row_count,
                    rows_affected = ?result.rows_affected,
                    duration_ms = execution_time.as_millis() as u64,
                    "Statement executed"
                );
                Ok(QueryOutcome {
                    result,
                    execution_time,
                })
            }
            Err(e @ WhisperError::Query(_)) => Err(e),
            Err(e) => Err(WhisperError::query(e.to_string())),
        }
    }
}

/// Successful query execution outcome.
#[derive(Debug)]
pub struct QueryOutcome {
    /// The query result.
    pub result: QueryResult,
    /// How long the query took to execute.
    pub execution_time: Duration,
}

impl QueryOutcome {
    /// The result rendered for the answer prompt.
    pub fn response_text(&self) -> String {
        self.result.format_for_llm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FailingDatabaseClient, MockDatabaseClient};

    #[tokio::test]
    async fn test_execute_select() {
        let mock_db = MockDatabaseClient::chinook();
        let executor = QueryExecutor::new(&mock_db);

        let outcome = executor
            .execute("SELECT Name FROM Artist LIMIT 3;")
            .await
            .unwrap();

        assert_eq!(outcome.result.row_count, 3);
        assert_eq!(outcome.response_text(), "Name\nAC/DC\nAccept\nAerosmith");
    }

    #[tokio::test]
    async fn test_execute_runs_exact_text_once() {
        let mock_db = MockDatabaseClient::new();
        let recorder = mock_db.clone();
        let executor = QueryExecutor::new(&mock_db);

        executor
            .execute("UPDATE Artist SET Name = 'x' WHERE ArtistId = 1")
            .await
            .unwrap();

        assert_eq!(
            recorder.executed(),
            vec!["UPDATE Artist SET Name = 'x' WHERE ArtistId = 1"]
        );
    }

    #[tokio::test]
    async fn test_execute_mutation_reports_affected_rows() {
        let mock_db = MockDatabaseClient::new();
        let executor = QueryExecutor::new(&mock_db);

        let outcome = executor
            .execute("DELETE FROM Artist WHERE ArtistId = 1")
            .await
            .unwrap();

        assert_eq!(outcome.response_text(), "1 row affected");
    }

    #[tokio::test]
    async fn test_execute_error_is_query_error() {
        let failing = FailingDatabaseClient::new("Table 'chinook.Nope' doesn't exist");
        let executor = QueryExecutor::new(&failing);

        let err = executor.execute("SELECT * FROM Nope").await.unwrap_err();

        assert!(matches!(err, WhisperError::Query(_)));
        assert!(err.to_string().contains("chinook.Nope"));
    }
}
