//! Connection manager for the database handle lifecycle.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ConnectionConfig;
use crate::db::{Connector, DatabaseClient, MySqlConnector};
use crate::error::WhisperError;

/// Outcome of a connection attempt.
///
/// Connection failures are reported here instead of as errors so the caller
/// can show them and carry on with the previous state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectStatus {
    /// The new handle is active.
    Connected,
    /// The server has no database with this name.
    DatabaseNotFound { database: String },
    /// The server could not be reached or refused the login.
    Failed,
    /// Anything else, including an invalid configuration.
    Unexpected,
}

impl ConnectStatus {
    /// Classifies an error raised while opening a handle.
    pub fn from_error(error: &WhisperError) -> Self {
        match error {
            WhisperError::DatabaseNotFound(database) => Self::DatabaseNotFound {
                database: database.clone(),
            },
            WhisperError::Connection(_) => Self::Failed,
            _ => Self::Unexpected,
        }
    }

    /// Returns true for a successful attempt.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// The message shown to the user for this outcome.
    pub fn user_message(&self) -> String {
        match self {
            Self::Connected => "Connected to Database".to_string(),
            Self::DatabaseNotFound { database } => format!(
                "The database '{database}' does not exist. Please create the database and try again."
            ),
            Self::Failed => {
                "Failed to connect to the database. Please check your connection settings."
                    .to_string()
            }
            Self::Unexpected => "An unexpected error occurred.".to_string(),
        }
    }
}

impl fmt::Display for ConnectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

/// An active database connection with its metadata.
pub struct ActiveConnection {
    /// Settings the handle was opened with.
    pub config: ConnectionConfig,
    /// Database client.
    pub db: Box<dyn DatabaseClient>,
}

/// Owns the session's single database handle.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    active: Option<ActiveConnection>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(Arc::new(MySqlConnector))
    }
}

impl ConnectionManager {
    /// Creates a disconnected manager that opens handles through `connector`.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            active: None,
        }
    }

    /// Creates a connection manager with an existing connection.
    pub fn with_connection(
        connector: Arc<dyn Connector>,
        db: Box<dyn DatabaseClient>,
        config: ConnectionConfig,
    ) -> Self {
        Self {
            connector,
            active: Some(ActiveConnection { config, db }),
        }
    }

    /// Attempts to open a handle for `config`.
    ///
    /// On success the previous handle is closed and replaced. On failure the
    /// previous handle, if any, stays active.
    pub async fn connect(&mut self, config: &ConnectionConfig) -> ConnectStatus {
        let db = match self.connector.open(config).await {
            Ok(db) => db,
            Err(e) => {
                let status = ConnectStatus::from_error(&e);
                warn!(
                    target_db = %config.display_string(),
                    error = %e,
                    status = ?status,
                    "Connection attempt failed"
                );
                return status;
            }
        };

        if let Some(old) = self.active.take() {
            if let Err(e) = old.db.close().await {
                warn!(error = %e, "Failed to close previous connection");
            }
        }

        info!(target_db = %config.display_string(), "Connected to database");
        self.active = Some(ActiveConnection {
            config: config.clone(),
            db,
        });

        ConnectStatus::Connected
    }

    /// Get the active database client.
    pub fn db(&self) -> Option<&dyn DatabaseClient> {
        self.active.as_ref().map(|c| c.db.as_ref())
    }

    /// Settings of the active connection.
    pub fn current_config(&self) -> Option<&ConnectionConfig> {
        self.active.as_ref().map(|c| &c.config)
    }

    /// Check if there's an active connection.
    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// Close the active connection.
    pub async fn close(&mut self) -> crate::error::Result<()> {
        if let Some(conn) = self.active.take() {
            conn.db.close().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MockConnector, MockDatabaseClient};
    use pretty_assertions::assert_eq;

    fn config_for(database: &str) -> ConnectionConfig {
        ConnectionConfig {
            database: Some(database.to_string()),
            ..ConnectionConfig::form_defaults()
        }
    }

    #[test]
    fn test_new_manager_has_no_connection() {
        let manager = ConnectionManager::new(Arc::new(MockConnector::new(MockDatabaseClient::new())));
        assert!(!manager.is_connected());
        assert!(manager.db().is_none());
        assert!(manager.current_config().is_none());
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(ConnectStatus::Connected.user_message(), "Connected to Database");
        assert_eq!(
            ConnectStatus::DatabaseNotFound {
                database: "nope".to_string()
            }
            .user_message(),
            "The database 'nope' does not exist. Please create the database and try again."
        );
        assert_eq!(
            ConnectStatus::Failed.to_string(),
            "Failed to connect to the database. Please check your connection settings."
        );
        assert_eq!(
            ConnectStatus::Unexpected.user_message(),
            "An unexpected error occurred."
        );
    }

    #[test]
    fn test_status_from_error() {
        assert_eq!(
            ConnectStatus::from_error(&WhisperError::database_not_found("x")),
            ConnectStatus::DatabaseNotFound {
                database: "x".to_string()
            }
        );
        assert_eq!(
            ConnectStatus::from_error(&WhisperError::connection("refused")),
            ConnectStatus::Failed
        );
        assert_eq!(
            ConnectStatus::from_error(&WhisperError::config("Database name is required")),
            ConnectStatus::Unexpected
        );
        assert_eq!(
            ConnectStatus::from_error(&WhisperError::internal("boom")),
            ConnectStatus::Unexpected
        );
    }

    #[tokio::test]
    async fn test_connect_success() {
        let connector = MockConnector::new(MockDatabaseClient::chinook());
        let mut manager = ConnectionManager::new(Arc::new(connector));

        let status = manager.connect(&config_for("chinook")).await;

        assert_eq!(status, ConnectStatus::Connected);
        assert!(manager.is_connected());
        assert_eq!(
            manager.current_config().and_then(|c| c.database.as_deref()),
            Some("chinook")
        );
    }

    #[tokio::test]
    async fn test_missing_database_reported() {
        let connector = MockConnector::new(MockDatabaseClient::chinook()).with_databases(&["chinook"]);
        let mut manager = ConnectionManager::new(Arc::new(connector));

        let status = manager.connect(&config_for("nonexistent")).await;

        assert_eq!(
            status.user_message(),
            "The database 'nonexistent' does not exist. Please create the database and try again."
        );
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn test_failed_attempt_keeps_previous_handle() {
        let db = MockDatabaseClient::chinook();
        let recorder = db.clone();
        let connector = MockConnector::new(db).with_databases(&["chinook"]);
        let mut manager = ConnectionManager::new(Arc::new(connector));

        assert!(manager.connect(&config_for("chinook")).await.is_connected());
        let status = manager.connect(&config_for("missing")).await;

        assert!(matches!(status, ConnectStatus::DatabaseNotFound { .. }));
        assert!(manager.is_connected());
        assert_eq!(
            manager.current_config().and_then(|c| c.database.as_deref()),
            Some("chinook")
        );
        assert_eq!(recorder.close_count(), 0);
    }

    #[tokio::test]
    async fn test_reconnect_closes_old_handle() {
        let db = MockDatabaseClient::chinook();
        let recorder = db.clone();
        let mut manager = ConnectionManager::new(Arc::new(MockConnector::new(db)));

        manager.connect(&config_for("chinook")).await;
        manager.connect(&config_for("sakila")).await;

        assert_eq!(recorder.close_count(), 1);
        assert_eq!(
            manager.current_config().and_then(|c| c.database.as_deref()),
            Some("sakila")
        );
    }

    #[tokio::test]
    async fn test_unreachable_and_unexpected() {
        let mut offline = ConnectionManager::new(Arc::new(
            MockConnector::new(MockDatabaseClient::new()).offline(),
        ));
        assert_eq!(offline.connect(&config_for("chinook")).await, ConnectStatus::Failed);

        let mut broken = ConnectionManager::new(Arc::new(
            MockConnector::new(MockDatabaseClient::new()).broken(),
        ));
        assert_eq!(
            broken.connect(&config_for("chinook")).await,
            ConnectStatus::Unexpected
        );
    }

    #[tokio::test]
    async fn test_close() {
        let db = MockDatabaseClient::new();
        let recorder = db.clone();
        let mut manager = ConnectionManager::with_connection(
            Arc::new(MockConnector::new(MockDatabaseClient::new())),
            Box::new(db),
            config_for("chinook"),
        );

        manager.close().await.unwrap();

        assert!(!manager.is_connected());
        assert_eq!(recorder.close_count(), 1);
    }
}
