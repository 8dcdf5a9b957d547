//! Connection manager tests against a live MySQL server.
//!
//! Skipped unless DATABASE_URL is set.

use datawhisperer::config::ConnectionConfig;
use datawhisperer::connection::{ConnectStatus, ConnectionManager};
use datawhisperer::db::{DatabaseClient, MySqlClient};

/// Helper to get the test connection settings from the environment.
fn get_test_config() -> Option<ConnectionConfig> {
    let url = std::env::var("DATABASE_URL").ok()?;
    ConnectionConfig::from_connection_string(&url).ok()
}

#[tokio::test]
async fn test_connect_and_answer_from_schema() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let mut manager = ConnectionManager::default();
    assert_eq!(manager.connect(&config).await, ConnectStatus::Connected);

    let db = manager.db().unwrap();
    let schema = db.schema_text().await.unwrap();
    assert!(schema.starts_with("Database Schema (MySQL):"));

    let result = db.execute_query("SELECT 1 AS one;").await.unwrap();
    assert_eq!(result.format_for_llm(), "one\n1");

    manager.close().await.unwrap();
    assert!(!manager.is_connected());
}

#[tokio::test]
async fn test_missing_database_status() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let missing = ConnectionConfig {
        database: Some("datawhisperer_missing_db".to_string()),
        ..config
    };

    let mut manager = ConnectionManager::default();
    let status = manager.connect(&missing).await;

    assert_eq!(
        status,
        ConnectStatus::DatabaseNotFound {
            database: "datawhisperer_missing_db".to_string()
        }
    );
    assert!(!manager.is_connected());
}

#[tokio::test]
async fn test_failed_reconnect_keeps_handle() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let mut manager = ConnectionManager::default();
    assert!(manager.connect(&config).await.is_connected());

    let unreachable = ConnectionConfig {
        host: Some("127.0.0.1".to_string()),
        port: Some(1),
        ..config.clone()
    };
    assert_eq!(manager.connect(&unreachable).await, ConnectStatus::Failed);

    assert_eq!(manager.current_config(), Some(&config));
    let db = manager.db().unwrap();
    assert!(db.execute_query("SELECT 1").await.is_ok());
}

#[tokio::test]
async fn test_query_error_is_reported() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let Ok(client) = MySqlClient::connect(&config).await else {
        eprintln!("Skipping test: could not connect");
        return;
    };

    let err = client
        .execute_query("SELECT * FROM datawhisperer_no_such_table")
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Query error:"));

    client.close().await.unwrap();
}
