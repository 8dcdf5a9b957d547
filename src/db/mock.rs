//! Mock database clients for testing and `--mock-db` runs.
//!
//! `MockDatabaseClient` answers SELECTs from the sample rows of its schema,
//! so the pipeline can be driven end to end without a server.

use super::{
    Column, ColumnInfo, Connector, DatabaseClient, ForeignKey, QueryResult, Row, Schema, Table,
    Value,
};
use crate::config::ConnectionConfig;
use crate::error::{Result, WhisperError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mock database client that returns predefined results.
///
/// Clones share their statement log, so a test can keep one clone and hand
/// the other to the code under test.
#[derive(Debug, Clone, Default)]
pub struct MockDatabaseClient {
    schema: Schema,
    responses: Vec<(String, QueryResult)>,
    executed: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new mock database client with the given schema.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    /// A small music catalogue with artists, albums and tracks.
    pub fn chinook() -> Self {
        Self::with_schema(chinook_schema())
    }

    /// Returns `result` for any statement containing `pattern`.
    pub fn with_response(mut self, pattern: impl Into<String>, result: QueryResult) -> Self {
        self.responses.push((pattern.into(), result));
        self
    }

    /// Statements executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Number of times `close` was called on this client or its clones.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn record(&self, sql: &str) -> Result<()> {
        self.executed
            .lock()
            .map_err(|_| WhisperError::internal("mock statement log poisoned"))?
            .push(sql.to_string());
        Ok(())
    }

    /// Answers a SELECT from the sample rows of the table it names.
    fn select_from_samples(&self, sql: &str) -> Option<QueryResult> {
        let upper = sql.to_ascii_uppercase();
        let from = upper.find(" FROM ")?;
        let table_name = sql[from + 6..]
            .split_whitespace()
            .next()?
            .trim_matches(|c| c == '`' || c == ';');
        let table = self.schema.table(table_name)?;

        let select_list = sql[..from].trim_start()[6..].trim();

        if select_list.to_ascii_uppercase().starts_with("COUNT(*)") {
            let name = select_list
                .rsplit_once(|c: char| c.is_whitespace())
                .map_or(select_list, |(_, alias)| alias);
            return Some(QueryResult::with_data(
                vec![ColumnInfo::new(name, "bigint")],
                vec![vec![Value::from(table.sample_rows.len() as i64)]],
            ));
        }

        let projection: Vec<usize> = if select_list == "*" {
            (0..table.columns.len()).collect()
        } else {
            select_list
                .split(',')
                .filter_map(|item| table.column_index(item.trim()))
                .collect()
        };
        let projection = if projection.is_empty() {
            (0..table.columns.len()).collect()
        } else {
            projection
        };

        let limit = parse_limit(&upper).unwrap_or(usize::MAX);

        let columns = projection
            .iter()
            .map(|&i| ColumnInfo::new(&table.columns[i].name, &table.columns[i].data_type))
            .collect();
        let rows: Vec<Row> = table
            .sample_rows
            .iter()
            .take(limit)
            .map(|row| projection.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Some(QueryResult::with_data(columns, rows))
    }
}

fn parse_limit(upper_sql: &str) -> Option<usize> {
    let at = upper_sql.rfind("LIMIT ")?;
    upper_sql[at + 6..]
        .split(|c: char| !c.is_ascii_digit())
        .next()?
        .parse()
        .ok()
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.record(sql)?;

        if let Some((_, result)) = self.responses.iter().find(|(p, _)| sql.contains(p.as_str())) {
            return Ok(result.clone());
        }

        let sql_upper = sql.trim_start().to_ascii_uppercase();

        let result = if sql_upper.starts_with("SELECT") {
            self.select_from_samples(sql.trim_start()).unwrap_or_else(|| {
                QueryResult::with_data(
                    vec![ColumnInfo::new("result", "TEXT")],
                    vec![vec![Value::String(format!("Mock result for: {}", sql))]],
                )
            })
        } else {
            QueryResult::affected(1)
        };

        Ok(result.with_execution_time(Duration::from_millis(1)))
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A database client whose statements always fail.
#[derive(Debug, Clone)]
pub struct FailingDatabaseClient {
    schema: Schema,
    message: String,
}

impl FailingDatabaseClient {
    /// Creates a client that rejects every statement with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            schema: chinook_schema(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(WhisperError::query(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockServerState {
    Online,
    Offline,
    Broken,
}

/// Connector that hands out clones of a template `MockDatabaseClient`.
#[derive(Debug, Clone)]
pub struct MockConnector {
    template: MockDatabaseClient,
    databases: Option<Vec<String>>,
    state: MockServerState,
    opens: Arc<AtomicUsize>,
}

impl MockConnector {
    /// Creates a connector that accepts any database name.
    pub fn new(template: MockDatabaseClient) -> Self {
        Self {
            template,
            databases: None,
            state: MockServerState::Online,
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Restricts the databases that exist on the mock server.
    pub fn with_databases(mut self, databases: &[&str]) -> Self {
        self.databases = Some(databases.iter().map(|d| d.to_string()).collect());
        self
    }

    /// Makes every connection attempt fail as if the host were unreachable.
    pub fn offline(mut self) -> Self {
        self.state = MockServerState::Offline;
        self
    }

    /// Makes every connection attempt fail with an unclassified error.
    pub fn broken(mut self) -> Self {
        self.state = MockServerState::Broken;
        self
    }

    /// Number of connection attempts made so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        match self.state {
            MockServerState::Offline => {
                return Err(WhisperError::connection(format!(
                    "Cannot connect to {}:{}. Check that the server is running.",
                    config.host.as_deref().unwrap_or("localhost"),
                    config.port()
                )))
            }
            MockServerState::Broken => {
                return Err(WhisperError::internal("mock server misbehaved"));
            }
            MockServerState::Online => {}
        }

        let database = config.database.as_deref().unwrap_or_default();
        if let Some(known) = &self.databases {
            if !known.iter().any(|d| d == database) {
                return Err(WhisperError::database_not_found(database));
            }
        }

        Ok(Box::new(self.template.clone()))
    }
}

fn chinook_schema() -> Schema {
    let artists = [
        "AC/DC",
        "Accept",
        "Aerosmith",
        "Alanis Morissette",
        "Alice In Chains",
        "Antônio Carlos Jobim",
        "Apocalyptica",
        "Audioslave",
        "BackBeat",
        "Billy Cobham",
        "Black Label Society",
        "Black Sabbath",
    ];
    let albums = [
        (1, "For Those About To Rock We Salute You", 1),
        (2, "Balls to the Wall", 2),
        (3, "Restless and Wild", 2),
        (4, "Let There Be Rock", 1),
        (5, "Big Ones", 3),
    ];
    let tracks = [
        (1, "For Those About To Rock (We Salute You)", 1, 343719, 0.99),
        (2, "Balls to the Wall", 2, 342562, 0.99),
        (3, "Fast As a Shark", 3, 230619, 0.99),
        (4, "Restless and Wild", 3, 252051, 0.99),
        (5, "Go Down", 4, 331180, 0.99),
        (6, "Walk On Water", 5, 295680, 0.99),
    ];

    Schema {
        tables: vec![
            Table::new("Album")
                .with_column(Column::new("AlbumId", "int").nullable(false))
                .with_column(Column::new("Title", "varchar(160)").nullable(false))
                .with_column(Column::new("ArtistId", "int").nullable(false))
                .with_primary_key(&["AlbumId"])
                .with_rows(
                    albums
                        .iter()
                        .map(|&(id, title, artist)| {
                            vec![Value::from(id), Value::from(title), Value::from(artist)]
                        })
                        .collect(),
                ),
            Table::new("Artist")
                .with_column(Column::new("ArtistId", "int").nullable(false))
                .with_column(Column::new("Name", "varchar(120)"))
                .with_primary_key(&["ArtistId"])
                .with_rows(
                    artists
                        .iter()
                        .zip(1..)
                        .map(|(name, id)| vec![Value::from(id), Value::from(*name)])
                        .collect(),
                ),
            Table::new("Track")
                .with_column(Column::new("TrackId", "int").nullable(false))
                .with_column(Column::new("Name", "varchar(200)").nullable(false))
                .with_column(Column::new("AlbumId", "int"))
                .with_column(Column::new("Milliseconds", "int").nullable(false))
                .with_column(Column::new("UnitPrice", "decimal(10,2)").nullable(false))
                .with_primary_key(&["TrackId"])
                .with_rows(
                    tracks
                        .iter()
                        .map(|&(id, name, album, ms, price)| {
                            vec![
                                Value::from(id),
                                Value::from(name),
                                Value::from(album),
                                Value::from(ms),
                                Value::from(price),
                            ]
                        })
                        .collect(),
                ),
        ],
        foreign_keys: vec![
            ForeignKey::new(
                "Album",
                vec!["ArtistId".to_string()],
                "Artist",
                vec!["ArtistId".to_string()],
            ),
            ForeignKey::new(
                "Track",
                vec!["AlbumId".to_string()],
                "Album",
                vec!["AlbumId".to_string()],
            ),
        ],
    }
}
