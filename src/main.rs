//! DataWhisperer - chat with a MySQL database in natural language.

use std::sync::Arc;

use datawhisperer::app::Orchestrator;
use datawhisperer::cli::Cli;
use datawhisperer::config::{Config, ConnectionConfig, LlmConfig};
use datawhisperer::db::{Connector, MockConnector, MockDatabaseClient, MySqlConnector};
use datawhisperer::error::{Result, WhisperError};
use datawhisperer::llm::{create_client, LlmProvider};
use datawhisperer::{logging, tui};
use tracing::{error, info};

/// Database name used with `--mock-db` when none is given.
const MOCK_DATABASE: &str = "chinook";

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    if cli.is_headless() {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    cli.validate_headless().map_err(WhisperError::config)?;

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let connection = resolve_connection(&cli, &config)?;
    let (provider, llm_config) = resolve_llm(&cli, &config)?;
    info!(provider = %provider, connection = %connection.display_string(), "Starting");

    let llm = create_client(provider, &llm_config)?;
    let connector: Arc<dyn Connector> = if cli.mock_db {
        Arc::new(MockConnector::new(MockDatabaseClient::chinook()))
    } else {
        Arc::new(MySqlConnector)
    };
    let orchestrator = Orchestrator::with_connector(connector, llm);

    let has_database = connection.has_database();

    if cli.is_headless() {
        let target = has_database.then_some(connection);
        return tui::headless::run_headless(&cli, orchestrator, target).await;
    }

    tui::run(orchestrator, &connection, has_database).await?;
    Ok(0)
}

/// Resolves the connection settings.
///
/// Precedence: CLI arguments, then the config file, then the MySQL
/// environment variables, then the settings form defaults.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<ConnectionConfig> {
    let mut connection = config.connection.clone();

    if let Some(cli_connection) = cli.to_connection_config()? {
        connection.merge(&cli_connection);
    }

    connection.apply_env_defaults();
    connection.apply_form_defaults();

    if cli.mock_db && !connection.has_database() {
        connection.database = Some(MOCK_DATABASE.to_string());
    }

    Ok(connection)
}

/// Resolves the LLM provider and its settings; CLI flags win over the file.
fn resolve_llm(cli: &Cli, config: &Config) -> Result<(LlmProvider, LlmConfig)> {
    let name = cli.llm.as_deref().unwrap_or(&config.llm.provider);
    let provider: LlmProvider = name.parse().map_err(WhisperError::config)?;

    let mut llm_config = config.llm.clone();
    if let Some(model) = &cli.model {
        llm_config.model = Some(model.clone());
    }

    Ok((provider, llm_config))
}
