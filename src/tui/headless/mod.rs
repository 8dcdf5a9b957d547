//! Headless mode for scripting and automation.
//!
//! Answers questions without a terminal UI. Questions come from `--ask`
//! flags or, when none are given, from stdin one per line. Replies go to
//! stdout and notices to stderr.

mod output;

pub use output::{HeadlessOutput, QuestionRecord, RecordStatus};

use std::io::{BufRead, Write};
use std::time::Instant;

use tracing::info;

use crate::app::Orchestrator;
use crate::cli::{Cli, OutputFormat};
use crate::config::ConnectionConfig;
use crate::error::{Result, WhisperError};

/// Configuration for headless mode execution.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Output format.
    pub output_format: OutputFormat,
    /// Questions given on the command line.
    pub questions: Vec<String>,
}

impl HeadlessConfig {
    /// Creates a HeadlessConfig from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        cli.validate_headless().map_err(WhisperError::config)?;
        let output_format = cli.parse_output_format().map_err(WhisperError::config)?;

        Ok(Self {
            output_format,
            questions: cli.questions.clone(),
        })
    }
}

/// Result of headless execution.
#[derive(Debug, Default)]
pub struct HeadlessResult {
    /// Records for every non-blank question, in order.
    pub records: Vec<QuestionRecord>,
    /// Whether a database connection was active at the end of the run.
    pub connected: bool,
}

impl HeadlessResult {
    /// Number of questions that did not get a reply.
    pub fn failures(&self) -> usize {
        self.records.iter().filter(|r| r.is_failure()).count()
    }

    /// Process exit code: 0 when connected and every question got a reply.
    pub fn exit_code(&self) -> i32 {
        if self.connected && self.failures() == 0 {
            0
        } else {
            1
        }
    }
}

/// Runs questions through an orchestrator and writes the results.
pub struct HeadlessRunner<O: Write, E: Write> {
    orchestrator: Orchestrator,
    output: HeadlessOutput,
    stdout: O,
    stderr: E,
}

impl<O: Write, E: Write> HeadlessRunner<O, E> {
    /// Creates a new headless runner.
    pub fn new(orchestrator: Orchestrator, format: OutputFormat, stdout: O, stderr: E) -> Self {
        Self {
            orchestrator,
            output: HeadlessOutput::new(format),
            stdout,
            stderr,
        }
    }

    /// Connects with the given settings and reports the status on stderr.
    pub async fn connect(&mut self, config: &ConnectionConfig) -> Result<bool> {
        let status = self.orchestrator.connect(config).await;
        self.notice(&status.user_message())?;
        Ok(status.is_connected())
    }

    /// Answers each question in order, one at a time.
    pub async fn run<I>(mut self, questions: I) -> Result<HeadlessResult>
    where
        I: IntoIterator<Item = String>,
    {
        let mut result = HeadlessResult::default();

        for question in questions {
            let start = Instant::now();
            let outcome = self.orchestrator.handle_input(&question).await;

            let Some(record) = QuestionRecord::from_result(&question, &outcome, start.elapsed())
            else {
                continue;
            };

            if let Some(text) = self.output.format(&record) {
                self.write_out(&text)?;
            }
            if let Some(text) = self.output.notice(&record) {
                self.write_err(&text)?;
            }

            result.records.push(record);
        }

        result.connected = self.orchestrator.is_connected();
        self.orchestrator.close().await?;

        info!(
            questions = result.records.len(),
            failures = result.failures(),
            "Headless run complete"
        );

        Ok(result)
    }

    fn notice(&mut self, message: &str) -> Result<()> {
        self.write_err(&format!("{message}\n"))
    }

    fn write_out(&mut self, text: &str) -> Result<()> {
        self.stdout
            .write_all(text.as_bytes())
            .and_then(|_| self.stdout.flush())
            .map_err(|e| WhisperError::internal(format!("Failed to write output: {e}")))
    }

    fn write_err(&mut self, text: &str) -> Result<()> {
        self.stderr
            .write_all(text.as_bytes())
            .map_err(|e| WhisperError::internal(format!("Failed to write output: {e}")))
    }
}

/// Reads one question per line.
pub fn read_questions(reader: impl BufRead) -> Result<Vec<String>> {
    reader
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| WhisperError::internal(format!("Failed to read stdin: {e}")))
}

/// Runs headless mode from CLI arguments.
///
/// Returns the process exit code.
pub async fn run_headless(
    cli: &Cli,
    orchestrator: Orchestrator,
    connection: Option<ConnectionConfig>,
) -> Result<i32> {
    let config = HeadlessConfig::from_cli(cli)?;

    let questions = if config.questions.is_empty() {
        read_questions(std::io::stdin().lock())?
    } else {
        config.questions
    };

    let mut runner = HeadlessRunner::new(
        orchestrator,
        config.output_format,
        std::io::stdout(),
        std::io::stderr(),
    );

    match connection {
        Some(conn) => {
            runner.connect(&conn).await?;
        }
        None => {
            runner.notice("No database configured. Use --database or a connection string.")?;
        }
    }

    let result = runner.run(questions).await?;
    Ok(result.exit_code())
}
