//! Core orchestrator for DataWhisperer.
//!
//! Owns the session and the LLM service and turns user input into pipeline
//! runs. Both the TUI and the headless runner go through `handle_input`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ConnectionConfig;
use crate::connection::{ConnectStatus, ConnectionManager};
use crate::db::Connector;
use crate::error::Result;
use crate::llm::{LlmClient, LlmService};
use crate::pipeline::{self, PipelineOutcome};
use crate::session::{Session, Transcript, Turn};

/// Warning shown when a question arrives before any connection succeeded.
pub const NOT_CONNECTED_MESSAGE: &str =
    "Database not connected. Please connect to the database first.";

/// Result of processing user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResult {
    /// Blank input; nothing happened.
    None,
    /// No database handle is active; the transcript is untouched.
    NotConnected,
    /// The pipeline completed and both turns were recorded.
    Reply(PipelineOutcome),
}

/// The main orchestrator that coordinates all components.
pub struct Orchestrator {
    session: Session,
    llm: LlmService,
}

impl Orchestrator {
    /// Creates an orchestrator around an existing session.
    pub fn new(session: Session, llm: Box<dyn LlmClient>) -> Self {
        Self {
            session,
            llm: LlmService::new(llm),
        }
    }

    /// Creates a disconnected orchestrator that opens handles through `connector`.
    pub fn with_connector(connector: Arc<dyn Connector>, llm: Box<dyn LlmClient>) -> Self {
        Self::new(Session::new(ConnectionManager::new(connector)), llm)
    }

    /// The session transcript.
    pub fn transcript(&self) -> &Transcript {
        self.session.transcript()
    }

    /// Returns true if a database handle is active.
    pub fn is_connected(&self) -> bool {
        self.session.connections().is_connected()
    }

    /// Settings of the active connection, if any.
    pub fn current_connection(&self) -> Option<&ConnectionConfig> {
        self.session.connections().current_config()
    }

    /// Attempts to (re)connect. Failures leave the current handle in place.
    pub async fn connect(&mut self, config: &ConnectionConfig) -> ConnectStatus {
        self.session.connections_mut().connect(config).await
    }

    /// Handles one line of user input.
    ///
    /// Both prompts see the transcript followed by the current question.
    /// Turns are recorded only when the pipeline completes, so a failed
    /// question leaves the transcript exactly as it was.
    pub async fn handle_input(&mut self, input: &str) -> Result<InputResult> {
        let question = input.trim();

        if question.is_empty() {
            return Ok(InputResult::None);
        }

        let Some(db) = self.session.connections().db() else {
            warn!("Question received without an active connection");
            return Ok(InputResult::NotConnected);
        };

        debug!(question_len = question.len(), "Running pipeline");

        let mut history = self.session.transcript().all().to_vec();
        history.push(Turn::human(question));

        let outcome = pipeline::run(&self.llm, db, &history, question).await?;

        self.session.record_exchange(question, outcome.reply());

        Ok(InputResult::Reply(outcome))
    }

    /// Closes the database handle.
    pub async fn close(&mut self) -> Result<()> {
        self.session.connections_mut().close().await
    }
}
