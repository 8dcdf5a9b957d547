//! Output formatting for headless mode.

use std::time::Duration;

use serde::Serialize;

use crate::app::{InputResult, NOT_CONNECTED_MESSAGE};
use crate::cli::OutputFormat;
use crate::error::WhisperError;
use crate::pipeline::PipelineOutcome;

/// How a single headless question ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Answered,
    Refused,
    NotConnected,
    Error,
}

/// One processed question, as written in JSON mode.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionRecord {
    pub question: String,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl QuestionRecord {
    /// Builds a record from an orchestrator result.
    ///
    /// Returns `None` for blank input, which produces no output at all.
    pub fn from_result(
        question: &str,
        result: &Result<InputResult, WhisperError>,
        duration: Duration,
    ) -> Option<Self> {
        let mut record = Self {
            question: question.trim().to_string(),
            status: RecordStatus::Error,
            sql: None,
            reply: None,
            error: None,
            duration_ms: duration.as_millis() as u64,
        };

        match result {
            Ok(InputResult::None) => return None,
            Ok(InputResult::NotConnected) => {
                record.status = RecordStatus::NotConnected;
                record.error = Some(NOT_CONNECTED_MESSAGE.to_string());
            }
            Ok(InputResult::Reply(outcome)) => {
                record.status = match outcome {
                    PipelineOutcome::Answered { .. } => RecordStatus::Answered,
                    PipelineOutcome::Refused { .. } => RecordStatus::Refused,
                };
                record.sql = outcome.sql().map(String::from);
                record.reply = Some(outcome.reply().to_string());
            }
            Err(e) => {
                record.error = Some(e.to_string());
            }
        }

        Some(record)
    }

    /// Returns true if the question did not get a reply.
    pub fn is_failure(&self) -> bool {
        matches!(self.status, RecordStatus::NotConnected | RecordStatus::Error)
    }
}

/// Formats headless records.
pub struct HeadlessOutput {
    format: OutputFormat,
}

impl HeadlessOutput {
    /// Creates a new output formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Text for stdout, if the record has any.
    ///
    /// In text mode only replies go to stdout; failures are reported through
    /// [`HeadlessOutput::notice`]. In JSON mode every record is one line.
    pub fn format(&self, record: &QuestionRecord) -> Option<String> {
        match self.format {
            OutputFormat::Text => record.reply.as_ref().map(|reply| format!("{reply}\n")),
            OutputFormat::Json => Some(self.format_json(record)),
        }
    }

    /// Text for stderr, if the record has any.
    pub fn notice(&self, record: &QuestionRecord) -> Option<String> {
        match self.format {
            OutputFormat::Text => record.error.as_ref().map(|error| format!("{error}\n")),
            OutputFormat::Json => None,
        }
    }

    fn format_json(&self, record: &QuestionRecord) -> String {
        let line = serde_json::to_string(record)
            .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {e}\"}}"));
        format!("{line}\n")
    }
}
