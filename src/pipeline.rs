//! The question-answering pipeline.
//!
//! SQL generation, validation, execution and answer generation for one
//! question. The transcript is read but never modified here.

use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::db::DatabaseClient;
use crate::error::Result;
use crate::llm::LlmService;
use crate::query::QueryExecutor;
use crate::safety::{validate_sql, Validation, REFUSAL_MESSAGE};
use crate::session::Turn;

/// What the pipeline produced for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// The statement ran and the model described the result.
    Answered {
        /// Statement that was executed.
        sql: String,
        /// Natural-language answer.
        answer: String,
    },
    /// The generated text was not an allowed statement.
    Refused {
        /// What the model produced instead.
        generated: String,
    },
}

impl PipelineOutcome {
    /// The reply shown to the user and stored in the transcript.
    pub fn reply(&self) -> &str {
        match self {
            Self::Answered { answer, .. } => answer,
            Self::Refused { .. } => REFUSAL_MESSAGE,
        }
    }

    /// The executed statement, if any.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Answered { sql, .. } => Some(sql),
            Self::Refused { .. } => None,
        }
    }
}

/// Answers `question` against `db`.
///
/// The schema text is fetched separately for each model stage. Execution
/// and model errors are returned as-is; a rejected statement is a normal
/// outcome.
pub async fn run(
    llm: &LlmService,
    db: &dyn DatabaseClient,
    history: &[Turn],
    question: &str,
) -> Result<PipelineOutcome> {
    let start = Instant::now();

    let schema = db.schema_text().await?;
    let generated = llm.generate_sql(&schema, history, question).await?;

    let sql = match validate_sql(&generated) {
        Validation::Valid(sql) => sql,
        Validation::Rejected => {
            warn!(generated = %generated, "Generated text is not an allowed statement");
            return Ok(PipelineOutcome::Refused { generated });
        }
    };

    let outcome = QueryExecutor::new(db).execute(&sql).await?;
    let response = outcome.response_text();

    let schema = db.schema_text().await?;
    let answer = llm
        .generate_answer(&schema, history, &sql, question, &response)
        .await?;

    info!(
        total_duration_ms = start.elapsed().as_millis() as u64,
        "Question answered"
    );

    Ok(PipelineOutcome::Answered { sql, answer })
}
