//! LLM service for the two model-backed pipeline stages.
//!
//! Both stages build one prompt, send it as a single user message and
//! return the trimmed reply. Neither stage retries.

use std::time::Instant;

use crate::error::Result;
use crate::session::Turn;

use super::{build_answer_prompt, build_messages, build_sql_prompt, clean_sql_output, LlmClient};

/// LLM service wrapping a client.
pub struct LlmService {
    client: Box<dyn LlmClient>,
}

impl LlmService {
    /// Creates a new LLM service.
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// SQL generation stage.
    ///
    /// Returns the model's statement text, trimmed and with a surrounding
    /// code fence removed. The text is not validated here.
    pub async fn generate_sql(
        &self,
        schema: &str,
        history: &[Turn],
        question: &str,
    ) -> Result<String> {
        let start = Instant::now();
        let prompt = build_sql_prompt(schema, history, question);

        tracing::debug!(
            prompt_len = prompt.len(),
            history_turns = history.len(),
            "Requesting SQL generation"
        );

        let raw = self.client.complete(&build_messages(prompt)).await?;
        let sql = clean_sql_output(&raw);

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            sql_len = sql.len(),
            "SQL generation complete"
        );

        Ok(sql)
    }

    /// Answer generation stage.
    pub async fn generate_answer(
        &self,
        schema: &str,
        history: &[Turn],
        sql: &str,
        question: &str,
        response: &str,
    ) -> Result<String> {
        let start = Instant::now();
        let prompt = build_answer_prompt(schema, history, sql, question, response);

        tracing::debug!(
            prompt_len = prompt.len(),
            response_len = response.len(),
            "Requesting answer generation"
        );

        let answer = self.client.complete(&build_messages(prompt)).await?;
        let answer = answer.trim().to_string();

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            answer_len = answer.len(),
            "Answer generation complete"
        );

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WhisperError;
    use crate::llm::MockLlmClient;

    const SCHEMA: &str = "Table: Artist\n  - Name: varchar(120)\n";

    #[tokio::test]
    async fn test_generate_sql_cleans_output() {
        let mock = MockLlmClient::new().with_replies(["\n```sql\nSELECT Name FROM Artist LIMIT 10;\n```\n"]);
        let recorder = mock.clone();
        let service = LlmService::new(Box::new(mock));

        let sql = service
            .generate_sql(SCHEMA, &[Turn::assistant("Hi")], "Name 10 artists")
            .await
            .unwrap();

        assert_eq!(sql, "SELECT Name FROM Artist LIMIT 10;");
        let prompts = recorder.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Conversation History: AI: Hi"));
        assert!(prompts[0].ends_with("Question: Name 10 artists\nSQL Query:"));
    }

    #[tokio::test]
    async fn test_generate_answer_trims() {
        let mock = MockLlmClient::new().with_replies(["  There are 275 artists.\n"]);
        let recorder = mock.clone();
        let service = LlmService::new(Box::new(mock));

        let answer = service
            .generate_answer(
                SCHEMA,
                &[],
                "SELECT COUNT(*) FROM Artist;",
                "How many artists?",
                "COUNT(*)\n275",
            )
            .await
            .unwrap();

        assert_eq!(answer, "There are 275 artists.");
        assert!(recorder.prompts()[0].contains("SQL Response: COUNT(*)\n275"));
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let service = LlmService::new(Box::new(MockLlmClient::new().with_failure("boom")));
        let err = service
            .generate_sql(SCHEMA, &[], "Name 10 artists")
            .await
            .unwrap_err();
        assert!(matches!(err, WhisperError::Llm(_)));
    }
}
