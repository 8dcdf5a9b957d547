//! Mock LLM client for testing and offline runs.
//!
//! Replies are deterministic. Scripted replies are served first, then
//! pattern matches, then a built-in heuristic that reads the prompt.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Result, WhisperError};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses.
///
/// Clones share the reply queue and the request log.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// Replies returned in order before anything else is consulted.
    scripted: Arc<Mutex<VecDeque<Result<String>>>>,
    /// Every prompt received, in order.
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the question in the prompt contains `pattern`, the mock returns `response`.
    pub fn with_response(mut self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Queues replies returned by the next calls, in order.
    pub fn with_replies<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut queue) = self.scripted.lock() {
            queue.extend(replies.into_iter().map(|r| Ok(r.into())));
        }
        self
    }

    /// Queues a failure behind any replies already scripted.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        if let Ok(mut queue) = self.scripted.lock() {
            queue.push_back(Err(WhisperError::llm(message)));
        }
        self
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Number of completion requests received.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }

    /// Generates a mock response based on the prompt.
    fn mock_response(&self, prompt: &str) -> String {
        if let Some(question) = line_value(prompt, "User question: ") {
            let response = section_after(prompt, "SQL Response: ").unwrap_or_default();
            return answer_for(question, response);
        }

        let question = line_value(prompt, "Question: ").unwrap_or_default();
        let question_lower = question.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if question_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        sql_for(&question_lower, prompt)
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

/// Value of the last line starting with `prefix`.
fn line_value<'a>(prompt: &'a str, prefix: &str) -> Option<&'a str> {
    prompt
        .lines()
        .rev()
        .find_map(|line| line.trim_start().strip_prefix(prefix))
        .map(str::trim)
}

/// Everything after the last occurrence of `marker`.
fn section_after<'a>(prompt: &'a str, marker: &str) -> Option<&'a str> {
    prompt.rfind(marker).map(|at| &prompt[at + marker.len()..])
}

/// Table names listed in the schema section of a prompt.
fn schema_tables(prompt: &str) -> Vec<&str> {
    let schema = prompt
        .find("<SCHEMA>")
        .and_then(|start| {
            let rest = &prompt[start + "<SCHEMA>".len()..];
            rest.find("</SCHEMA>").map(|end| &rest[..end])
        })
        .unwrap_or_default();

    schema
        .lines()
        .filter_map(|line| line.strip_prefix("Table: "))
        .map(str::trim)
        .collect()
}

fn sql_for(question_lower: &str, prompt: &str) -> String {
    let table = schema_tables(prompt).into_iter().find(|table| {
        let name = table.to_lowercase();
        question_lower.contains(&name)
    });

    match table {
        Some(table) if question_lower.contains("how many") || question_lower.contains("count") => {
            format!("SELECT COUNT(*) AS total FROM {table};")
        }
        Some(table) => format!("SELECT * FROM {table} LIMIT 10;"),
        None => "I don't know which table answers that question.".to_string(),
    }
}

fn answer_for(question: &str, response: &str) -> String {
    let response = response.trim();
    if response.is_empty() {
        format!("I found nothing for \"{question}\".")
    } else {
        format!("Here is what I found for \"{question}\":\n{response}")
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let input = Self::extract_user_input(messages);

        self.prompts
            .lock()
            .map_err(|_| WhisperError::internal("mock prompt log poisoned"))?
            .push(input.clone());

        let scripted = self
            .scripted
            .lock()
            .map_err(|_| WhisperError::internal("mock reply queue poisoned"))?
            .pop_front();

        match scripted {
            Some(reply) => reply,
            None => Ok(self.mock_response(&input)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::prompt::{build_answer_prompt, build_sql_prompt};
    use crate::session::Turn;

    const SCHEMA: &str = "Database Schema (MySQL):\n\nTable: Artist\n  - ArtistId: int\n\nTable: Album\n  - AlbumId: int\n";

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let client = MockLlmClient::new().with_replies(["SELECT 1;", "One."]);

        let first = client.complete(&[Message::user("a")]).await.unwrap();
        let second = client.complete(&[Message::user("b")]).await.unwrap();

        assert_eq!(first, "SELECT 1;");
        assert_eq!(second, "One.");
        assert_eq!(client.prompts(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_failure_is_returned() {
        let client = MockLlmClient::new().with_failure("quota exceeded");
        let err = client.complete(&[Message::user("a")]).await.unwrap_err();
        assert!(matches!(err, WhisperError::Llm(_)));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_follows_scripted_replies() {
        let client = MockLlmClient::new()
            .with_replies(["SELECT 1;"])
            .with_failure("quota exceeded");

        assert_eq!(client.complete(&[Message::user("a")]).await.unwrap(), "SELECT 1;");
        assert!(client.complete(&[Message::user("b")]).await.is_err());
    }

    #[tokio::test]
    async fn test_sql_from_schema_tables() {
        let client = MockLlmClient::new();
        let prompt = build_sql_prompt(SCHEMA, &[], "Show me some albums");

        let reply = client.complete(&[Message::user(prompt)]).await.unwrap();
        assert_eq!(reply, "SELECT * FROM Album LIMIT 10;");

        let prompt = build_sql_prompt(SCHEMA, &[], "How many artists are there?");
        let reply = client.complete(&[Message::user(prompt)]).await.unwrap();
        assert_eq!(reply, "SELECT COUNT(*) AS total FROM Artist;");
    }

    #[tokio::test]
    async fn test_unknown_question_is_not_sql() {
        let client = MockLlmClient::new();
        let prompt = build_sql_prompt(SCHEMA, &[], "What is the weather?");
        let reply = client.complete(&[Message::user(prompt)]).await.unwrap();
        assert!(!reply.starts_with("SELECT"));
    }

    #[tokio::test]
    async fn test_custom_response_matches_question_only() {
        let client = MockLlmClient::new().with_response("top tracks", "SELECT Name FROM Track LIMIT 3;");
        let history = vec![Turn::human("top tracks please")];

        let prompt = build_sql_prompt(SCHEMA, &history, "Show me some albums");
        let reply = client.complete(&[Message::user(prompt)]).await.unwrap();
        assert_eq!(reply, "SELECT * FROM Album LIMIT 10;");
    }

    #[tokio::test]
    async fn test_answer_echoes_response() {
        let client = MockLlmClient::new();
        let prompt = build_answer_prompt(
            SCHEMA,
            &[],
            "SELECT COUNT(*) AS total FROM Artist;",
            "How many artists are there?",
            "total\n275",
        );

        let reply = client.complete(&[Message::user(prompt)]).await.unwrap();
        assert_eq!(
            reply,
            "Here is what I found for \"How many artists are there?\":\ntotal\n275"
        );
    }
}
