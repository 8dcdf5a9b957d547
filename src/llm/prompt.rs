//! Prompt construction for the two LLM stages.
//!
//! Each stage sends one user message built from a fixed template. Values are
//! substituted in a single pass so text coming from the database or the user
//! can never be mistaken for a placeholder.

use crate::llm::types::Message;
use crate::session::{render_history, Turn};

/// Template for the SQL generation stage.
pub const SQL_PROMPT_TEMPLATE: &str = r#"You are a data analyst at a company. You are interacting with a user who is asking you questions about the company's database.
Based on the table schema below, write a SQL query that would answer the user's question. Take the conversation history into account.

<SCHEMA>{schema}</SCHEMA>

Conversation History: {chat_history}

Write only the SQL query and nothing else. Do not wrap the SQL query in any other text, not even backticks.

For example:
Question: which 3 artists have the most tracks?
SQL Query: SELECT ArtistId, COUNT(*) as track_count FROM Track GROUP BY ArtistId ORDER BY track_count DESC LIMIT 3;
Question: Name 10 artists
SQL Query: SELECT Name FROM Artist LIMIT 10;

Your turn:

Question: {question}
SQL Query:"#;

/// Template for the answer generation stage.
pub const ANSWER_PROMPT_TEMPLATE: &str = r#"You are a data analyst at a company. You are interacting with a user who is asking you questions about the company's database.
Based on the table schema below, question, sql query, and sql response, write a natural language response and nothing else.
<SCHEMA>{schema}</SCHEMA>

Conversation History: {chat_history}
SQL Query: <SQL>{query}</SQL>
User question: {question}
SQL Response: {response}"#;

/// Builds the SQL generation prompt.
pub fn build_sql_prompt(schema: &str, history: &[Turn], question: &str) -> String {
    let history = render_history(history);
    fill_template(
        SQL_PROMPT_TEMPLATE,
        &[
            ("schema", schema),
            ("chat_history", &history),
            ("question", question),
        ],
    )
}

/// Builds the answer generation prompt.
pub fn build_answer_prompt(
    schema: &str,
    history: &[Turn],
    query: &str,
    question: &str,
    response: &str,
) -> String {
    let history = render_history(history);
    fill_template(
        ANSWER_PROMPT_TEMPLATE,
        &[
            ("schema", schema),
            ("chat_history", &history),
            ("query", query),
            ("question", question),
            ("response", response),
        ],
    )
}

/// Wraps a prompt as the single message of a request.
pub fn build_messages(prompt: String) -> Vec<Message> {
    vec![Message::user(prompt)]
}

/// Replaces `{name}` placeholders with their values.
///
/// Unknown placeholders and stray braces are copied through unchanged.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let substituted = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
