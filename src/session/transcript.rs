//! Conversation transcript for a session.
//!
//! An ordered, append-only list of turns. Both prompts see the whole list;
//! nothing is ever evicted.

use std::fmt;

use serde::Serialize;

/// First turn of every session.
pub const GREETING: &str = "Hello! I'm a SQL assistant. Ask me anything about your database.";

/// A single utterance in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "speaker", content = "text", rename_all = "lowercase")]
pub enum Turn {
    /// Something the user typed.
    Human(String),
    /// A reply shown to the user.
    Assistant(String),
}

impl Turn {
    /// Creates a human turn.
    pub fn human(text: impl Into<String>) -> Self {
        Self::Human(text.into())
    }

    /// Creates an assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant(text.into())
    }

    /// The text of the turn.
    pub fn text(&self) -> &str {
        match self {
            Self::Human(text) | Self::Assistant(text) => text,
        }
    }

    /// Label used when the turn is rendered into a prompt.
    pub fn speaker(&self) -> &'static str {
        match self {
            Self::Human(_) => "Human",
            Self::Assistant(_) => "AI",
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker(), self.text())
    }
}

/// Ordered record of the session's turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// Creates a transcript holding only the greeting.
    pub fn new() -> Self {
        Self {
            turns: vec![Turn::assistant(GREETING)],
        }
    }

    /// Creates a transcript with no turns at all.
    pub fn empty() -> Self {
        Self { turns: Vec::new() }
    }

    /// Appends a turn at the end.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns in insertion order.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if there are no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent turn.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

/// Renders turns one per line for the "Conversation History" prompt slot.
pub fn render_history(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(Turn::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
