//! Per-session state: the transcript and the connection manager.

mod transcript;

pub use transcript::{render_history, Transcript, Turn, GREETING};

use crate::connection::ConnectionManager;

/// State owned by one conversation.
pub struct Session {
    transcript: Transcript,
    connections: ConnectionManager,
}

impl Session {
    /// Starts a session with the greeting turn and the given connection manager.
    pub fn new(connections: ConnectionManager) -> Self {
        Self {
            transcript: Transcript::new(),
            connections,
        }
    }

    /// The conversation so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The connection manager.
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Mutable access to the connection manager.
    pub fn connections_mut(&mut self) -> &mut ConnectionManager {
        &mut self.connections
    }

    /// Records a completed question and its reply.
    pub fn record_exchange(&mut self, question: &str, reply: &str) {
        self.transcript.append(Turn::human(question));
        self.transcript.append(Turn::assistant(reply));
    }
}
