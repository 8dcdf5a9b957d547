//! Terminal User Interface for DataWhisperer.
//!
//! Provides the main TUI application loop using ratatui and crossterm.
//! Requests are awaited inline, so the screen shows a status line while a
//! question or a connection attempt is in flight and input is ignored.

pub mod app;
mod events;
pub mod headless;
mod ui;
pub mod widgets;

pub use app::{Action, App, ChatMessage};
pub use events::{Event, EventHandler};

use crate::app::{InputResult, Orchestrator, NOT_CONNECTED_MESSAGE};
use crate::config::ConnectionConfig;
use crate::error::{Result, WhisperError};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use tracing::{error, warn};

/// The main TUI application runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_handler: EventHandler,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new() -> Result<Self> {
        let terminal = Self::setup_terminal()?;

        Ok(Self {
            terminal,
            event_handler: EventHandler::new(),
        })
    }

    /// Sets up the terminal for TUI rendering.
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()
            .map_err(|e| WhisperError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|e| {
            WhisperError::internal(format!("Failed to enter alternate screen: {e}"))
        })?;

        Terminal::new(CrosstermBackend::new(stdout))
            .map_err(|e| WhisperError::internal(format!("Failed to create terminal: {e}")))
    }

    /// Restores the terminal to its original state.
    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()
            .map_err(|e| WhisperError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(self.terminal.backend_mut(), LeaveAlternateScreen).map_err(|e| {
            WhisperError::internal(format!("Failed to leave alternate screen: {e}"))
        })?;

        self.terminal
            .show_cursor()
            .map_err(|e| WhisperError::internal(format!("Failed to show cursor: {e}")))
    }

    /// Runs the main TUI event loop.
    ///
    /// The settings form is pre-filled from `defaults`. When `auto_connect` is
    /// set, a connection attempt with those settings is made before the first
    /// key press.
    pub async fn run(
        &mut self,
        mut orchestrator: Orchestrator,
        defaults: &ConnectionConfig,
        auto_connect: bool,
    ) -> Result<()> {
        // Restore the terminal before the panic message is printed
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(panic_info);
        }));

        let mut app_state = App::new(defaults);

        if auto_connect {
            app_state.status = Some(app::CONNECTING_MESSAGE);
            self.perform(Action::Connect(defaults.clone()), &mut app_state, &mut orchestrator)
                .await?;
        }

        let result = self.run_event_loop(&mut app_state, &mut orchestrator).await;

        if let Err(e) = orchestrator.close().await {
            warn!("Error closing database connection: {}", e);
        }

        let _ = panic::take_hook();

        result
    }

    async fn run_event_loop(
        &mut self,
        app_state: &mut App,
        orchestrator: &mut Orchestrator,
    ) -> Result<()> {
        while app_state.running {
            self.draw(app_state)?;

            let handler = self.event_handler;
            let event = tokio::task::spawn_blocking(move || handler.next())
                .await
                .map_err(|e| WhisperError::internal(format!("Event task failed: {e}")))??;

            if let Some(action) = app_state.handle_event(event) {
                self.perform(action, app_state, orchestrator).await?;
            }
        }

        Ok(())
    }

    /// Runs an action to completion, showing the status line meanwhile.
    async fn perform(
        &mut self,
        action: Action,
        app_state: &mut App,
        orchestrator: &mut Orchestrator,
    ) -> Result<()> {
        self.draw(app_state)?;

        match action {
            Action::Connect(config) => {
                let status = orchestrator.connect(&config).await;
                app_state.connection_result(&status, &config);
            }
            Action::Ask(question) => {
                let result = orchestrator.handle_input(&question).await;
                app_state.status = None;
                apply_input_result(app_state, result);
            }
        }

        Ok(())
    }

    fn draw(&mut self, app_state: &App) -> Result<()> {
        self.terminal
            .draw(|frame| ui::render(frame, app_state))
            .map(|_| ())
            .map_err(|e| WhisperError::internal(format!("Failed to draw: {e}")))
    }
}

/// Adds the chat message for an orchestrator result.
pub fn apply_input_result(app_state: &mut App, result: Result<InputResult>) {
    match result {
        Ok(InputResult::None) => {}
        Ok(InputResult::NotConnected) => {
            app_state.add_message(ChatMessage::Warning(NOT_CONNECTED_MESSAGE.to_string()));
        }
        Ok(InputResult::Reply(outcome)) => {
            app_state.add_message(ChatMessage::Assistant(outcome.reply().to_string()));
        }
        Err(e) => {
            error!("Error processing input: {}", e);
            app_state.add_message(ChatMessage::Error(e.to_string()));
        }
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

/// Runs the TUI application.
pub async fn run(
    orchestrator: Orchestrator,
    defaults: &ConnectionConfig,
    auto_connect: bool,
) -> Result<()> {
    let mut tui = Tui::new()?;
    tui.run(orchestrator, defaults, auto_connect).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineOutcome;
    use crate::safety::REFUSAL_MESSAGE;

    fn new_app() -> App {
        App::new(&ConnectionConfig::form_defaults())
    }

    #[test]
    fn test_apply_reply() {
        let mut app = new_app();
        apply_input_result(
            &mut app,
            Ok(InputResult::Reply(PipelineOutcome::Refused {
                generated: "I don't know".to_string(),
            })),
        );
        assert_eq!(
            app.messages.last(),
            Some(&ChatMessage::Assistant(REFUSAL_MESSAGE.to_string()))
        );
    }

    #[test]
    fn test_apply_not_connected() {
        let mut app = new_app();
        apply_input_result(&mut app, Ok(InputResult::NotConnected));
        assert_eq!(
            app.messages.last(),
            Some(&ChatMessage::Warning(NOT_CONNECTED_MESSAGE.to_string()))
        );
    }

    #[test]
    fn test_apply_error() {
        let mut app = new_app();
        apply_input_result(&mut app, Err(WhisperError::query("Unknown column 'Nmae'")));
        assert_eq!(
            app.messages.last(),
            Some(&ChatMessage::Error("Query error: Unknown column 'Nmae'".to_string()))
        );
    }

    #[test]
    fn test_apply_none_adds_nothing() {
        let mut app = new_app();
        apply_input_result(&mut app, Ok(InputResult::None));
        assert_eq!(app.messages.len(), 1);
    }
}
