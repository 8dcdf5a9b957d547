//! Application state for the TUI.
//!
//! Key handling only updates state and reports an [`Action`]; the event loop
//! in `tui::mod` performs the action against the orchestrator.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::Event;
use crate::config::{ConnectionConfig, DEFAULT_PORT};
use crate::connection::ConnectStatus;
use crate::session::GREETING;

/// Status text shown while a connection attempt is running.
pub const CONNECTING_MESSAGE: &str = "Connecting to the database...";

/// Status text shown while the pipeline is running.
pub const THINKING_MESSAGE: &str = "Thinking...";

/// Which panel currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Chat,
    Settings,
}

impl Focus {
    /// Cycles to the next focus panel.
    pub fn next(self) -> Self {
        match self {
            Self::Input => Self::Chat,
            Self::Chat => Self::Settings,
            Self::Settings => Self::Input,
        }
    }
}

/// Work the event loop must perform after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send a question through the pipeline.
    Ask(String),
    /// Connect with the settings from the form.
    Connect(ConnectionConfig),
}

/// A message in the chat panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    /// A question from the user.
    User(String),
    /// A reply from the assistant.
    Assistant(String),
    /// A connection status or other informational notice.
    Notice(String),
    /// A warning, e.g. asking before connecting.
    Warning(String),
    /// An error from the pipeline.
    Error(String),
}

impl ChatMessage {
    /// Returns the message type as a string for display purposes.
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::User(_) => "You",
            Self::Assistant(_) => "AI",
            Self::Notice(_) => "Info",
            Self::Warning(_) => "Warning",
            Self::Error(_) => "Error",
        }
    }

    /// The message text.
    pub fn text(&self) -> &str {
        match self {
            Self::User(text)
            | Self::Assistant(text)
            | Self::Notice(text)
            | Self::Warning(text)
            | Self::Error(text) => text,
        }
    }
}

/// Input state for text editing.
///
/// `cursor` counts characters, not bytes.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    /// Current input text.
    pub text: String,
    /// Cursor position (character index).
    pub cursor: usize,
}

impl InputState {
    /// Creates a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an input holding `text` with the cursor at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    fn byte_index(&self, cursor: usize) -> usize {
        self.text
            .char_indices()
            .nth(cursor)
            .map_or(self.text.len(), |(i, _)| i)
    }

    /// Number of characters in the input.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Inserts a character at the cursor position.
    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Deletes the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    /// Deletes the character at the cursor (delete key).
    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    /// Moves the cursor left.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Moves the cursor right.
    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    /// Moves the cursor to the start of the input.
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Moves the cursor to the end of the input.
    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    /// Clears the input and returns the previous text.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// Returns true if the input is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Applies an editing key. Returns false for keys it does not handle.
    fn edit(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.take();
            }
            KeyCode::Char(c) => self.insert(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.move_home(),
            KeyCode::End => self.move_end(),
            _ => return false,
        }
        true
    }
}

/// A field of the connection settings form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Host,
    Port,
    User,
    Password,
    Database,
    Connect,
}

impl SettingsField {
    /// All rows of the form, top to bottom.
    pub const ALL: [Self; 6] = [
        Self::Host,
        Self::Port,
        Self::User,
        Self::Password,
        Self::Database,
        Self::Connect,
    ];

    /// Row label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Host => "Host",
            Self::Port => "Port",
            Self::User => "User",
            Self::Password => "Password",
            Self::Database => "Database",
            Self::Connect => "Connect",
        }
    }
}

/// Connection settings form state.
#[derive(Debug, Clone)]
pub struct SettingsForm {
    pub host: InputState,
    pub port: InputState,
    pub user: InputState,
    pub password: InputState,
    pub database: InputState,
    /// Index into [`SettingsField::ALL`].
    pub selected: usize,
}

impl SettingsForm {
    /// Creates a form pre-filled from `config`.
    pub fn from_config(config: &ConnectionConfig) -> Self {
        let text = |value: &Option<String>| InputState::with_text(value.clone().unwrap_or_default());
        Self {
            host: text(&config.host),
            port: InputState::with_text(config.port().to_string()),
            user: text(&config.user),
            password: text(&config.password),
            database: text(&config.database),
            selected: 0,
        }
    }

    /// The currently selected row.
    pub fn selected_field(&self) -> SettingsField {
        SettingsField::ALL[self.selected.min(SettingsField::ALL.len() - 1)]
    }

    /// The editable value of a row, if it has one.
    pub fn field(&self, field: SettingsField) -> Option<&InputState> {
        match field {
            SettingsField::Host => Some(&self.host),
            SettingsField::Port => Some(&self.port),
            SettingsField::User => Some(&self.user),
            SettingsField::Password => Some(&self.password),
            SettingsField::Database => Some(&self.database),
            SettingsField::Connect => None,
        }
    }

    fn field_mut(&mut self, field: SettingsField) -> Option<&mut InputState> {
        match field {
            SettingsField::Host => Some(&mut self.host),
            SettingsField::Port => Some(&mut self.port),
            SettingsField::User => Some(&mut self.user),
            SettingsField::Password => Some(&mut self.password),
            SettingsField::Database => Some(&mut self.database),
            SettingsField::Connect => None,
        }
    }

    /// Moves the selection up one row, wrapping.
    pub fn select_previous(&mut self) {
        let len = SettingsField::ALL.len();
        self.selected = (self.selected + len - 1) % len;
    }

    /// Moves the selection down one row, wrapping.
    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % SettingsField::ALL.len();
    }

    /// Builds connection settings from the form.
    ///
    /// Empty fields become unset. A blank port means the default port.
    pub fn to_config(&self) -> Result<ConnectionConfig, String> {
        let value = |input: &InputState| {
            let trimmed = input.text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        let port = match value(&self.port) {
            None => DEFAULT_PORT,
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| format!("Invalid port: '{port}'"))?,
        };

        Ok(ConnectionConfig {
            host: value(&self.host),
            port: Some(port),
            user: value(&self.user),
            // Passwords may legitimately contain leading or trailing spaces.
            password: (!self.password.is_empty()).then(|| self.password.text.clone()),
            database: value(&self.database),
        })
    }

    /// Handles a key while the form has focus.
    fn handle_key(&mut self, key: KeyEvent) -> Option<Result<ConnectionConfig, String>> {
        match key.code {
            KeyCode::Up => self.select_previous(),
            KeyCode::Down => self.select_next(),
            KeyCode::Enter => return Some(self.to_config()),
            _ => {
                let field = self.selected_field();
                if let Some(input) = self.field_mut(field) {
                    input.edit(key);
                }
            }
        }
        None
    }
}

/// Main application state.
pub struct App {
    /// Whether the application is still running.
    pub running: bool,
    /// Current focus panel.
    pub focus: Focus,
    /// Question input state.
    pub input: InputState,
    /// Chat messages.
    pub messages: Vec<ChatMessage>,
    /// Chat scroll offset (lines from bottom).
    pub chat_scroll: usize,
    /// Connection settings form.
    pub settings: SettingsForm,
    /// Transient status shown in the header, e.g. while connecting.
    pub status: Option<&'static str>,
    /// Whether the help overlay is visible.
    pub show_help: bool,
    /// Database connection info for display.
    pub connection_info: Option<String>,
}

impl App {
    /// Creates a new App instance with the form pre-filled from `defaults`.
    pub fn new(defaults: &ConnectionConfig) -> Self {
        Self {
            running: true,
            focus: Focus::default(),
            input: InputState::new(),
            messages: vec![ChatMessage::Assistant(GREETING.to_string())],
            chat_scroll: 0,
            settings: SettingsForm::from_config(defaults),
            status: None,
            show_help: false,
            connection_info: None,
        }
    }

    /// Adds a message to the chat.
    pub fn add_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
        // Auto-scroll to bottom when new message is added
        self.chat_scroll = 0;
    }

    /// Returns true if a request is in flight.
    pub fn is_busy(&self) -> bool {
        self.status.is_some()
    }

    /// Records the outcome of a connection attempt.
    ///
    /// A failed attempt leaves the previous connection info in place, since
    /// the previous connection stays active.
    pub fn connection_result(&mut self, status: &ConnectStatus, config: &ConnectionConfig) {
        self.status = None;
        if status.is_connected() {
            self.connection_info = Some(config.display_string());
            self.add_message(ChatMessage::Notice(status.user_message()));
        } else {
            self.add_message(ChatMessage::Error(status.user_message()));
        }
    }

    /// Handles an event and returns the action it requests, if any.
    pub fn handle_event(&mut self, event: Event) -> Option<Action> {
        match event {
            Event::Key(key) => self.handle_key(key),
            // Terminal resize is handled automatically by ratatui
            Event::Resize(_, _) | Event::Tick => None,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.running = false;
                return None;
            }
            KeyCode::F(1) => {
                self.show_help = !self.show_help;
                return None;
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return None;
            }
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return None;
            }
            _ => {}
        }

        // One request at a time; keys other than the above are ignored meanwhile.
        if self.is_busy() {
            return None;
        }

        match self.focus {
            Focus::Input => self.handle_input_key(key),
            Focus::Chat => {
                self.handle_chat_key(key);
                None
            }
            Focus::Settings => match self.settings.handle_key(key)? {
                Ok(config) => {
                    self.status = Some(CONNECTING_MESSAGE);
                    Some(Action::Connect(config))
                }
                Err(message) => {
                    self.add_message(ChatMessage::Error(message));
                    None
                }
            },
        }
    }

    /// Handles key events when input is focused.
    fn handle_input_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.code == KeyCode::Enter {
            return self.submit_input();
        }
        self.input.edit(key);
        None
    }

    fn handle_chat_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.chat_scroll = self.chat_scroll.saturating_add(1),
            KeyCode::Down => self.chat_scroll = self.chat_scroll.saturating_sub(1),
            KeyCode::PageUp => self.chat_scroll = self.chat_scroll.saturating_add(10),
            KeyCode::PageDown => self.chat_scroll = self.chat_scroll.saturating_sub(10),
            // Clamped during render
            KeyCode::Home => self.chat_scroll = usize::MAX,
            KeyCode::End => self.chat_scroll = 0,
            _ => {}
        }
    }

    /// Submits the current input for processing.
    ///
    /// Blank input is cleared without producing an action.
    pub fn submit_input(&mut self) -> Option<Action> {
        let text = self.input.take();
        let question = text.trim();
        if question.is_empty() {
            return None;
        }

        self.add_message(ChatMessage::User(question.to_string()));
        self.status = Some(THINKING_MESSAGE);
        Some(Action::Ask(question.to_string()))
    }
}
