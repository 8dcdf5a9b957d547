//! UI rendering for the TUI.
//!
//! Defines the layout and renders all UI components.

use super::app::{App, Focus};
use super::widgets::{chat, header, help, input, settings};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

/// Width of the connection settings panel.
const SETTINGS_WIDTH: u16 = 34;

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Main layout: header, content, input
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(area);

    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SETTINGS_WIDTH), Constraint::Min(20)])
        .split(main_layout[1]);

    frame.render_widget(
        header::Header::new(app.connection_info.as_deref(), app.status),
        main_layout[0],
    );
    frame.render_widget(
        settings::SettingsPanel::new(&app.settings, app.focus == Focus::Settings),
        content_layout[0],
    );
    frame.render_widget(
        chat::ChatPanel::new(&app.messages, app.chat_scroll, app.focus == Focus::Chat),
        content_layout[1],
    );
    render_input(frame, main_layout[2], app);

    if app.show_help {
        frame.render_widget(help::HelpOverlay::new(), help::HelpOverlay::area(area));
    }
}

/// Renders the input bar.
fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Input;
    let widget = input::InputBar::new(&app.input.text, app.input.cursor, focused);
    frame.render_widget(widget, area);

    if focused && !app.show_help {
        let cursor_x = input::InputBar::cursor_x(area, app.input.cursor);
        frame.set_cursor_position((cursor_x, area.y + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use crate::tui::app::ChatMessage;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_initial_screen() {
        let app = App::new(&ConnectionConfig::form_defaults());
        let screen = screen(&app);

        assert!(screen.contains("Connection"));
        assert!(screen.contains("localhost"));
        assert!(screen.contains("[ Connect ]"));
        assert!(screen.contains("Hello! I'm a SQL assistant."));
        assert!(screen.contains("[db: not connected]"));
    }

    #[test]
    fn test_help_overlay() {
        let mut app = App::new(&ConnectionConfig::form_defaults());
        app.show_help = true;
        app.add_message(ChatMessage::Notice("Connected to Database".to_string()));

        assert!(screen(&app).contains("Help & Documentation"));
    }
}
