//! Help overlay widget for the TUI.
//!
//! How to use the app, example questions, tips and keyboard shortcuts.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

/// Example questions for the Chinook sample database.
pub const EXAMPLE_QUESTIONS: [&str; 3] = [
    "Name 10 artists",
    "Which 3 artists have the most tracks?",
    "How many albums does AC/DC have?",
];

/// Help overlay widget.
#[derive(Default)]
pub struct HelpOverlay;

impl HelpOverlay {
    /// Creates a new help overlay widget.
    pub fn new() -> Self {
        Self
    }

    /// Calculates the centered area for the help overlay.
    pub fn area(parent: Rect) -> Rect {
        let width = 64.min(parent.width.saturating_sub(4));
        let height = 28.min(parent.height.saturating_sub(2));
        let x = parent.x + (parent.width.saturating_sub(width)) / 2;
        let y = parent.y + (parent.height.saturating_sub(height)) / 2;
        Rect::new(x, y, width, height)
    }

    /// Returns the help content as lines.
    fn content() -> Vec<Line<'static>> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let text_style = Style::default().fg(Color::White);
        let section_style = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);

        let mut lines = vec![
            Line::from(Span::styled("How to use", section_style)),
            Line::styled("  1. Press Tab to reach the Connection panel.", text_style),
            Line::styled(
                "  2. Fill in host, port, user, password and database, then press Enter.",
                text_style,
            ),
            Line::styled(
                "  3. Type a question about your data and press Enter.",
                text_style,
            ),
            Line::from(""),
            Line::from(Span::styled("Examples", section_style)),
        ];
        lines.extend(
            EXAMPLE_QUESTIONS
                .iter()
                .map(|q| Line::styled(format!("  {q}"), text_style)),
        );
        lines.extend([
            Line::from(""),
            Line::from(Span::styled("Tips", section_style)),
            Line::styled(
                "  Follow-up questions can refer to earlier answers.",
                text_style,
            ),
            Line::styled(
                "  Statements are run as generated; data-changing requests will change data.",
                text_style,
            ),
            Line::from(""),
            Line::from(Span::styled("Keys", section_style)),
            Self::shortcut_line("Tab", "Cycle focus", key_style, text_style),
            Self::shortcut_line("Enter", "Ask / connect", key_style, text_style),
            Self::shortcut_line("Up/Down", "Scroll chat / move in form", key_style, text_style),
            Self::shortcut_line("Ctrl+U", "Clear field", key_style, text_style),
            Self::shortcut_line("F1", "Toggle this help", key_style, text_style),
            Self::shortcut_line("Ctrl+C/Q", "Quit", key_style, text_style),
        ]);
        lines
    }

    /// Creates a line with a keyboard shortcut and description.
    fn shortcut_line(
        key: &'static str,
        desc: &'static str,
        key_style: Style,
        desc_style: Style,
    ) -> Line<'static> {
        Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{key:12}"), key_style),
            Span::styled(desc, desc_style),
        ])
    }
}

impl Widget for HelpOverlay {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Help & Documentation (F1 to close) ")
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            );

        Paragraph::new(Self::content())
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
