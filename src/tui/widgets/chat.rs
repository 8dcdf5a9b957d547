//! Chat panel widget for the TUI.
//!
//! Displays the conversation and connection notices.

use crate::tui::app::ChatMessage;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// Chat panel widget.
pub struct ChatPanel<'a> {
    messages: &'a [ChatMessage],
    scroll: usize,
    focused: bool,
}

impl<'a> ChatPanel<'a> {
    /// Creates a new chat panel widget.
    ///
    /// `scroll` counts lines up from the bottom.
    pub fn new(messages: &'a [ChatMessage], scroll: usize, focused: bool) -> Self {
        Self {
            messages,
            scroll,
            focused,
        }
    }
}

fn label_style(message: &ChatMessage) -> Style {
    let color = match message {
        ChatMessage::User(_) => Color::Cyan,
        ChatMessage::Assistant(_) => Color::Green,
        ChatMessage::Notice(_) => Color::Blue,
        ChatMessage::Warning(_) => Color::Yellow,
        ChatMessage::Error(_) => Color::Red,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Builds the display lines for all messages.
pub fn message_lines(messages: &[ChatMessage]) -> Vec<Line<'_>> {
    let mut lines = Vec::new();

    for message in messages {
        lines.push(Line::from(Span::styled(
            format!("{}:", message.type_label()),
            label_style(message),
        )));
        lines.extend(message.text().lines().map(Line::raw));
        lines.push(Line::from(""));
    }

    lines
}

/// Rows a line occupies when wrapped to `width` columns.
fn wrapped_height(line: &Line<'_>, width: usize) -> usize {
    line.width().div_ceil(width.max(1)).max(1)
}

impl Widget for ChatPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Chat ");

        let inner_width = area.width.saturating_sub(2) as usize;
        let inner_height = area.height.saturating_sub(2) as usize;

        let lines = message_lines(self.messages);
        let total: usize = lines.iter().map(|l| wrapped_height(l, inner_width)).sum();
        let max_top = total.saturating_sub(inner_height);
        let top = max_top.saturating_sub(self.scroll.min(max_top));

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((top.min(u16::MAX as usize) as u16, 0))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_lines() {
        let messages = vec![
            ChatMessage::User("Name 3 artists".to_string()),
            ChatMessage::Assistant("AC/DC\nAccept\nAerosmith".to_string()),
        ];

        let lines = message_lines(&messages);
        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();

        assert_eq!(
            text,
            vec!["You:", "Name 3 artists", "", "AI:", "AC/DC", "Accept", "Aerosmith", ""]
        );
    }

    #[test]
    fn test_wrapped_height() {
        assert_eq!(wrapped_height(&Line::raw(""), 10), 1);
        assert_eq!(wrapped_height(&Line::raw("0123456789"), 10), 1);
        assert_eq!(wrapped_height(&Line::raw("0123456789a"), 10), 2);
        assert_eq!(wrapped_height(&Line::raw("abc"), 0), 3);
    }

    #[test]
    fn test_render_shows_latest_messages() {
        let messages: Vec<ChatMessage> = (0..20)
            .map(|i| ChatMessage::Notice(format!("message {i}")))
            .collect();
        let area = Rect::new(0, 0, 30, 8);
        let mut buf = Buffer::empty(area);

        ChatPanel::new(&messages, 0, false).render(area, &mut buf);

        let screen: String = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(screen.contains("message 19"));
        assert!(!screen.contains("message 0 "));
    }
}
