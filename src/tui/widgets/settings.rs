//! Connection settings panel.

use crate::tui::app::{SettingsField, SettingsForm};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Connection settings form widget.
pub struct SettingsPanel<'a> {
    form: &'a SettingsForm,
    focused: bool,
}

impl<'a> SettingsPanel<'a> {
    /// Creates a new settings panel widget.
    pub fn new(form: &'a SettingsForm, focused: bool) -> Self {
        Self { form, focused }
    }

    fn field_line(&self, field: SettingsField, selected: bool) -> Line<'a> {
        let marker = if selected && self.focused { "›" } else { " " };
        let label_style = if selected && self.focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };

        match self.form.field(field) {
            Some(input) => {
                let value = if field == SettingsField::Password {
                    "*".repeat(input.char_count())
                } else {
                    input.text.clone()
                };
                Line::from(vec![
                    Span::styled(format!("{marker} {:<9}", field.label()), label_style),
                    Span::raw(value),
                ])
            }
            None => Line::from(Span::styled(
                format!("{marker} [ {} ]", field.label()),
                label_style.add_modifier(Modifier::BOLD),
            )),
        }
    }

    /// Text lines of the panel, one per row.
    pub fn lines(&self) -> Vec<Line<'a>> {
        SettingsField::ALL
            .iter()
            .enumerate()
            .map(|(i, field)| self.field_line(*field, i == self.form.selected))
            .collect()
    }
}

impl Widget for SettingsPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Connection ");

        Paragraph::new(self.lines()).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;

    #[test]
    fn test_password_is_masked() {
        let form = SettingsForm::from_config(&ConnectionConfig {
            password: Some("s3cret".to_string()),
            ..ConnectionConfig::form_defaults()
        });
        let lines: Vec<String> = SettingsPanel::new(&form, true)
            .lines()
            .iter()
            .map(|l| l.to_string())
            .collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "› Host     localhost");
        assert_eq!(lines[1], "  Port     3306");
        assert_eq!(lines[3], "  Password ******");
        assert!(!lines.concat().contains("s3cret"));
        assert_eq!(lines[5], "  [ Connect ]");
    }
}
