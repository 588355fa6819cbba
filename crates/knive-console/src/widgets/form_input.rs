//! FormInput — wraps tui-input for single-line form fields.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{style_input, style_muted};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldAction {
    Edited,
    Submitted(String),
    Cancelled,
}

pub struct FormInput {
    input: Input,
    placeholder: String,
}

impl FormInput {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            placeholder: placeholder.into(),
        }
    }

    pub fn with_value(placeholder: impl Into<String>, value: &str) -> Self {
        Self {
            input: Input::new(value.to_string()),
            placeholder: placeholder.into(),
        }
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    /// Enter submits the trimmed value, Esc cancels, everything else edits.
    pub fn handle_key(&mut self, key: KeyEvent) -> FieldAction {
        match key.code {
            KeyCode::Esc => FieldAction::Cancelled,
            KeyCode::Enter => FieldAction::Submitted(self.input.value().trim().to_string()),
            _ => {
                self.input.handle_event(&Event::Key(key));
                FieldAction::Edited
            }
        }
    }

    /// Render the field into a one-row `area`, with the cursor when focused.
    pub fn draw(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let scroll = self
            .input
            .visual_scroll(area.width.saturating_sub(3) as usize);
        let value = self.input.value();
        let display = if value.is_empty() {
            Span::styled(format!("› {}", self.placeholder), style_muted())
        } else {
            let visible: String = value.chars().skip(scroll).collect();
            Span::styled(format!("› {}", visible), style_input())
        };

        let paragraph = Paragraph::new(Line::from(vec![display])).style(style_input());
        frame.render_widget(paragraph, area);

        if focused && area.width > 0 {
            let cursor_x = area.x + 2 + (self.input.visual_cursor().saturating_sub(scroll)) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_then_enter_submits_trimmed_text() {
        let mut field = FormInput::new("show name");
        for c in " Late Night ".chars() {
            assert_eq!(field.handle_key(key(KeyCode::Char(c))), FieldAction::Edited);
        }
        assert_eq!(
            field.handle_key(key(KeyCode::Enter)),
            FieldAction::Submitted("Late Night".to_string())
        );
        assert_eq!(field.handle_key(key(KeyCode::Esc)), FieldAction::Cancelled);
    }

    #[test]
    fn test_with_value_prefills() {
        let mut field = FormInput::with_value("value", "10");
        field.handle_key(key(KeyCode::Backspace));
        assert_eq!(field.text(), "1");
    }
}
