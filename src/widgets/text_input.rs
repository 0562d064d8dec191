use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use tui_textarea::{CursorMove, Input, Key, TextArea};

use crate::config::Theme;

/// Event emitted by TextInput widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputEvent {
    None,
    /// The value changed.
    Changed,
    Submit,
    Cancel,
}

/// Single-line text input wrapping tui-textarea
pub struct TextInput {
    textarea: TextArea<'static>,
    value: String,
    placeholder: String,
    text_color: Option<Color>,
    placeholder_color: Option<Color>,
    background_color: Option<Color>,
    focused: bool,
}

impl TextInput {
    pub fn new() -> Self {
        let mut widget = Self {
            textarea: TextArea::default(),
            value: String::new(),
            placeholder: String::new(),
            text_color: None,
            placeholder_color: None,
            background_color: None,
            focused: false,
        };
        widget.apply_style();
        widget
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self.apply_style();
        self
    }

    /// Take text and placeholder colors from the theme
    pub fn with_theme(mut self, theme: &Theme) -> Self {
        self.text_color = Some(theme.get("text_primary"));
        self.placeholder_color = Some(theme.get("dimmed"));
        self.background_color = theme.get_optional("controls_bg");
        self.apply_style();
        self
    }

    fn apply_style(&mut self) {
        let mut style = Style::default();
        if let Some(fg) = self.text_color {
            style = style.fg(fg);
        }
        if let Some(bg) = self.background_color {
            style = style.bg(bg);
        }
        self.textarea.set_style(style);
        self.textarea.set_cursor_line_style(Style::default());
        self.textarea.set_placeholder_text(self.placeholder.clone());
        if let Some(color) = self.placeholder_color {
            self.textarea.set_placeholder_style(Style::default().fg(color));
        }
        let cursor = if self.focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            // Same as the text style hides the cursor
            style
        };
        self.textarea.set_cursor_style(cursor);
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.apply_style();
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into().replace(['\n', '\r'], " ");
        self.textarea = TextArea::new(vec![self.value.clone()]);
        self.apply_style();
        self.textarea.move_cursor(CursorMove::End);
    }

    pub fn clear(&mut self) {
        self.set_value(String::new());
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> TextInputEvent {
        match event.code {
            KeyCode::Enter => return TextInputEvent::Submit,
            KeyCode::Esc => return TextInputEvent::Cancel,
            KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown | KeyCode::Tab => {
                return TextInputEvent::None
            }
            _ => {}
        }
        let input = key_event_to_input(event);
        if input.key == Key::Null {
            return TextInputEvent::None;
        }
        self.textarea.input(input);
        let value = self.textarea.lines().first().cloned().unwrap_or_default();
        if value == self.value {
            TextInputEvent::None
        } else {
            self.value = value;
            TextInputEvent::Changed
        }
    }
}

fn key_event_to_input(event: &KeyEvent) -> Input {
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => Key::Null,
    };
    Input {
        key,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
    }
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for &TextInput {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        self.textarea.render(area, buf);

        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let cell = &mut buf[(x, y)];
                let style = cell.style().remove_modifier(Modifier::UNDERLINED);
                cell.set_style(style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_changes_value() {
        let mut input = TextInput::new();
        assert!(input.is_empty());
        assert_eq!(input.handle_key(&key(KeyCode::Char('a'))), TextInputEvent::Changed);
        assert_eq!(input.handle_key(&key(KeyCode::Char('b'))), TextInputEvent::Changed);
        assert_eq!(input.value(), "ab");
        assert_eq!(input.handle_key(&key(KeyCode::Backspace)), TextInputEvent::Changed);
        assert_eq!(input.value(), "a");
        assert_eq!(input.handle_key(&key(KeyCode::Left)), TextInputEvent::None);
    }

    #[test]
    fn test_submit_and_cancel() {
        let mut input = TextInput::new();
        assert_eq!(input.handle_key(&key(KeyCode::Enter)), TextInputEvent::Submit);
        assert_eq!(input.handle_key(&key(KeyCode::Esc)), TextInputEvent::Cancel);
    }

    #[test]
    fn test_set_value_and_clear() {
        let mut input = TextInput::new();
        input.set_value("two\nlines");
        assert_eq!(input.value(), "two lines");
        input.handle_key(&key(KeyCode::Char('!')));
        assert_eq!(input.value(), "two lines!");
        input.clear();
        assert!(input.is_empty());
    }
}
