use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Widget},
};

use super::text_input::TextInput;

/// Search box plus the optional date range inputs.
pub struct FilterBar<'a> {
    search: &'a TextInput,
    /// `(label, from, to)` when a date key is configured.
    dates: Option<(&'a str, &'a TextInput, &'a TextInput)>,
    pub border: Color,
    pub border_active: Color,
}

impl<'a> FilterBar<'a> {
    pub fn new(search: &'a TextInput) -> Self {
        Self {
            search,
            dates: None,
            border: Color::DarkGray,
            border_active: Color::Cyan,
        }
    }

    pub fn with_dates(mut self, label: &'a str, from: &'a TextInput, to: &'a TextInput) -> Self {
        self.dates = Some((label, from, to));
        self
    }

    pub fn with_colors(mut self, border: Color, border_active: Color) -> Self {
        self.border = border;
        self.border_active = border_active;
        self
    }

    fn boxed(&self, title: &str, input: &TextInput, area: Rect, buf: &mut Buffer) {
        let color = if input.is_focused() {
            self.border_active
        } else {
            self.border
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(title.to_string());
        let inner = block.inner(area);
        block.render(area, buf);
        input.render(inner, buf);
    }
}

impl Widget for FilterBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some((label, from, to)) = self.dates else {
            self.boxed("Search", self.search, area, buf);
            return;
        };
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(label.chars().count() as u16 + 1),
                Constraint::Length(16),
                Constraint::Length(16),
            ])
            .split(area);
        self.boxed("Search", self.search, layout[0], buf);
        let label_area = Rect {
            y: layout[1].y.saturating_add(1),
            height: 1,
            ..layout[1]
        };
        Paragraph::new(label.to_string())
            .style(Style::default().fg(self.border))
            .right_aligned()
            .render(label_area, buf);
        self.boxed("From", from, layout[2], buf);
        self.boxed("To", to, layout[3], buf);
    }
}
