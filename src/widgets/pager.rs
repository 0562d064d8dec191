use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::engine::TableView;

/// "Showing X to Y of Z" on the left, page buttons on the right.
pub struct Pager<'v, 'a, R> {
    view: &'v TableView<'a, R>,
    pub active: Color,
    pub dimmed: Color,
}

impl<'v, 'a, R> Pager<'v, 'a, R> {
    pub fn new(view: &'v TableView<'a, R>) -> Self {
        Self {
            view,
            active: Color::Cyan,
            dimmed: Color::DarkGray,
        }
    }

    pub fn with_colors(mut self, active: Color, dimmed: Color) -> Self {
        self.active = active;
        self.dimmed = dimmed;
        self
    }

    fn nav_span(&self, label: &'static str, enabled: bool) -> Span<'static> {
        if enabled {
            Span::raw(label)
        } else {
            Span::styled(label, Style::default().fg(self.dimmed))
        }
    }

    /// `‹ Prev  1 [2] 3  Next ›`
    pub fn buttons(&self) -> Line<'static> {
        let mut spans = vec![self.nav_span("‹ Prev", self.view.nav.previous), Span::raw("  ")];
        for page in &self.view.page_numbers {
            if *page == self.view.page.current_page {
                spans.push(Span::styled(
                    format!("[{}]", page),
                    Style::default().fg(self.active).add_modifier(Modifier::BOLD),
                ));
            } else {
                spans.push(Span::raw(format!(" {} ", page)));
            }
        }
        spans.push(Span::raw("  "));
        spans.push(self.nav_span("Next ›", self.view.nav.next));
        Line::from(spans)
    }
}

impl<R> Widget for Pager<'_, '_, R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.view.pager_visible {
            return;
        }
        let buttons = self.buttons();
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Fill(1), Constraint::Length(buttons.width() as u16)])
            .split(area);
        Paragraph::new(self.view.summary())
            .style(Style::default().fg(self.dimmed))
            .render(layout[0], buf);
        Paragraph::new(buttons).render(layout[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Column, TableEngine};
    use serde_json::{json, Value as Json};

    #[test]
    fn test_buttons_mark_current_page() {
        let mut engine = TableEngine::new(vec![Column::<Json>::field("id")]);
        engine.set_data((1..=25).map(|i| json!({ "id": i })).collect::<Vec<_>>());
        engine.next_page();
        let view = engine.view();
        let pager = Pager::new(&view);
        let text: String = pager.buttons().spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("[2]"));
        assert!(text.contains(" 1 "));
        assert!(text.contains(" 3 "));
        assert_eq!(view.summary(), "Showing 11 to 20 of 25");
    }

    #[test]
    fn test_hidden_for_single_page() {
        let mut engine = TableEngine::new(vec![Column::<Json>::field("id")]);
        engine.set_data(vec![json!({"id": 1})]);
        let view = engine.view();
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        Pager::new(&view).render(area, &mut buf);
        assert!(buf.content.iter().all(|c| c.symbol() == " "));
    }
}
