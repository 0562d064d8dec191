use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, StatefulWidget, Table, TableState, Widget, Wrap},
};

use crate::engine::{cell_text, Align, HeaderView, TableView, ViewState, ERROR_MARKER};

const SKELETON: &str = "░░░░░░";
const ACTIONS_HEADER: &str = "Actions";

/// Table body for one derived page.
pub struct DataTable<'v, 'a, R> {
    view: &'v TableView<'a, R>,
    pub header_bg: Color,
    pub header_fg: Color,
    pub header_focused: Color,
    pub row_numbers_fg: Color,
    pub skeleton_fg: Color,
    pub error_fg: Color,
    pub selected_bg: Color,
    pub table_cell_padding: u16,
    row_numbers: bool,
    focused_column: Option<usize>,
    selected_row: Option<usize>,
}

impl<'v, 'a, R> DataTable<'v, 'a, R> {
    pub fn new(view: &'v TableView<'a, R>) -> Self {
        Self {
            view,
            header_bg: Color::Indexed(236),
            header_fg: Color::White,
            header_focused: Color::Cyan,
            row_numbers_fg: Color::DarkGray,
            skeleton_fg: Color::DarkGray,
            error_fg: Color::Red,
            selected_bg: Color::Reset,
            table_cell_padding: 1,
            row_numbers: false,
            focused_column: None,
            selected_row: None,
        }
    }

    pub fn with_colors(mut self, header_bg: Color, header_fg: Color, row_numbers_fg: Color) -> Self {
        self.header_bg = header_bg;
        self.header_fg = header_fg;
        self.row_numbers_fg = row_numbers_fg;
        self
    }

    pub fn with_state_colors(
        mut self,
        header_focused: Color,
        selected_bg: Color,
        skeleton_fg: Color,
        error_fg: Color,
    ) -> Self {
        self.header_focused = header_focused;
        self.selected_bg = selected_bg;
        self.skeleton_fg = skeleton_fg;
        self.error_fg = error_fg;
        self
    }

    pub fn with_row_numbers(mut self, row_numbers: bool) -> Self {
        self.row_numbers = row_numbers;
        self
    }

    pub fn with_focus(mut self, column: Option<usize>, row: Option<usize>) -> Self {
        self.focused_column = column;
        self.selected_row = row;
        self
    }

    fn has_actions(&self) -> bool {
        self.view.rows.iter().any(|row| row.actions.is_some())
    }

    fn header_style(&self) -> Style {
        if self.header_bg == Color::Reset {
            Style::default().fg(self.header_fg)
        } else {
            Style::default().bg(self.header_bg).fg(self.header_fg)
        }
    }

    fn header_cell(&self, index: usize, header: &HeaderView<'_>) -> Cell<'static> {
        let mut style = Style::default();
        if self.focused_column == Some(index) {
            style = style.fg(self.header_focused).add_modifier(Modifier::BOLD);
        }
        if !header.sortable {
            style = style.add_modifier(Modifier::ITALIC);
        }
        Cell::from(aligned(header.title(), header.align)).style(style)
    }

    /// Body text for every cell of the page, row-major.
    fn body(&self) -> Vec<Vec<String>> {
        let actions = self.has_actions();
        self.view
            .rows
            .iter()
            .map(|row| {
                let mut cells = Vec::with_capacity(row.cells.len() + 2);
                if self.row_numbers {
                    cells.push(row.number.to_string());
                }
                cells.extend(row.cell_texts());
                if actions {
                    cells.push(row.actions.as_ref().map(cell_text).unwrap_or_default());
                }
                cells
            })
            .collect()
    }

    fn header_texts(&self) -> Vec<String> {
        let mut titles = Vec::new();
        if self.row_numbers {
            titles.push("#".to_string());
        }
        titles.extend(self.view.headers.iter().map(|h| h.title()));
        if self.has_actions() {
            titles.push(ACTIONS_HEADER.to_string());
        }
        titles
    }

    /// Content widths: header or widest cell, whichever is larger.
    fn widths(&self, body: &[Vec<String>]) -> Vec<Constraint> {
        let headers = self.header_texts();
        let mut widths: Vec<u16> = headers.iter().map(|h| h.chars().count() as u16).collect();
        for row in body {
            for (i, text) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(text.chars().count() as u16);
                }
            }
        }
        if self.view.state == ViewState::Loading {
            for width in widths.iter_mut() {
                *width = (*width).max(SKELETON.chars().count() as u16);
            }
        }
        widths.into_iter().map(Constraint::Length).collect()
    }

    fn header_row(&self) -> Row<'static> {
        let mut cells = Vec::new();
        if self.row_numbers {
            cells.push(Cell::from("#"));
        }
        cells.extend(
            self.view
                .headers
                .iter()
                .enumerate()
                .map(|(i, header)| self.header_cell(i, header)),
        );
        if self.has_actions() {
            cells.push(Cell::from(ACTIONS_HEADER));
        }
        Row::new(cells).style(self.header_style())
    }

    /// Reset means no themed selection color, so fall back to reversed video.
    fn selected_style(&self) -> Style {
        if self.selected_bg == Color::Reset {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default().bg(self.selected_bg)
        }
    }

    fn column_count(&self) -> usize {
        self.view.headers.len() + usize::from(self.row_numbers) + usize::from(self.has_actions())
    }

    fn render_message(&self, message: &str, area: Rect, buf: &mut Buffer) {
        let style = if self.view.state == ViewState::Errored {
            Style::default().fg(self.error_fg)
        } else {
            Style::default().fg(self.row_numbers_fg)
        };
        let body = Rect {
            y: area.y.saturating_add(1),
            height: area.height.saturating_sub(1),
            ..area
        };
        Paragraph::new(message.to_string())
            .style(style)
            .centered()
            .wrap(Wrap { trim: true })
            .render(body, buf);
    }
}

fn aligned(text: String, align: Align) -> Line<'static> {
    let line = Line::from(text);
    match align {
        Align::Left => line,
        Align::Center => line.alignment(Alignment::Center),
        Align::Right => line.alignment(Alignment::Right),
    }
}

impl<R> Widget for DataTable<'_, '_, R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let body = self.body();
        let widths = self.widths(&body);
        let offset = usize::from(self.row_numbers);

        let rows: Vec<Row> = if self.view.state == ViewState::Loading {
            (0..self.view.skeleton_rows)
                .map(|_| {
                    Row::new(vec![Cell::from(SKELETON); self.column_count()])
                        .style(Style::default().fg(self.skeleton_fg))
                })
                .collect()
        } else {
            body.into_iter()
                .enumerate()
                .map(|(row_index, texts)| {
                    let cells: Vec<Cell> = texts
                        .into_iter()
                        .enumerate()
                        .map(|(i, text)| {
                            let align = i
                                .checked_sub(offset)
                                .and_then(|c| self.view.headers.get(c))
                                .map(|h| h.align)
                                .unwrap_or_default();
                            let cell_style = if text == ERROR_MARKER {
                                Style::default().fg(self.error_fg)
                            } else if self.row_numbers && i == 0 {
                                Style::default().fg(self.row_numbers_fg)
                            } else {
                                Style::default()
                            };
                            Cell::from(aligned(text, align)).style(cell_style)
                        })
                        .collect();
                    let row = Row::new(cells);
                    if self.selected_row == Some(row_index) {
                        row.style(self.selected_style())
                    } else {
                        row
                    }
                })
                .collect()
        };

        let table = Table::new(rows, widths)
            .column_spacing(self.table_cell_padding)
            .header(self.header_row());
        let mut state = TableState::default();
        StatefulWidget::render(table, area, buf, &mut state);

        if let Some(message) = &self.view.message {
            self.render_message(message, area, buf);
        }
    }
}

/// Message for a table that has never received data.
pub fn idle_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), Style::default().add_modifier(Modifier::DIM)))
}
