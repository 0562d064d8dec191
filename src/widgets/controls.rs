use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Paragraph, Widget},
};

const CONTROLS: [(&str, &str); 8] = [
    ("/", "Search"),
    ("s", "Sort"),
    ("n/p", "Page"),
    ("d", "Dates"),
    ("+/-", "Size"),
    ("⏎", "Detail"),
    ("^h", "Help"),
    ("q", "Quit"),
];

/// Bottom line of key hints.
#[derive(Default)]
pub struct Controls {
    pub row_count: Option<usize>,
    pub status: Option<String>,
    pub dimmed: bool,
    pub search_active: bool,
    pub bg: Option<Color>,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row_count(mut self, row_count: usize) -> Self {
        self.row_count = Some(row_count);
        self
    }

    pub fn with_status(mut self, status: Option<String>) -> Self {
        self.status = status;
        self
    }

    pub fn with_dimmed(mut self, dimmed: bool) -> Self {
        self.dimmed = dimmed;
        self
    }

    pub fn with_search_active(mut self, search_active: bool) -> Self {
        self.search_active = search_active;
        self
    }

    pub fn with_background(mut self, bg: Color) -> Self {
        self.bg = Some(bg);
        self
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut constraints = CONTROLS.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });
        constraints.push(Constraint::Fill(1));
        if self.row_count.is_some() {
            constraints.push(Constraint::Length(15));
        }

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let color = self.bg.unwrap_or(Color::DarkGray);

        let base_style = if self.dimmed {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        for (i, (key, action)) in CONTROLS.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(base_style.bold())
                .centered()
                .render(layout[j], buf);
            let action_style = if *action == "Search" && self.search_active {
                base_style.bg(color).fg(Color::Cyan)
            } else {
                base_style.bg(color)
            };
            Paragraph::new(*action)
                .style(action_style)
                .render(layout[j + 1], buf);
        }

        let fill_idx = CONTROLS.len() * 2;
        Paragraph::new(self.status.clone().unwrap_or_default())
            .style(base_style.bg(color).fg(Color::Yellow))
            .render(layout[fill_idx], buf);

        if let Some(count) = self.row_count {
            Paragraph::new(format!("Rows: {}", count))
                .style(base_style.bg(color).fg(if self.dimmed {
                    Color::DarkGray
                } else {
                    Color::White
                }))
                .right_aligned()
                .render(layout[fill_idx + 1], buf);
        }
    }
}
