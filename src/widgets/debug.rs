use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Paragraph, Widget},
};

/// Operational counters shown on the debug line.
#[derive(Debug, Default)]
pub struct DebugState {
    pub enabled: bool,
    pub num_events: usize,
    pub num_frames: usize,
    pub num_keys: usize,
    pub last_action: String,
    /// Size of the last search/date filtered set.
    pub filtered: Option<usize>,
}

impl DebugState {
    pub fn record(&mut self, action: impl Into<String>) {
        self.last_action = action.into();
        log::debug!("{}", self.last_action);
    }

    pub fn line(&self) -> String {
        let filtered = self
            .filtered
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "events: {} | frames: {} | keys: {} | filtered: {} | last: {}",
            self.num_events, self.num_frames, self.num_keys, filtered, self.last_action
        )
    }
}

impl Widget for &DebugState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.line())
            .style(Style::default().fg(Color::DarkGray))
            .render(area, buf);
    }
}
