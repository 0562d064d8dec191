use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use serde_json::Value as Json;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

pub mod columns;
pub mod config;
pub mod engine;
pub mod logging;
pub mod source;
pub mod widgets;

pub use config::{
    rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ColorParser, ConfigManager, Theme,
};
pub use tabula_cli::Args;

use columns::{build_columns, ColumnSpec, Template};
use engine::{Labels, Paging, SortState, TableEngine, ViewState};
use source::{DataSource, Payload};
use widgets::controls::Controls;
use widgets::datatable::{idle_line, DataTable};
use widgets::debug::DebugState;
use widgets::filter_bar::FilterBar;
use widgets::pager::Pager;
use widgets::text_input::{TextInput, TextInputEvent};

/// Application name used for config, log and other app-specific paths
pub const APP_NAME: &str = "tabula";

/// Page sizes stepped through with `+` and `-`.
pub const PAGE_SIZES: [usize; 5] = [5, 10, 25, 50, 100];

/// How the table is set up before any data arrives.
#[derive(Debug, Clone)]
pub struct TableOptions {
    pub page_size: usize,
    pub sort: Option<SortState>,
    pub search: Option<String>,
    pub date_key: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub columns: Vec<String>,
    pub no_search: Vec<String>,
    pub row_numbers: bool,
    pub actions: Option<Template>,
    pub labels: Labels,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            page_size: engine::DEFAULT_PAGE_SIZE,
            sort: None,
            search: None,
            date_key: None,
            from: None,
            to: None,
            columns: Vec::new(),
            no_search: Vec::new(),
            row_numbers: false,
            actions: None,
            labels: Labels::default(),
        }
    }
}

impl TableOptions {
    /// Create TableOptions from CLI args and config, with CLI args taking precedence
    pub fn from_args_and_config(args: &Args, config: &AppConfig) -> Result<Self> {
        let page_size = args.page_size.unwrap_or(config.table.page_size);
        if page_size == 0 {
            return Err(eyre!("--page-size must be greater than 0"));
        }

        let sort = match &args.sort {
            Some(spec) => Some(
                SortState::parse(spec)
                    .ok_or_else(|| eyre!("Invalid --sort '{}': expected KEY or KEY:asc|desc", spec))?,
            ),
            None => None,
        };

        for (flag, value) in [("--from", &args.from), ("--to", &args.to)] {
            if let Some(text) = value {
                if engine::value::parse_date(text).is_none() {
                    return Err(eyre!("Invalid {} date '{}': expected YYYY-MM-DD", flag, text));
                }
            }
        }

        let columns = if args.columns.is_empty() {
            config.table.columns.clone()
        } else {
            args.columns.clone()
        };
        for spec in &columns {
            ColumnSpec::parse(spec)?;
        }

        let mut no_search = config.table.no_search.clone();
        for column in &args.no_search {
            if !no_search.contains(column) {
                no_search.push(column.clone());
            }
        }

        let actions = config
            .table
            .actions
            .as_deref()
            .map(Template::parse)
            .transpose()?;

        Ok(Self {
            page_size,
            sort,
            search: args.search.clone(),
            date_key: args.date_key.clone().or_else(|| config.table.date_key.clone()),
            from: args.from.clone(),
            to: args.to.clone(),
            columns,
            no_search,
            row_numbers: args.row_numbers || config.table.show_row_numbers,
            actions,
            labels: config.labels(),
        })
    }

    /// A table with these options applied and no columns yet.
    pub fn build_table(&self) -> TableEngine<Json> {
        let mut table = TableEngine::new(Vec::new())
            .with_page_size(self.page_size)
            .with_labels(self.labels.clone());
        if let Some(sort) = &self.sort {
            table = table.with_default_sort(sort.clone());
        }
        if let Some(key) = &self.date_key {
            table = table.with_date_key(key.clone());
        }
        if let Some(template) = &self.actions {
            let template = template.clone();
            table = table.with_actions(move |record: &Json| template.render("actions", record));
        }
        if let Some(from) = &self.from {
            table.set_date_start(from);
        }
        if let Some(to) = &self.to {
            table.set_date_end(to);
        }
        if let Some(search) = &self.search {
            table.set_search(search.clone());
        }
        table
    }
}

/// Load `input`, run it through the table and write the derived records to
/// `output`. Returns the number of records written.
pub fn export_table(options: &TableOptions, input: &Path, output: &Path) -> Result<usize> {
    let payload = source::read_payload(input)?;
    let mut table = options.build_table();
    table.set_columns(build_columns(
        &options.columns,
        &options.no_search,
        payload.first_record(),
    )?);
    payload.install(&mut table);
    if table.state() == ViewState::Errored {
        let message = table.view().message.unwrap_or_default();
        return Err(eyre!("{}: {}", input.display(), message));
    }
    let records = table.ordered();
    source::write_records(&records, output)?;
    log::info!("exported {} records to {}", records.len(), output.display());
    Ok(records.len())
}

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Open(PathBuf),
    Loaded(Payload),
    LoadFailed(String),
    /// The table moved to a page; remote sources refetch it.
    PageRequested(usize),
    /// Size of the search/date filtered set after a change.
    Filtered(usize),
    Exit,
    Crash(String),
    Resize(u16, u16), // resized (width, height)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
    DateFrom,
    DateTo,
    /// Full record popup for the selected row.
    Detail,
}

pub struct App {
    table: TableEngine<Json>,
    options: TableOptions,
    source: Option<DataSource>,
    columns_ready: bool,
    events: Sender<AppEvent>,
    pub input_mode: InputMode,
    search_input: TextInput,
    date_from: TextInput,
    date_to: TextInput,
    focused_column: usize,
    selected_row: Option<usize>,
    show_help: bool,
    help_scroll: usize,
    status: Option<String>,
    debug: DebugState,
    theme: Theme,
}

impl App {
    pub fn send_event(&mut self, event: AppEvent) -> Result<()> {
        self.events.send(event)?;
        Ok(())
    }

    pub fn new(events: Sender<AppEvent>) -> App {
        let theme = Theme::from_config(&AppConfig::default().theme).unwrap_or_else(|e| {
            log::warn!("Failed to create default theme: {}. Using fallback.", e);
            Theme::default()
        });
        Self::new_with_config(events, theme, TableOptions::default())
    }

    pub fn new_with_config(events: Sender<AppEvent>, theme: Theme, options: TableOptions) -> App {
        let pages = events.clone();
        let filtered = events.clone();
        let table = options
            .build_table()
            .on_sort(|key, direction| log::info!("sort by {} {}", key, direction.as_str()))
            .on_page_change(move |page| {
                let _ = pages.send(AppEvent::PageRequested(page));
            })
            .on_search(move |rows: &[&Json]| {
                let _ = filtered.send(AppEvent::Filtered(rows.len()));
            });

        let mut search_input = TextInput::new()
            .with_theme(&theme)
            .with_placeholder(options.labels.search_placeholder.clone());
        search_input.set_value(options.search.clone().unwrap_or_default());
        let mut date_from = TextInput::new().with_theme(&theme).with_placeholder("YYYY-MM-DD");
        date_from.set_value(options.from.clone().unwrap_or_default());
        let mut date_to = TextInput::new().with_theme(&theme).with_placeholder("YYYY-MM-DD");
        date_to.set_value(options.to.clone().unwrap_or_default());

        App {
            table,
            options,
            source: None,
            columns_ready: false,
            events,
            input_mode: InputMode::Normal,
            search_input,
            date_from,
            date_to,
            focused_column: 0,
            selected_row: None,
            show_help: false,
            help_scroll: 0,
            status: None,
            debug: DebugState::default(),
            theme,
        }
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn table(&self) -> &TableEngine<Json> {
        &self.table
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn focused_column(&self) -> usize {
        self.focused_column
    }

    pub fn selected_row(&self) -> Option<usize> {
        self.selected_row
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn filtered_count(&self) -> Option<usize> {
        self.debug.filtered
    }

    /// Get a color from the theme by name
    fn color(&self, name: &str) -> Color {
        self.theme.get(name)
    }

    fn open(&mut self, path: &Path) {
        let source = DataSource::new(path);
        let first = source.initial_path();
        self.source = Some(source);
        self.columns_ready = false;
        self.selected_row = None;
        self.table.set_loading(true);
        source::spawn_load(first, self.events.clone());
    }

    fn install(&mut self, payload: Payload) {
        if !self.columns_ready {
            match build_columns(&self.options.columns, &self.options.no_search, payload.first_record()) {
                Ok(columns) => {
                    self.columns_ready = !columns.is_empty();
                    self.table.set_columns(columns);
                }
                Err(e) => {
                    self.fail(e.to_string());
                    return;
                }
            }
        }
        payload.install(&mut self.table);
        self.focused_column = self
            .focused_column
            .min(self.table.columns().len().saturating_sub(1));
        self.selected_row = None;
    }

    fn fail(&mut self, message: String) {
        self.table.set_loading(false);
        let label = self.table.labels().error_message.clone();
        self.table.set_error(Some(format!("{}: {}", label, message)));
    }

    /// Refetch a page of a `{page}` source.
    fn request_page(&mut self, page: usize) {
        self.debug.record(format!("page {}", page));
        let Paging::Remote { .. } = self.table.paging() else {
            return;
        };
        let Some(path) = self
            .source
            .as_ref()
            .filter(|s| s.is_paged())
            .map(|s| s.path_for_page(page))
        else {
            return;
        };
        self.table.set_loading(true);
        source::spawn_load(path, self.events.clone());
    }

    fn rows_on_page(&self) -> usize {
        self.table.view().rows.len()
    }

    fn focus_column(&mut self, forward: bool) {
        let count = self.table.columns().len();
        if count == 0 {
            return;
        }
        self.focused_column = if forward {
            (self.focused_column + 1).min(count - 1)
        } else {
            self.focused_column.saturating_sub(1)
        };
    }

    fn sort_focused(&mut self) {
        let Some(key) = self
            .table
            .columns()
            .get(self.focused_column)
            .map(|c| c.key.clone())
        else {
            return;
        };
        if self.table.click_header(&key) {
            let direction = self.table.sort_state().direction;
            self.debug.record(format!("sort {} {}", key, direction.as_str()));
            self.status = None;
        } else {
            self.status = Some(format!("Column '{}' is not sortable", key));
        }
    }

    fn select_row(&mut self, forward: bool) {
        let rows = self.rows_on_page();
        if rows == 0 {
            self.selected_row = None;
            return;
        }
        self.selected_row = Some(match self.selected_row {
            None => 0,
            Some(i) if forward => (i + 1).min(rows - 1),
            Some(i) => i.saturating_sub(1),
        });
    }

    /// Load the current page again, clearing a previous load error.
    fn reload(&mut self) {
        let Some(path) = self.source.as_ref().map(|s| {
            if s.is_paged() {
                s.path_for_page(self.table.current_page())
            } else {
                s.initial_path()
            }
        }) else {
            return;
        };
        self.debug.record(format!("reload {}", path.display()));
        self.status = None;
        self.table.set_error(None);
        self.table.set_loading(true);
        source::spawn_load(path, self.events.clone());
    }

    /// A `{page}` file failed to load; paging keys stay live so another page
    /// can be requested.
    fn page_load_failed(&self) -> bool {
        self.table.state() == ViewState::Errored
            && matches!(self.table.paging(), Paging::Remote { .. })
            && self.source.as_ref().is_some_and(|s| s.is_paged())
    }

    fn move_page(&mut self, step: impl FnOnce(&mut TableEngine<Json>) -> bool) {
        let failed = self.page_load_failed();
        if failed {
            self.table.set_error(None);
        }
        if step(&mut self.table) {
            self.selected_row = None;
        } else if failed {
            self.reload();
        }
    }

    fn step_page_size(&mut self, larger: bool) {
        let current = self.table.page_size();
        let next = if larger {
            PAGE_SIZES.iter().copied().find(|s| *s > current)
        } else {
            PAGE_SIZES.iter().rev().copied().find(|s| *s < current)
        };
        if let Some(size) = next {
            self.table.set_page_size(size);
            self.selected_row = None;
            self.debug.record(format!("page size {}", size));
        }
    }

    fn begin_date_input(&mut self) {
        if self.table.date_key().is_none() {
            self.status = Some("No date field configured (use --date-key)".to_string());
            return;
        }
        self.input_mode = InputMode::DateFrom;
        self.date_from.set_focused(true);
    }

    fn clear_dates(&mut self) {
        self.table.clear_date_range();
        self.date_from.clear();
        self.date_to.clear();
        self.selected_row = None;
        self.debug.record("clear date range");
    }

    fn search_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        match self.search_input.handle_key(event) {
            TextInputEvent::Changed => {
                self.table.set_search(self.search_input.value().to_string());
                self.selected_row = None;
                self.debug.record(format!("search '{}'", self.search_input.value()));
            }
            TextInputEvent::Submit | TextInputEvent::Cancel => {
                self.search_input.set_focused(false);
                self.input_mode = InputMode::Normal;
            }
            TextInputEvent::None => {}
        }
        None
    }

    fn date_key_input(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        let from = self.input_mode == InputMode::DateFrom;
        if event.code == KeyCode::Tab {
            self.switch_date_input(!from);
            return None;
        }
        let input = if from { &mut self.date_from } else { &mut self.date_to };
        match input.handle_key(event) {
            TextInputEvent::Submit => {
                let text = input.value().to_string();
                let applied = if from {
                    self.table.set_date_start(&text)
                } else {
                    self.table.set_date_end(&text)
                };
                if !applied {
                    self.status = Some(format!("Invalid date '{}': expected YYYY-MM-DD", text));
                    return None;
                }
                self.status = None;
                self.selected_row = None;
                self.debug.record(format!("date {} '{}'", if from { "from" } else { "to" }, text));
                if from {
                    self.switch_date_input(false);
                } else {
                    self.date_to.set_focused(false);
                    self.input_mode = InputMode::Normal;
                }
            }
            TextInputEvent::Cancel => {
                self.date_from.set_focused(false);
                self.date_to.set_focused(false);
                self.input_mode = InputMode::Normal;
            }
            TextInputEvent::Changed | TextInputEvent::None => {}
        }
        None
    }

    fn switch_date_input(&mut self, to_from: bool) {
        self.date_from.set_focused(to_from);
        self.date_to.set_focused(!to_from);
        self.input_mode = if to_from {
            InputMode::DateFrom
        } else {
            InputMode::DateTo
        };
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        if event.kind != KeyEventKind::Press {
            return None;
        }
        self.debug.num_keys += 1;
        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);

        if self.show_help {
            match event.code {
                KeyCode::Esc | KeyCode::Char('q') => self.show_help = false,
                KeyCode::Char('h') if ctrl => self.show_help = false,
                KeyCode::Down | KeyCode::Char('j') => self.help_scroll += 1,
                KeyCode::Up | KeyCode::Char('k') => {
                    self.help_scroll = self.help_scroll.saturating_sub(1)
                }
                _ => {}
            }
            return None;
        }

        match self.input_mode {
            InputMode::Search => return self.search_key(event),
            InputMode::DateFrom | InputMode::DateTo => return self.date_key_input(event),
            InputMode::Detail => {
                if matches!(event.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                    self.input_mode = InputMode::Normal;
                }
                return None;
            }
            InputMode::Normal => {}
        }

        match event.code {
            KeyCode::Char('q') => return Some(AppEvent::Exit),
            KeyCode::Char('h') if ctrl => {
                self.show_help = true;
                self.help_scroll = 0;
            }
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
                self.search_input.set_focused(true);
            }
            KeyCode::Left | KeyCode::Char('h') => self.focus_column(false),
            KeyCode::Right | KeyCode::Char('l') => self.focus_column(true),
            KeyCode::Char('s') => self.sort_focused(),
            KeyCode::Down | KeyCode::Char('j') => self.select_row(true),
            KeyCode::Up | KeyCode::Char('k') => self.select_row(false),
            KeyCode::Enter => {
                if self.selected_row.is_some_and(|i| i < self.rows_on_page()) {
                    self.input_mode = InputMode::Detail;
                }
            }
            KeyCode::Char('n') | KeyCode::PageDown => self.move_page(|t| t.next_page()),
            KeyCode::Char('p') | KeyCode::PageUp => self.move_page(|t| t.previous_page()),
            KeyCode::Home | KeyCode::Char('g') => self.move_page(|t| t.first_page()),
            KeyCode::End | KeyCode::Char('G') => self.move_page(|t| t.last_page()),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('d') => self.begin_date_input(),
            KeyCode::Char('c') => self.clear_dates(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.step_page_size(true),
            KeyCode::Char('-') => self.step_page_size(false),
            KeyCode::Esc => {
                self.selected_row = None;
                self.status = None;
            }
            _ => {}
        }
        None
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Open(path) => {
                self.debug.record(format!("open {}", path.display()));
                self.open(path);
                None
            }
            AppEvent::Loaded(payload) => {
                self.install(payload.clone());
                None
            }
            AppEvent::LoadFailed(message) => {
                self.fail(message.clone());
                None
            }
            AppEvent::PageRequested(page) => {
                self.request_page(*page);
                None
            }
            AppEvent::Filtered(count) => {
                self.debug.filtered = Some(*count);
                None
            }
            AppEvent::Resize(_cols, _rows) => None,
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    fn help_text(&self) -> String {
        const KEYS: [(&str, &str); 17] = [
            ("/", "Edit search (Enter or Esc to leave)"),
            ("←/→ h/l", "Move header focus"),
            ("s", "Sort by focused column (toggles direction)"),
            ("↑/↓ j/k", "Select row"),
            ("Enter", "Show selected record"),
            ("n / PageDown", "Next page"),
            ("p / PageUp", "Previous page"),
            ("Home / g", "First page"),
            ("End / G", "Last page"),
            ("r", "Reload the current page"),
            ("+ / -", "Change page size"),
            ("d", "Edit date range (Tab switches From/To)"),
            ("c", "Clear date range"),
            ("Esc", "Clear selection"),
            ("Ctrl-h", "Toggle this help"),
            ("↑/↓ in help", "Scroll help"),
            ("q", "Quit"),
        ];
        let mut text: String = KEYS
            .iter()
            .map(|(key, action)| format!("{:<14} {}\n", key, action))
            .collect();
        text.push_str("\nSearch matches any searchable column, case-insensitive.\n");
        text.push_str("Computed columns (KEY={a} {b}) cannot be sorted.\n");
        if let Some(key) = self.table.date_key() {
            text.push_str(&format!("Date filter applies to '{}'.\n", key));
        }
        text
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;
        let app: &App = self;

        Block::default()
            .style(Style::default().bg(app.color("background")))
            .render(area, buf);

        let mut constraints = vec![
            Constraint::Length(3), // Search and dates
            Constraint::Fill(1),
            Constraint::Length(1), // Pager
            Constraint::Length(1), // Controls
        ];
        if app.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let mut filter_bar = FilterBar::new(&app.search_input)
            .with_colors(app.color("table_border"), app.color("primary"));
        if app.table.date_key().is_some() {
            filter_bar = filter_bar.with_dates(
                &app.table.labels().date_filter_label,
                &app.date_from,
                &app.date_to,
            );
        }
        filter_bar.render(layout[0], buf);

        let view = app.table.view();
        let table_block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.color("table_border")));
        let table_area = table_block.inner(layout[1]);
        table_block.render(layout[1], buf);
        if view.state == ViewState::Idle {
            Paragraph::new(idle_line("No data loaded"))
                .centered()
                .render(table_area, buf);
        } else {
            DataTable::new(&view)
                .with_colors(
                    app.color("controls_bg"),
                    app.color("table_header"),
                    app.color("dimmed"),
                )
                .with_state_colors(
                    app.color("header_focused"),
                    app.color("table_selected"),
                    app.color("skeleton"),
                    app.color("error"),
                )
                .with_row_numbers(app.options.row_numbers)
                .with_focus(Some(app.focused_column), app.selected_row)
                .render(table_area, buf);
        }

        Pager::new(&view)
            .with_colors(app.color("primary"), app.color("dimmed"))
            .render(layout[2], buf);

        let controls = Controls::new()
            .with_row_count(view.page.total_items)
            .with_status(app.status.clone())
            .with_dimmed(app.input_mode != InputMode::Normal)
            .with_search_active(app.input_mode == InputMode::Search)
            .with_background(app.color("controls_bg"));
        (&controls).render(layout[3], buf);

        if app.debug.enabled {
            (&app.debug).render(layout[4], buf);
        }

        if app.input_mode == InputMode::Detail {
            if let Some(row) = app.selected_row.and_then(|i| view.rows.get(i)) {
                let popup = centered_rect(area, 60, 60);
                Clear.render(popup, buf);
                let text = serde_json::to_string_pretty(row.record)
                    .unwrap_or_else(|e| format!("Could not display record: {}", e));
                Paragraph::new(text)
                    .style(Style::default().fg(app.color("text_primary")))
                    .wrap(Wrap { trim: false })
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_style(Style::default().fg(app.color("modal_border_active")))
                            .title(format!("Record #{}", row.number)),
                    )
                    .render(popup, buf);
            }
        }

        if app.show_help {
            let popup = centered_rect(area, 70, 70);
            Clear.render(popup, buf);
            Paragraph::new(app.help_text())
                .style(Style::default().fg(app.color("text_secondary")))
                .scroll((app.help_scroll.min(u16::MAX as usize) as u16, 0))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(app.color("modal_border")))
                        .title("Help"),
                )
                .render(popup, buf);
        }
    }
}

fn centered_rect(r: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
