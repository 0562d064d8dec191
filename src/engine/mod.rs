//! Client-side tabular data engine.
//!
//! A [`TableEngine`] owns the transient table state (search term, sort, date
//! range, page) for one snapshot of records and derives a [`TableView`] from
//! it by running the pipeline sanitize → date filter → search → sort →
//! paginate. Every stage is a pure function over borrowed records, so a view
//! is recomputed from scratch on each call. Failures are contained to the
//! record, comparison or cell they happen in.

pub mod column;
pub mod date_filter;
pub mod paginate;
pub mod sanitize;
pub mod search;
pub mod sort;
pub mod value;

use serde::{Deserialize, Serialize};

pub use column::{cell_text, Accessor, Align, Column, Node, RenderError, RenderFn, Rendered, ERROR_MARKER};
pub use date_filter::{filter_by_date, DateRange};
pub use paginate::{page_window, paginate, paginate_remote, PageInfo, PageNav};
pub use sanitize::{sanitize, Diagnostic, Source};
pub use search::filter_by_search;
pub use sort::{sort_records, SortDirection, SortState};
pub use value::{Record, Value};

pub const DEFAULT_PAGE_SIZE: usize = 10;
/// Number of page buttons shown around the current page.
pub const PAGE_WINDOW: usize = 5;
pub const NO_MATCHES_MESSAGE: &str = "No matching results found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    /// No data has been supplied yet.
    #[default]
    Idle,
    Loading,
    Ready,
    Errored,
}

/// Who slices the records into pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Paging {
    #[default]
    Local,
    /// Records already are one page of a server-side result with
    /// `total_pages` pages. Page changes are forwarded for a refetch.
    Remote { total_pages: usize },
}

/// Payload of a server-paginated endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePage<R> {
    pub items: Vec<R>,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
}

/// Display strings supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub search_placeholder: String,
    pub error_message: String,
    pub date_filter_label: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            search_placeholder: "Search...".to_string(),
            error_message: "Failed to load data".to_string(),
            date_filter_label: "Filter by date".to_string(),
        }
    }
}

pub type SortCallback = Box<dyn FnMut(&str, SortDirection)>;
pub type PageCallback = Box<dyn FnMut(usize)>;
pub type SearchCallback<R> = Box<dyn FnMut(&[&R])>;

/// Date filter then search over sanitized records. Input order is kept.
pub fn filter_records<'a, R: Record>(
    records: &'a [R],
    columns: &[Column<R>],
    date_key: Option<&str>,
    range: &DateRange,
    term: &str,
) -> Vec<&'a R> {
    let dated = filter_by_date(records.iter().collect(), date_key, range);
    filter_by_search(dated, columns, term)
}

pub struct HeaderView<'a> {
    pub key: &'a str,
    pub label: &'a str,
    pub align: Align,
    pub sortable: bool,
    /// Direction of the active sort when this is the sort column.
    pub sorted: Option<SortDirection>,
}

impl HeaderView<'_> {
    /// Header label with the sort arrow appended when sorted.
    pub fn title(&self) -> String {
        match self.sorted {
            Some(direction) => format!("{} {}", self.label, direction.arrow()),
            None => self.label.to_string(),
        }
    }
}

pub struct RowView<'a, R> {
    /// Absolute 1-based position within the filtered set.
    pub number: usize,
    pub record: &'a R,
    pub cells: Vec<Result<Rendered, RenderError>>,
    pub actions: Option<Result<Rendered, RenderError>>,
}

impl<R> RowView<'_, R> {
    pub fn cell_texts(&self) -> Vec<String> {
        self.cells.iter().map(cell_text).collect()
    }
}

/// Everything a host needs to draw one frame of the table.
pub struct TableView<'a, R> {
    pub state: ViewState,
    pub headers: Vec<HeaderView<'a>>,
    pub rows: Vec<RowView<'a, R>>,
    /// Placeholder rows to draw while loading.
    pub skeleton_rows: usize,
    pub page: PageInfo,
    pub nav: PageNav,
    pub page_numbers: Vec<usize>,
    pub pager_visible: bool,
    /// Error text in `Errored`, empty-state text for an empty `Ready` page.
    pub message: Option<String>,
    pub diagnostic: Option<Diagnostic>,
}

impl<R> TableView<'_, R> {
    /// "Showing X to Y of Z", or "Page X of Y" when the server sliced the
    /// page and the overall item count is unknown.
    pub fn summary(&self) -> String {
        if self.page.remote {
            return format!("Page {} of {}", self.page.current_page, self.page.total_pages);
        }
        format!(
            "Showing {} to {} of {}",
            self.page.start_item, self.page.end_item, self.page.total_items
        )
    }
}

pub struct TableEngine<R> {
    columns: Vec<Column<R>>,
    source: Source<R>,
    received: bool,
    loading: bool,
    error: Option<String>,
    page_size: usize,
    current_page: usize,
    search: String,
    sort: SortState,
    date_key: Option<String>,
    date_range: DateRange,
    paging: Paging,
    actions: Option<RenderFn<R>>,
    labels: Labels,
    on_sort: Option<SortCallback>,
    on_page_change: Option<PageCallback>,
    on_search: Option<SearchCallback<R>>,
}

impl<R: Record> TableEngine<R> {
    pub fn new(columns: Vec<Column<R>>) -> Self {
        Self {
            columns,
            source: Source::Absent,
            received: false,
            loading: false,
            error: None,
            page_size: DEFAULT_PAGE_SIZE,
            current_page: 1,
            search: String::new(),
            sort: SortState::default(),
            date_key: None,
            date_range: DateRange::default(),
            paging: Paging::Local,
            actions: None,
            labels: Labels::default(),
            on_sort: None,
            on_page_change: None,
            on_search: None,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_default_sort(mut self, sort: SortState) -> Self {
        self.sort = sort;
        self
    }

    /// Enable the date filter on `key`.
    pub fn with_date_key(mut self, key: impl Into<String>) -> Self {
        self.date_key = Some(key.into());
        self
    }

    pub fn with_actions<F>(mut self, f: F) -> Self
    where
        F: Fn(&R) -> Result<Rendered, RenderError> + Send + Sync + 'static,
    {
        self.actions = Some(std::sync::Arc::new(f));
        self
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn on_sort(mut self, f: impl FnMut(&str, SortDirection) + 'static) -> Self {
        self.on_sort = Some(Box::new(f));
        self
    }

    pub fn on_page_change(mut self, f: impl FnMut(usize) + 'static) -> Self {
        self.on_page_change = Some(Box::new(f));
        self
    }

    pub fn on_search(mut self, f: impl FnMut(&[&R]) + 'static) -> Self {
        self.on_search = Some(Box::new(f));
        self
    }

    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn search_term(&self) -> &str {
        &self.search
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn date_key(&self) -> Option<&str> {
        self.date_key.as_deref()
    }

    pub fn date_range(&self) -> &DateRange {
        &self.date_range
    }

    pub fn paging(&self) -> Paging {
        self.paging
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn state(&self) -> ViewState {
        if self.loading {
            ViewState::Loading
        } else if self.error.is_some() {
            ViewState::Errored
        } else if !self.received {
            ViewState::Idle
        } else if sanitize(&self.source).diagnostic.is_some() {
            ViewState::Errored
        } else {
            ViewState::Ready
        }
    }

    /// True when a search term or an active date filter narrows the records.
    pub fn is_filtering(&self) -> bool {
        !self.search.trim().is_empty() || (self.date_key.is_some() && self.date_range.is_active())
    }

    /// Replace the column set. Search results can change, so this resets to page 1.
    pub fn set_columns(&mut self, columns: Vec<Column<R>>) {
        self.columns = columns;
        self.current_page = 1;
        self.notify_search();
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Show `message` as an error row; `None` clears it.
    pub fn set_error(&mut self, message: Option<String>) {
        if let Some(message) = &message {
            log::warn!("table error: {}", message);
        }
        self.error = message;
    }

    /// Replace the record source. Resets to page 1 and switches to local paging.
    pub fn set_data(&mut self, source: impl Into<Source<R>>) {
        self.source = source.into();
        self.received = true;
        self.loading = false;
        self.error = None;
        self.paging = Paging::Local;
        self.current_page = 1;
        self.notify_search();
    }

    /// Install one server-side page. The requested page number is kept and
    /// clamped to the reported page count.
    pub fn set_remote_page(&mut self, page: RemotePage<R>) {
        let total_pages = page.total_pages.max(1);
        self.source = Source::Records(page.items);
        self.received = true;
        self.loading = false;
        self.error = None;
        self.paging = Paging::Remote { total_pages };
        self.current_page = paginate::clamp_page(self.current_page, total_pages);
        self.notify_search();
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term == self.search {
            return;
        }
        self.search = term;
        self.current_page = 1;
        self.notify_search();
    }

    pub fn set_date_key(&mut self, key: Option<String>) {
        self.date_key = key;
        self.current_page = 1;
        self.notify_search();
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        self.date_range = range;
        self.current_page = 1;
        self.notify_search();
    }

    /// Set the start bound from user text. Returns false for unparseable text.
    pub fn set_date_start(&mut self, text: &str) -> bool {
        let mut range = self.date_range;
        if !range.set_start_str(text) {
            return false;
        }
        self.set_date_range(range);
        true
    }

    pub fn set_date_end(&mut self, text: &str) -> bool {
        let mut range = self.date_range;
        if !range.set_end_str(text) {
            return false;
        }
        self.set_date_range(range);
        true
    }

    pub fn clear_date_range(&mut self) {
        self.set_date_range(DateRange::default());
    }

    /// Header click. Returns false for unknown or computed columns.
    pub fn click_header(&mut self, key: &str) -> bool {
        let sortable = self
            .columns
            .iter()
            .find(|c| c.key == key)
            .is_some_and(|c| c.is_sortable());
        if !sortable {
            log::debug!("ignoring sort click on '{}'", key);
            return false;
        }
        self.sort.toggle(key);
        let direction = self.sort.direction;
        if let Some(on_sort) = self.on_sort.as_mut() {
            on_sort(key, direction);
        }
        self.clamp_page();
        true
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
        self.clamp_page();
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.clamp_page();
    }

    pub fn total_pages(&self) -> usize {
        match self.paging {
            Paging::Local => paginate::total_pages(self.filtered().len(), self.page_size),
            Paging::Remote { total_pages } => total_pages.max(1),
        }
    }

    /// Move to `page` (clamped). Refused while navigation is disabled.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if !self.navigation_enabled() {
            return false;
        }
        let page = paginate::clamp_page(page, self.total_pages());
        if page == self.current_page {
            return false;
        }
        self.current_page = page;
        if let Some(on_page_change) = self.on_page_change.as_mut() {
            on_page_change(page);
        }
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.current_page + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        self.go_to_page(self.current_page.saturating_sub(1))
    }

    pub fn first_page(&mut self) -> bool {
        self.go_to_page(1)
    }

    pub fn last_page(&mut self) -> bool {
        self.go_to_page(self.total_pages())
    }

    fn navigation_enabled(&self) -> bool {
        !matches!(self.state(), ViewState::Loading | ViewState::Errored)
    }

    fn clamp_page(&mut self) {
        self.current_page = paginate::clamp_page(self.current_page, self.total_pages());
    }

    fn notify_search(&mut self) {
        let Some(on_search) = self.on_search.as_mut() else {
            return;
        };
        let records = sanitize(&self.source).records;
        let filtered = filter_records(
            records,
            &self.columns,
            self.date_key.as_deref(),
            &self.date_range,
            &self.search,
        );
        on_search(&filtered);
    }

    /// Sanitized records after the date filter and search.
    pub fn filtered(&self) -> Vec<&R> {
        filter_records(
            sanitize(&self.source).records,
            &self.columns,
            self.date_key.as_deref(),
            &self.date_range,
            &self.search,
        )
    }

    /// Field the active sort orders by. A key with no matching column is
    /// taken as a field name; a computed column never sorts.
    fn sort_field(&self) -> Option<&str> {
        let key = self.sort.column.as_deref()?;
        match self.columns.iter().find(|c| c.key == key) {
            Some(column) => column.sort_field(),
            None => Some(key),
        }
    }

    /// Filtered records in display order.
    pub fn ordered(&self) -> Vec<&R> {
        let filtered = self.filtered();
        match self.sort_field() {
            Some(field) => sort_records(filtered, field, self.sort.direction),
            None => filtered,
        }
    }

    fn headers(&self) -> Vec<HeaderView<'_>> {
        self.columns
            .iter()
            .map(|column| {
                let sortable = column.is_sortable();
                HeaderView {
                    key: &column.key,
                    label: &column.header,
                    align: column.align,
                    sortable,
                    sorted: (sortable && self.sort.is_sorted_by(&column.key))
                        .then_some(self.sort.direction),
                }
            })
            .collect()
    }

    fn render_row<'a>(&self, number: usize, record: &'a R) -> RowView<'a, R> {
        let cells = self
            .columns
            .iter()
            .map(|column| {
                let cell = column.render(record);
                if let Err(e) = &cell {
                    log::warn!("row {} column '{}': {}", number, column.key, e);
                }
                cell
            })
            .collect();
        let actions = self.actions.as_ref().map(|render| {
            let cell = render(record);
            if let Err(e) = &cell {
                log::warn!("row {} actions: {}", number, e);
            }
            cell
        });
        RowView {
            number,
            record,
            cells,
            actions,
        }
    }

    /// Run the pipeline and lay out the current page.
    pub fn view(&self) -> TableView<'_, R> {
        let state = self.state();
        let diagnostic = sanitize(&self.source).diagnostic;
        let ordered = self.ordered();
        let page = match self.paging {
            Paging::Local => paginate(ordered.len(), self.current_page, self.page_size),
            Paging::Remote { total_pages } => {
                paginate_remote(ordered.len(), self.current_page, total_pages, self.page_size)
            }
        };
        let errored = state == ViewState::Errored;
        let loading = state == ViewState::Loading;
        let nav = PageNav::new(&page, loading, errored);
        let pager_visible = !loading && !errored && page.total_pages > 1;

        let rows: Vec<RowView<'_, R>> = if matches!(state, ViewState::Ready) {
            page.slice(&ordered)
                .iter()
                .enumerate()
                .map(|(i, record)| self.render_row(page.row_number(i), *record))
                .collect()
        } else {
            Vec::new()
        };

        let message = match state {
            ViewState::Errored => self
                .error
                .clone()
                .or_else(|| diagnostic.map(|d| d.to_string())),
            ViewState::Ready if rows.is_empty() => Some(if self.is_filtering() {
                NO_MATCHES_MESSAGE.to_string()
            } else {
                Diagnostic::NoData.to_string()
            }),
            _ => None,
        };

        TableView {
            state,
            headers: self.headers(),
            rows,
            skeleton_rows: if loading { self.page_size } else { 0 },
            page,
            nav,
            page_numbers: page_window(page.current_page, page.total_pages, PAGE_WINDOW),
            pager_visible,
            message,
            diagnostic,
        }
    }
}
