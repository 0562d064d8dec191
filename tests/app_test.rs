use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use serde_json::json;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;
use tabula::engine::{SortDirection, ViewState};
use tabula::source::Payload;
use tabula::{App, AppConfig, AppEvent, Args, InputMode, TableOptions};

mod common;

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        app.event(&key(KeyCode::Char(c)));
    }
}

/// Feed everything the app and its loader threads send back into the app.
fn pump(app: &mut App, rx: &Receiver<AppEvent>) {
    while let Ok(event) = rx.recv_timeout(Duration::from_millis(500)) {
        if let Some(next) = app.event(&event) {
            app.event(&next);
        }
    }
}

fn options(configure: impl FnOnce(&mut Args)) -> TableOptions {
    let mut args = Args::default();
    configure(&mut args);
    TableOptions::from_args_and_config(&args, &AppConfig::default()).unwrap()
}

fn loaded_app(options: TableOptions, records: usize) -> (App, Receiver<AppEvent>) {
    let (tx, rx) = mpsc::channel();
    let mut app = App::new_with_config(tx, Default::default(), options);
    app.event(&AppEvent::Loaded(Payload::Records(common::people(records))));
    (app, rx)
}

#[test]
fn test_app_creation() {
    let (tx, _) = mpsc::channel();
    let app = App::new(tx);
    assert_eq!(app.input_mode, InputMode::Normal);
    assert_eq!(app.table().state(), ViewState::Idle);
}

#[test]
fn test_columns_inferred_from_first_record() {
    let (app, _rx) = loaded_app(TableOptions::default(), 3);
    let keys: Vec<&str> = app.table().columns().iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["created", "id", "name", "role", "score"]);
    assert_eq!(app.table().state(), ViewState::Ready);
}

#[test]
fn test_paging_keys_and_callback() {
    let (mut app, rx) = loaded_app(TableOptions::default(), 25);
    app.event(&key(KeyCode::Char('n')));
    assert_eq!(app.table().current_page(), 2);
    app.event(&key(KeyCode::End));
    assert_eq!(app.table().current_page(), 3);
    app.event(&key(KeyCode::PageUp));
    assert_eq!(app.table().current_page(), 2);
    app.event(&key(KeyCode::Home));
    assert_eq!(app.table().current_page(), 1);

    let pages: Vec<usize> = rx
        .try_iter()
        .filter_map(|e| match e {
            AppEvent::PageRequested(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(pages, vec![2, 3, 2, 1]);
}

#[test]
fn test_search_is_applied_per_keystroke() {
    let (mut app, rx) = loaded_app(TableOptions::default(), 25);
    app.event(&key(KeyCode::Char('n')));
    app.event(&key(KeyCode::Char('/')));
    assert_eq!(app.input_mode, InputMode::Search);
    type_text(&mut app, "adm");
    assert_eq!(app.table().search_term(), "adm");
    assert_eq!(app.table().current_page(), 1);
    type_text(&mut app, "in");
    app.event(&key(KeyCode::Enter));
    assert_eq!(app.input_mode, InputMode::Normal);
    assert_eq!(app.table().filtered().len(), 12);

    pump(&mut app, &rx);
    assert_eq!(app.filtered_count(), Some(12));

    // Letters typed while searching are not commands
    app.event(&key(KeyCode::Char('/')));
    app.event(&key(KeyCode::Char('q')));
    assert_eq!(app.table().search_term(), "adminq");
    app.event(&key(KeyCode::Esc));
    assert_eq!(app.input_mode, InputMode::Normal);
}

#[test]
fn test_sort_focused_header() {
    let (mut app, _rx) = loaded_app(TableOptions::default(), 5);
    app.event(&key(KeyCode::Right));
    assert_eq!(app.focused_column(), 1);
    app.event(&key(KeyCode::Char('s')));
    assert!(app.table().sort_state().is_sorted_by("id"));
    assert_eq!(app.table().sort_state().direction, SortDirection::Asc);
    app.event(&key(KeyCode::Char('s')));
    assert_eq!(app.table().sort_state().direction, SortDirection::Desc);
    assert_eq!(app.table().ordered()[0]["id"], json!(5));
}

#[test]
fn test_computed_column_refuses_sort() {
    let opts = options(|a| a.columns = vec!["id".into(), "label={name} ({role})".into()]);
    let (mut app, _rx) = loaded_app(opts, 5);
    app.event(&key(KeyCode::Char('l')));
    app.event(&key(KeyCode::Char('s')));
    assert_eq!(app.table().sort_state().column, None);
    assert!(app.status().is_some_and(|s| s.contains("not sortable")));
}

#[test]
fn test_date_range_inputs() {
    let opts = options(|a| a.date_key = Some("created".into()));
    let (mut app, _rx) = loaded_app(opts, 25);

    app.event(&key(KeyCode::Char('d')));
    assert_eq!(app.input_mode, InputMode::DateFrom);
    type_text(&mut app, "bad");
    app.event(&key(KeyCode::Enter));
    assert_eq!(app.input_mode, InputMode::DateFrom);
    assert!(app.status().is_some_and(|s| s.contains("Invalid date")));

    for _ in 0..3 {
        app.event(&key(KeyCode::Backspace));
    }
    type_text(&mut app, "2024-01-05");
    app.event(&key(KeyCode::Enter));
    assert_eq!(app.input_mode, InputMode::DateTo);
    type_text(&mut app, "2024-01-06");
    app.event(&key(KeyCode::Enter));
    assert_eq!(app.input_mode, InputMode::Normal);
    assert_eq!(app.table().filtered().len(), 2);

    app.event(&key(KeyCode::Char('c')));
    assert_eq!(app.table().filtered().len(), 25);
}

#[test]
fn test_date_input_needs_a_date_key() {
    let (mut app, _rx) = loaded_app(TableOptions::default(), 3);
    app.event(&key(KeyCode::Char('d')));
    assert_eq!(app.input_mode, InputMode::Normal);
    assert!(app.status().is_some());
}

#[test]
fn test_page_size_steps() {
    let (mut app, _rx) = loaded_app(TableOptions::default(), 60);
    app.event(&key(KeyCode::Char('+')));
    assert_eq!(app.table().page_size(), 25);
    assert_eq!(app.table().total_pages(), 3);
    app.event(&key(KeyCode::Char('-')));
    app.event(&key(KeyCode::Char('-')));
    assert_eq!(app.table().page_size(), 5);
    app.event(&key(KeyCode::Char('-')));
    assert_eq!(app.table().page_size(), 5);
}

#[test]
fn test_row_detail_and_help() {
    let (mut app, _rx) = loaded_app(TableOptions::default(), 3);
    app.event(&key(KeyCode::Enter));
    assert_eq!(app.input_mode, InputMode::Normal);
    app.event(&key(KeyCode::Down));
    app.event(&key(KeyCode::Down));
    assert_eq!(app.selected_row(), Some(1));
    app.event(&key(KeyCode::Enter));
    assert_eq!(app.input_mode, InputMode::Detail);
    app.event(&key(KeyCode::Esc));
    assert_eq!(app.input_mode, InputMode::Normal);

    app.event(&AppEvent::Key(KeyEvent::new(KeyCode::Char('h'), KeyModifiers::CONTROL)));
    assert!(app.show_help());
    app.event(&key(KeyCode::Char('q')));
    assert!(!app.show_help());
    assert!(matches!(app.event(&key(KeyCode::Char('q'))), Some(AppEvent::Exit)));
}

#[test]
fn test_load_failure_shows_error_row() {
    let (tx, _rx) = mpsc::channel();
    let mut app = App::new(tx);
    app.event(&AppEvent::LoadFailed("no such file".into()));
    let view = app.table().view();
    assert_eq!(view.state, ViewState::Errored);
    assert_eq!(view.message.as_deref(), Some("Failed to load data: no such file"));
}

#[test]
fn test_invalid_payload_is_errored() {
    let (mut app, _rx) = loaded_app(TableOptions::default(), 0);
    app.event(&AppEvent::Loaded(Payload::Other(json!({"rows": []}))));
    let view = app.table().view();
    assert_eq!(view.state, ViewState::Errored);
    assert_eq!(view.message.as_deref(), Some("Invalid data format"));
}

#[test]
fn test_open_loads_in_background() {
    let (_dir, path) = common::write_json("people.json", &json!(common::people(12)));
    let (tx, rx) = mpsc::channel();
    let mut app = App::new(tx);
    app.event(&AppEvent::Open(path));
    assert_eq!(app.table().state(), ViewState::Loading);
    pump(&mut app, &rx);
    assert_eq!(app.table().state(), ViewState::Ready);
    assert_eq!(app.table().total_pages(), 2);
}

#[test]
fn test_paged_files_refetch_on_page_change() {
    let dir = tempfile::TempDir::new().unwrap();
    let people = common::people(20);
    for (page, chunk) in people.chunks(10).enumerate() {
        let body = json!({"items": chunk, "totalPages": 2});
        std::fs::write(dir.path().join(format!("users-{}.json", page + 1)), body.to_string()).unwrap();
    }
    let (tx, rx) = mpsc::channel();
    let mut app = App::new(tx);
    app.event(&AppEvent::Open(dir.path().join("users-{page}.json")));
    pump(&mut app, &rx);
    assert_eq!(app.table().total_pages(), 2);
    assert_eq!(app.table().ordered()[0]["id"], json!(1));

    app.event(&key(KeyCode::Char('n')));
    pump(&mut app, &rx);
    let view = app.table().view();
    assert_eq!(view.state, ViewState::Ready);
    assert_eq!(view.page.current_page, 2);
    assert_eq!(view.rows[0].record["id"], json!(11));
    assert_eq!(view.rows[0].number, 11);
    assert_eq!(view.summary(), "Page 2 of 2");
}

#[test]
fn test_render_shows_summary_and_headers() {
    let (mut app, _rx) = loaded_app(TableOptions::default(), 25);
    let area = Rect::new(0, 0, 100, 20);
    let mut buf = Buffer::empty(area);
    (&mut app).render(area, &mut buf);
    let text: String = buf.content.iter().map(|c| c.symbol()).collect();
    assert!(text.contains("Showing 1 to 10 of 25"));
    assert!(text.contains("name"));
    assert!(text.contains("Search"));
}

#[test]
fn test_missing_page_file_can_be_left_and_retried() {
    let dir = tempfile::TempDir::new().unwrap();
    let people = common::people(30);
    let write_page = |page: usize| {
        let chunk = &people[(page - 1) * 10..page * 10];
        let body = json!({"items": chunk, "totalPages": 3});
        std::fs::write(dir.path().join(format!("users-{}.json", page)), body.to_string()).unwrap();
    };
    write_page(1);
    write_page(2);

    let (tx, rx) = mpsc::channel();
    let mut app = App::new(tx);
    app.event(&AppEvent::Open(dir.path().join("users-{page}.json")));
    pump(&mut app, &rx);

    app.event(&key(KeyCode::End));
    pump(&mut app, &rx);
    let view = app.table().view();
    assert_eq!(view.state, ViewState::Errored);
    assert!(view.message.is_some_and(|m| m.starts_with("Failed to load data")));

    // Paging away from the broken page still works
    app.event(&key(KeyCode::Char('p')));
    pump(&mut app, &rx);
    let view = app.table().view();
    assert_eq!(view.state, ViewState::Ready);
    assert_eq!(view.page.current_page, 2);
    assert_eq!(view.rows[0].record["id"], json!(11));

    // Once the file shows up a reload picks it up
    app.event(&key(KeyCode::End));
    pump(&mut app, &rx);
    assert_eq!(app.table().state(), ViewState::Errored);
    write_page(3);
    app.event(&key(KeyCode::Char('r')));
    pump(&mut app, &rx);
    let view = app.table().view();
    assert_eq!(view.state, ViewState::Ready);
    assert_eq!(view.page.current_page, 3);
    assert_eq!(view.rows[0].record["id"], json!(21));
}
