use ratatui::style::Color;
use std::fs;
use tabula::config::{rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ColorParser, ConfigManager, Theme};
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

fn write_config(manager: &ConfigManager, content: &str) {
    manager.ensure_config_dir().unwrap();
    fs::write(manager.config_path("config.toml"), content).unwrap();
}

// Helper to ensure NO_COLOR is not set for color parsing tests
fn ensure_colors_enabled() {
    std::env::remove_var("NO_COLOR");
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();
    assert_eq!(config.version, "0.1");
    assert_eq!(config.table.page_size, 10);
    assert_eq!(config.table.search_placeholder, "Search...");
    assert_eq!(config.table.date_filter_label, "Filter by date");
    assert!(!config.table.show_row_numbers);
    assert!(config.table.columns.is_empty());
    assert!(config.table.date_key.is_none());
    assert!(!config.debug.enabled);
    assert_eq!(config.debug.log_level, "warn");
    assert_eq!(config.debug.level_filter().unwrap(), log::LevelFilter::Warn);
}

#[test]
fn test_shipped_template_parses_and_validates() {
    ensure_colors_enabled();
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let template = config_manager.generate_default_config();
    assert!(template.contains("[table]"));
    assert!(template.contains("[theme.colors]"));
    assert!(template.contains("[debug]"));
    assert!(template.contains("version = \"0.1\""));

    let parsed: AppConfig = toml::from_str(&template).unwrap();
    parsed.validate().unwrap();
    assert_eq!(parsed.table.page_size, AppConfig::default().table.page_size);
}

#[test]
fn test_write_default_config_respects_force() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config_path = config_manager
        .write_default_config(false)
        .expect("Failed to write config");
    assert!(config_path.exists());

    fs::write(&config_path, "# edited").unwrap();
    let err = config_manager.write_default_config(false).unwrap_err();
    assert!(err.to_string().contains("--force"));
    assert_eq!(fs::read_to_string(&config_path).unwrap(), "# edited");

    config_manager.write_default_config(true).unwrap();
    assert!(fs::read_to_string(&config_path).unwrap().contains("[table]"));
}

#[test]
fn test_load_config_with_no_file() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.table.page_size, 10);
}

#[test]
fn test_user_file_merges_over_defaults() {
    ensure_colors_enabled();
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_config(
        &config_manager,
        r##"
[table]
page_size = 25
date_key = "created_at"
columns = ["id", "name={first} {last}"]
actions = "open #{id}"

[theme.colors]
primary = "#ff8800"
"##,
    );

    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.table.page_size, 25);
    assert_eq!(config.table.date_key.as_deref(), Some("created_at"));
    assert_eq!(config.table.columns.len(), 2);
    assert_eq!(config.table.actions.as_deref(), Some("open #{id}"));
    assert_eq!(config.theme.colors.primary, "#ff8800");
    // Untouched sections keep their defaults
    assert_eq!(config.table.search_placeholder, "Search...");
    assert_eq!(config.theme.colors.error, "red");
    assert_eq!(config.debug.log_level, "warn");
}

#[test]
fn test_labels_come_from_table_section() {
    let mut config = AppConfig::default();
    config.table.error_message = "Could not load users".into();
    let labels = config.labels();
    assert_eq!(labels.error_message, "Could not load users");
    assert_eq!(labels.search_placeholder, "Search...");
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut config = AppConfig::default();
    config.version = "9.0".into();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.table.page_size = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.debug.log_level = "chatty".into();
    assert!(config.validate().is_err());

    ensure_colors_enabled();
    let mut config = AppConfig::default();
    config.theme.colors.table_border = "not_a_color".into();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Unknown color name"));
}

#[test]
fn test_malformed_file_is_an_error() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_config(&config_manager, "[table\npage_size = ");
    let err = AppConfig::load_from(&config_manager).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_parse_colors() {
    ensure_colors_enabled();
    let parser = ColorParser::new();
    assert_eq!(parser.parse("red").unwrap(), Color::Red);
    assert_eq!(parser.parse("  CYAN ").unwrap(), Color::Cyan);
    assert_eq!(parser.parse("bright_blue").unwrap(), Color::Indexed(12));
    assert_eq!(parser.parse("dark gray").unwrap(), Color::Indexed(8));
    assert_eq!(parser.parse("indexed(236)").unwrap(), Color::Indexed(236));
    assert_eq!(parser.parse("reversed").unwrap(), Color::Reset);
    assert!(parser.parse("indexed(300)").is_err());
    assert!(parser.parse("#12345").is_err());
    assert!(parser.parse("#gg0000").is_err());
    assert!(parser.parse("mauve").is_err());
}

#[test]
fn test_rgb_conversions() {
    assert_eq!(rgb_to_256_color(0, 0, 0), 16);
    assert_eq!(rgb_to_256_color(255, 255, 255), 231);
    assert_eq!(rgb_to_256_color(255, 0, 0), 196);
    assert_eq!(rgb_to_basic_ansi(200, 10, 10), Color::Red);
    assert_eq!(rgb_to_basic_ansi(20, 20, 20), Color::Black);
    assert_eq!(rgb_to_basic_ansi(220, 220, 220), Color::White);
}

#[test]
fn test_theme_from_config() {
    ensure_colors_enabled();
    let theme = Theme::from_config(&AppConfig::default().theme).unwrap();
    assert_eq!(theme.get("error"), Color::Red);
    assert_eq!(theme.get("controls_bg"), Color::Indexed(236));
    assert_eq!(theme.get("unknown_color"), Color::Reset);
    assert!(theme.get_optional("table_selected").is_some());
    assert!(theme.get_optional("unknown_color").is_none());
}
