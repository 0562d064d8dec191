//! Shared CLI definitions for tabula.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser};

/// Command-line arguments for tabula
#[derive(Clone, Parser, Debug, Default)]
#[command(
    name = "tabula",
    version,
    about = "Searchable, sortable, paginated tables in the terminal",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    /// Path to a JSON file: an array of records or {"items": [...], "totalPages": N}
    /// (not required with --generate-config)
    #[arg(required_unless_present = "generate_config", value_name = "PATH")]
    pub path: Option<std::path::PathBuf>,

    /// Columns to show, in order. Each is FIELD, FIELD=Label, or KEY={a} {b} for a computed column
    #[arg(long = "columns", value_name = "SPEC", num_args = 1..)]
    pub columns: Vec<String>,

    /// Rows per page (default: 10, or [table] page_size from config)
    #[arg(long = "page-size", value_name = "N")]
    pub page_size: Option<usize>,

    /// Initial sort as KEY or KEY:asc / KEY:desc
    #[arg(long = "sort", value_name = "KEY[:DIR]")]
    pub sort: Option<String>,

    /// Initial search term
    #[arg(long = "search", value_name = "TERM")]
    pub search: Option<String>,

    /// Field holding each record's date; enables the date range filter
    #[arg(long = "date-key", value_name = "FIELD")]
    pub date_key: Option<String>,

    /// Start of the date range (YYYY-MM-DD, inclusive)
    #[arg(long = "from", value_name = "DATE", requires = "date_key")]
    pub from: Option<String>,

    /// End of the date range (YYYY-MM-DD, inclusive of the whole day)
    #[arg(long = "to", value_name = "DATE", requires = "date_key")]
    pub to: Option<String>,

    /// Exclude a column from search. Use once per column
    #[arg(long = "no-search", value_name = "COL")]
    pub no_search: Vec<String>,

    /// Display row numbers on the left side of the table
    #[arg(long = "row-numbers", action)]
    pub row_numbers: bool,

    /// Write the filtered and sorted records as JSON to this path and exit
    #[arg(long = "export", value_name = "PATH")]
    pub export: Option<std::path::PathBuf>,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Generate default configuration file at ~/.config/tabula/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn value_placeholder(arg: &clap::Arg) -> String {
    arg.get_value_names()
        .map(|names| {
            names
                .iter()
                .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    out.push_str(&cmd.render_usage().to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let option_str = if arg.is_positional() {
            let placeholder = value_placeholder(arg);
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            let placeholder = if arg.get_action().takes_values() {
                value_placeholder(arg)
            } else {
                String::new()
            };
            if placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}
