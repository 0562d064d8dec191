//! Free-text search across the searchable columns of a table.

use super::column::Column;
use super::value::Record;

/// Normalized search term: trimmed and lowercased. `None` when blank.
pub fn normalize_term(term: &str) -> Option<String> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// True when any searchable column's text for `record` contains `needle`
/// (already lowercased). A column that fails to render counts as no match.
pub fn matches<R: Record>(record: &R, columns: &[Column<R>], needle: &str) -> bool {
    columns
        .iter()
        .filter(|c| c.searchable)
        .any(|c| match c.search_text(record) {
            Some(text) => text.to_lowercase().contains(needle),
            None => false,
        })
}

/// Keep records where at least one searchable column contains `term`,
/// case-insensitively. A blank term keeps everything.
pub fn filter_by_search<'a, R: Record>(
    records: Vec<&'a R>,
    columns: &[Column<R>],
    term: &str,
) -> Vec<&'a R> {
    let Some(needle) = normalize_term(term) else {
        return records;
    };
    records
        .into_iter()
        .filter(|record| matches(*record, columns, &needle))
        .collect()
}
