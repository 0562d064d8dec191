//! Inclusive calendar-day range filter over one designated date field.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::value::{parse_date, Record, Value};

/// Start/end bounds picked by the user. Either may be unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Active once either bound is set; clearing both deactivates it.
    pub fn is_active(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    pub fn set_start(&mut self, start: Option<NaiveDate>) {
        self.start = start;
    }

    pub fn set_end(&mut self, end: Option<NaiveDate>) {
        self.end = end;
    }

    /// Set a bound from user text. Empty text unsets it. Returns false and
    /// leaves the bound untouched when the text is not a date.
    pub fn set_start_str(&mut self, text: &str) -> bool {
        match parse_bound(text) {
            Some(bound) => {
                self.start = bound;
                true
            }
            None => false,
        }
    }

    pub fn set_end_str(&mut self, text: &str) -> bool {
        match parse_bound(text) {
            Some(bound) => {
                self.end = bound;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.start = None;
        self.end = None;
    }

    /// Start bound at midnight.
    pub fn lower(&self) -> Option<NaiveDateTime> {
        self.start.map(|d| d.and_time(NaiveTime::MIN))
    }

    /// End bound widened to 23:59:59.999 so the whole end day is included.
    pub fn upper(&self) -> Option<NaiveDateTime> {
        self.end.and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        if let Some(lower) = self.lower() {
            if at < lower {
                return false;
            }
        }
        if let Some(upper) = self.upper() {
            if at > upper {
                return false;
            }
        }
        true
    }
}

/// `Some(None)` for empty text, `Some(Some(date))` for a date, `None` otherwise.
fn parse_bound(text: &str) -> Option<Option<NaiveDate>> {
    let text = text.trim();
    if text.is_empty() {
        return Some(None);
    }
    parse_date(text).map(Some)
}

/// Why a record was left out by the date filter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DateSkip {
    #[error("no value for '{0}'")]
    Missing(String),
    #[error("'{value}' in '{key}' is not a date")]
    Unparseable { key: String, value: String },
}

/// Resolve the date stored under `key` in `record`.
pub fn record_date<R: Record>(record: &R, key: &str) -> Result<NaiveDateTime, DateSkip> {
    match record.field(key) {
        None | Some(Value::Null) => Err(DateSkip::Missing(key.to_string())),
        Some(value) => value.as_datetime().ok_or_else(|| DateSkip::Unparseable {
            key: key.to_string(),
            value: value.display_text(),
        }),
    }
}

/// Keep records whose `date_key` value falls inside `range`.
///
/// Identity unless a key is configured and the range is active. Records
/// with a missing or unparseable date are excluded; the rest are unaffected.
pub fn filter_by_date<'a, R: Record>(
    records: Vec<&'a R>,
    date_key: Option<&str>,
    range: &DateRange,
) -> Vec<&'a R> {
    let key = match date_key {
        Some(key) if range.is_active() => key,
        _ => return records,
    };

    records
        .into_iter()
        .enumerate()
        .filter(|(index, record)| match record_date(*record, key) {
            Ok(at) => range.contains(at),
            Err(skip) => {
                log::debug!("date filter excluded record {}: {}", index, skip);
                false
            }
        })
        .map(|(_, record)| record)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn january() -> Vec<serde_json::Value> {
        (1..=10)
            .map(|d| json!({"id": d, "created": format!("2024-01-{:02}T{:02}:00:00", d, d)}))
            .collect()
    }

    #[test]
    fn test_inactive_range_is_identity() {
        let rows = january();
        let refs: Vec<_> = rows.iter().collect();
        let out = filter_by_date(refs.clone(), Some("created"), &DateRange::default());
        assert_eq!(out, refs);
        let range = DateRange::new(Some(day(5)), None);
        assert_eq!(filter_by_date(refs.clone(), None, &range), refs);
    }

    #[test]
    fn test_single_day_range_includes_whole_day() {
        let rows = january();
        let range = DateRange::new(Some(day(5)), Some(day(5)));
        let out = filter_by_date(rows.iter().collect(), Some("created"), &range);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["id"], json!(5));
    }

    #[test]
    fn test_end_of_day_boundary() {
        let rows = vec![
            json!({"at": "2024-01-05T23:59:59.999"}),
            json!({"at": "2024-01-06T00:00:00"}),
        ];
        let range = DateRange::new(None, Some(day(5)));
        let out = filter_by_date(rows.iter().collect(), Some("at"), &range);
        assert_eq!(out, vec![&rows[0]]);
    }

    #[test]
    fn test_bad_dates_excluded_without_affecting_others() {
        let rows = vec![
            json!({"at": "2024-01-03"}),
            json!({"at": "not-a-date"}),
            json!({"at": null}),
            json!({}),
            json!({"at": 1_704_412_800_000_i64}),
        ];
        let range = DateRange::new(Some(day(1)), Some(day(10)));
        let out = filter_by_date(rows.iter().collect(), Some("at"), &range);
        assert_eq!(out, vec![&rows[0], &rows[4]]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let rows = january();
        let range = DateRange::new(Some(day(3)), Some(day(7)));
        let once = filter_by_date(rows.iter().collect(), Some("created"), &range);
        let twice = filter_by_date(once.clone(), Some("created"), &range);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 5);
    }

    #[test]
    fn test_range_text_bounds() {
        let mut range = DateRange::default();
        assert!(!range.is_active());
        assert!(range.set_start_str("2024-01-02"));
        assert!(range.is_active());
        assert!(!range.set_end_str("tomorrow"));
        assert_eq!(range.end, None);
        assert!(range.set_start_str(""));
        assert!(!range.is_active());
    }

    #[test]
    fn test_record_date_reasons() {
        assert_eq!(
            record_date(&json!({}), "at"),
            Err(DateSkip::Missing("at".into()))
        );
        assert!(matches!(
            record_date(&json!({"at": "soon"}), "at"),
            Err(DateSkip::Unparseable { .. })
        ));
    }
}
