//! Dynamic cell values and the [`Record`] trait the engine reads rows through.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::{BTreeMap, HashMap};

/// A field value pulled out of a record.
///
/// Records are opaque to the engine; every read goes through [`Record::field`]
/// and lands in one of these variants. `Null` covers both an explicit null and,
/// by convention, a missing field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Text shown in a cell and matched by search. Null renders as empty.
    pub fn display_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Date(dt) => format_datetime(dt),
            Value::List(items) => items
                .iter()
                .map(Value::display_text)
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(map) => {
                let parts: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.display_text()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }

    /// Resolve this value to a point in time.
    ///
    /// Dates pass through, strings are parsed with [`parse_datetime`], numbers
    /// are epoch milliseconds. Anything else goes through its display text,
    /// which in practice never parses.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Null => None,
            Value::Date(dt) => Some(*dt),
            Value::Text(s) => parse_datetime(s),
            Value::Number(n) => datetime_from_millis(*n),
            other => parse_datetime(&other.display_text()),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => Value::Number(f),
                None => Value::Text(n.to_string()),
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Read access to one row of domain data.
///
/// `field` returns `None` when the record has no such attribute; the engine
/// treats that exactly like `Some(Value::Null)`.
pub trait Record {
    fn field(&self, key: &str) -> Option<Value>;
}

impl Record for serde_json::Value {
    fn field(&self, key: &str) -> Option<Value> {
        self.as_object()?.get(key).map(Value::from)
    }
}

impl Record for BTreeMap<String, Value> {
    fn field(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl Record for HashMap<String, Value> {
    fn field(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

/// Parses an ISO-style date or datetime string; tries FORMATS in order, then
/// RFC 3339 (converted to UTC), then bare dates at midnight.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    parse_date(s).map(|d| d.and_time(NaiveTime::MIN))
}

/// Parses a calendar day (`2024-01-05` or `2024/01/05`).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn datetime_from_millis(ms: f64) -> Option<NaiveDateTime> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms as i64).map(|dt| dt.naive_utc())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_record_field() {
        let record = json!({"name": "alice", "age": 31, "tags": ["a", "b"], "gone": null});
        assert_eq!(record.field("name"), Some(Value::Text("alice".into())));
        assert_eq!(record.field("age"), Some(Value::Number(31.0)));
        assert_eq!(record.field("gone"), Some(Value::Null));
        assert_eq!(record.field("missing"), None);
        assert_eq!(record.field("tags").unwrap().display_text(), "a,b");
    }

    #[test]
    fn test_non_object_record_has_no_fields() {
        assert_eq!(json!(42).field("anything"), None);
        assert_eq!(json!([1, 2]).field("0"), None);
    }

    #[test]
    fn test_display_text() {
        assert_eq!(Value::Null.display_text(), "");
        assert_eq!(Value::Number(10.0).display_text(), "10");
        assert_eq!(Value::Number(2.5).display_text(), "2.5");
        assert_eq!(Value::Bool(false).display_text(), "false");
        let dt = parse_datetime("2024-01-05").unwrap();
        assert_eq!(Value::Date(dt).display_text(), "2024-01-05");
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(13, 30, 0)
            .unwrap();
        assert_eq!(parse_datetime("2024-01-05T13:30:00"), Some(expected));
        assert_eq!(parse_datetime("2024-01-05 13:30"), Some(expected));
        assert_eq!(parse_datetime("2024-01-05T13:30:00Z"), Some(expected));
        assert_eq!(parse_datetime("2024-01-05T15:30:00+02:00"), Some(expected));
        assert!(parse_datetime("2024-01-05").is_some());
        assert!(parse_datetime("not-a-date").is_none());
        assert!(parse_datetime("10").is_none());
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn test_as_datetime_from_millis() {
        let value = Value::Number(1_704_412_800_000.0); // 2024-01-05T00:00:00Z
        assert_eq!(
            value.as_datetime(),
            Some(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap().and_time(NaiveTime::MIN))
        );
        assert_eq!(Value::Number(f64::NAN).as_datetime(), None);
        assert_eq!(Value::Bool(true).as_datetime(), None);
    }
}
