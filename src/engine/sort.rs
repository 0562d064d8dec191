//! Type-aware ordering of records by one column.
//!
//! Each value is classified once by running [`DETECTORS`] in order; the first
//! detector that accepts the value produces its [`SortKey`]. Keys of the same
//! kind compare by their typed payload, keys of different kinds compare by
//! detector order. Null (or missing) values sort first ascending and last
//! descending. The comparator is a total order, so sorting always completes.

use chrono::NaiveDateTime;
use std::cmp::Ordering;

use super::value::{parse_datetime, Record, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Mirror an ascending ordering for descending sorts.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Asc),
            "desc" | "descending" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Active sort column (by column key) and direction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: Some(column.into()),
            direction,
        }
    }

    pub fn is_sorted_by(&self, key: &str) -> bool {
        self.column.as_deref() == Some(key)
    }

    /// Header click: the current column flips direction, any other column
    /// becomes the sort column ascending.
    pub fn toggle(&mut self, key: &str) {
        if self.is_sorted_by(key) {
            self.direction = self.direction.toggled();
        } else {
            self.column = Some(key.to_string());
            self.direction = SortDirection::Asc;
        }
    }

    /// Parse `key` or `key:asc` / `key:desc`.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }
        match spec.rsplit_once(':') {
            Some((key, dir)) => {
                let direction = SortDirection::parse(dir)?;
                Some(Self::new(key.trim(), direction))
            }
            None => Some(Self::new(spec, SortDirection::Asc)),
        }
    }
}

/// Value classifications, tried in the order of [`DETECTORS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    /// Date values and strings that parse as dates.
    Date,
    /// Finite numbers and strings that parse as finite numbers.
    Number,
    /// Any other string.
    Text,
    /// Everything else, compared by display text.
    Other,
}

pub const DETECTORS: [ValueKind; 4] = [
    ValueKind::Date,
    ValueKind::Number,
    ValueKind::Text,
    ValueKind::Other,
];

impl ValueKind {
    /// Produce a key when this detector accepts `value`.
    pub fn detect(self, value: &Value) -> Option<SortKey> {
        match (self, value) {
            (_, Value::Null) => None,
            (ValueKind::Date, Value::Date(dt)) => Some(SortKey::Date(*dt)),
            (ValueKind::Date, Value::Text(s)) => parse_datetime(s).map(SortKey::Date),
            (ValueKind::Number, Value::Number(n)) if n.is_finite() => Some(SortKey::Number(*n)),
            (ValueKind::Number, Value::Text(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(SortKey::Number),
            (ValueKind::Text, Value::Text(s)) => Some(SortKey::Text(s.clone())),
            (ValueKind::Other, other) => Some(SortKey::Other(other.display_text())),
            _ => None,
        }
    }
}

/// Comparable form of one cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Date(NaiveDateTime),
    Number(f64),
    Text(String),
    Other(String),
}

impl SortKey {
    pub fn kind(&self) -> ValueKind {
        match self {
            SortKey::Date(_) => ValueKind::Date,
            SortKey::Number(_) => ValueKind::Number,
            SortKey::Text(_) => ValueKind::Text,
            SortKey::Other(_) => ValueKind::Other,
        }
    }

    /// Ascending comparison.
    pub fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
            // NaN never gets here; an incomparable pair counts as equal.
            (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortKey::Text(a), SortKey::Text(b)) | (SortKey::Other(a), SortKey::Other(b)) => {
                collate(a, b)
            }
            // Mixed kinds group by detector so the comparison stays a total order.
            (a, b) => a.kind().cmp(&b.kind()),
        }
    }
}

/// Classify a value; `None` for null.
pub fn sort_key(value: &Value) -> Option<SortKey> {
    DETECTORS.iter().find_map(|kind| kind.detect(value))
}

/// Case-insensitive comparison with a case-sensitive tie break.
pub fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Compare optional keys with nulls first, then mirror for descending.
pub fn compare_keys(a: Option<&SortKey>, b: Option<&SortKey>, direction: SortDirection) -> Ordering {
    let ascending = match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.compare(b),
    };
    direction.apply(ascending)
}

pub fn compare_values(a: &Value, b: &Value, direction: SortDirection) -> Ordering {
    compare_keys(sort_key(a).as_ref(), sort_key(b).as_ref(), direction)
}

/// Stable sort of `records` by the value under `field`.
pub fn sort_records<'a, R: Record>(
    records: Vec<&'a R>,
    field: &str,
    direction: SortDirection,
) -> Vec<&'a R> {
    let mut keyed: Vec<(Option<SortKey>, &'a R)> = records
        .into_iter()
        .map(|record| (record.field(field).as_ref().and_then(sort_key), record))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a.as_ref(), b.as_ref(), direction));
    keyed.into_iter().map(|(_, record)| record).collect()
}
