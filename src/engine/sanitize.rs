//! First pipeline stage: turn whatever the upstream fetch produced into a
//! slice of records that is always safe to render.

/// Incoming collection as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Source<R> {
    /// Nothing was provided (fetch not finished, or returned nothing).
    Absent,
    /// Something was provided but it is not a sequence of records.
    Invalid { found: &'static str },
    Records(Vec<R>),
}

impl<R> Default for Source<R> {
    fn default() -> Self {
        Source::Absent
    }
}

impl<R> From<Vec<R>> for Source<R> {
    fn from(records: Vec<R>) -> Self {
        Source::Records(records)
    }
}

impl<R> From<Option<Vec<R>>> for Source<R> {
    fn from(records: Option<Vec<R>>) -> Self {
        records.map(Source::Records).unwrap_or(Source::Absent)
    }
}

impl Source<serde_json::Value> {
    /// Classify a loosely typed JSON payload. Arrays are records; anything
    /// else is invalid. A JSON `null` counts as absent.
    pub fn from_json(value: Option<serde_json::Value>) -> Self {
        match value {
            None | Some(serde_json::Value::Null) => Source::Absent,
            Some(serde_json::Value::Array(items)) => Source::Records(items),
            Some(other) => Source::Invalid {
                found: json_type_name(&other),
            },
        }
    }
}

/// Why the sanitizer substituted an empty collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Diagnostic {
    #[error("No data available")]
    NoData,
    #[error("Invalid data format")]
    InvalidFormat,
}

/// Records plus the diagnostic explaining an empty substitution, if any.
#[derive(Debug, PartialEq)]
pub struct Sanitized<'a, R> {
    pub records: &'a [R],
    pub diagnostic: Option<Diagnostic>,
}

pub fn sanitize<R>(source: &Source<R>) -> Sanitized<'_, R> {
    match source {
        Source::Absent => {
            log::debug!("sanitize: no data provided");
            Sanitized {
                records: &[],
                diagnostic: Some(Diagnostic::NoData),
            }
        }
        Source::Invalid { found } => {
            log::warn!("sanitize: expected a sequence of records, found {}", found);
            Sanitized {
                records: &[],
                diagnostic: Some(Diagnostic::InvalidFormat),
            }
        }
        Source::Records(records) => Sanitized {
            records,
            diagnostic: None,
        },
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_input() {
        for input in [None, Some(json!(null))] {
            let source = Source::from_json(input);
            let out = sanitize(&source);
            assert!(out.records.is_empty());
            assert_eq!(out.diagnostic, Some(Diagnostic::NoData));
        }
    }

    #[test]
    fn test_non_sequence_inputs() {
        for input in [json!({"items": []}), json!(3), json!("rows"), json!(true)] {
            let source = Source::from_json(Some(input));
            let out = sanitize(&source);
            assert!(out.records.is_empty());
            assert_eq!(out.diagnostic, Some(Diagnostic::InvalidFormat));
        }
    }

    #[test]
    fn test_sequence_passes_through() {
        let rows = vec![json!({"a": 1}), json!(null), json!({"a": 2})];
        let source = Source::from_json(Some(serde_json::Value::Array(rows.clone())));
        let out = sanitize(&source);
        assert_eq!(out.records, rows.as_slice());
        assert_eq!(out.diagnostic, None);

        let empty: Source<serde_json::Value> = Source::from(Vec::new());
        let out = sanitize(&empty);
        assert!(out.records.is_empty());
        assert_eq!(out.diagnostic, None);
    }

    #[test]
    fn test_diagnostic_messages() {
        assert_eq!(Diagnostic::NoData.to_string(), "No data available");
        assert_eq!(Diagnostic::InvalidFormat.to_string(), "Invalid data format");
    }
}
