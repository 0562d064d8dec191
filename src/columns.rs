//! Column specs from the command line and config.
//!
//! A spec is `field`, `field=Label`, or `key=template` where the template
//! holds `{field}` placeholders filled from each record.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use regex::Regex;
use serde_json::Value as Json;
use std::sync::{Arc, OnceLock};

use crate::engine::{Column, Record, RenderError, Rendered};

fn placeholder_regex() -> Result<&'static Regex, &'static regex::Error> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]+)\}")).as_ref()
}

/// A text template with `{field}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Template {
    /// Parse `source`. At least one placeholder is required.
    pub fn parse(source: &str) -> Result<Self> {
        let re = placeholder_regex().map_err(|e| eyre!("placeholder pattern: {}", e))?;
        if re.find(source).is_none() {
            return Err(eyre!("template '{}' has no {{field}} placeholders", source));
        }
        Ok(Self {
            source: source.to_string(),
        })
    }

    pub fn is_template(source: &str) -> bool {
        placeholder_regex().is_ok_and(|re| re.is_match(source))
    }

    pub fn fields(&self) -> Vec<&str> {
        let Ok(re) = placeholder_regex() else {
            return Vec::new();
        };
        re.captures_iter(&self.source)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .collect()
    }

    /// Fill placeholders from `record`. Null fields render empty; a field the
    /// record does not have at all fails the cell.
    pub fn render<R: Record>(&self, column: &str, record: &R) -> Result<Rendered, RenderError> {
        let re = placeholder_regex().map_err(|e| RenderError::renderer(column, e.to_string()))?;
        let mut out = String::with_capacity(self.source.len());
        let mut last = 0;
        for caps in re.captures_iter(&self.source) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&self.source[last..whole.start()]);
            let name = name.as_str().trim();
            match record.field(name) {
                Some(value) => out.push_str(&value.display_text()),
                None => {
                    return Err(RenderError::renderer(
                        column,
                        format!("record has no field '{}'", name),
                    ))
                }
            }
            last = whole.end();
        }
        out.push_str(&self.source[last..]);
        Ok(Rendered::Text(out))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSpec {
    Field { field: String, label: Option<String> },
    Computed { key: String, template: Template },
}

impl ColumnSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(eyre!("empty column spec"));
        }
        match spec.split_once('=') {
            None => Ok(ColumnSpec::Field {
                field: spec.to_string(),
                label: None,
            }),
            Some((key, rest)) => {
                let key = key.trim();
                if key.is_empty() {
                    return Err(eyre!("column spec '{}' has no field name", spec));
                }
                if Template::is_template(rest) {
                    Ok(ColumnSpec::Computed {
                        key: key.to_string(),
                        template: Template::parse(rest)?,
                    })
                } else {
                    Ok(ColumnSpec::Field {
                        field: key.to_string(),
                        label: Some(rest.trim().to_string()).filter(|l| !l.is_empty()),
                    })
                }
            }
        }
    }

    pub fn key(&self) -> &str {
        match self {
            ColumnSpec::Field { field, .. } => field,
            ColumnSpec::Computed { key, .. } => key,
        }
    }

    pub fn into_column<R: Record + 'static>(self) -> Column<R> {
        match self {
            ColumnSpec::Field { field, label } => {
                let column = Column::field(field);
                match label {
                    Some(label) => column.with_header(label),
                    None => column,
                }
            }
            ColumnSpec::Computed { key, template } => {
                let template = Arc::new(template);
                let name = key.clone();
                Column::computed(key, move |record: &R| template.render(&name, record))
            }
        }
    }
}

/// Column list for a JSON table.
///
/// Explicit `specs` win; otherwise the keys of `first` are used. A first
/// record that is not an object yields a single column showing the whole
/// record.
pub fn build_columns(specs: &[String], no_search: &[String], first: Option<&Json>) -> Result<Vec<Column<Json>>> {
    let mut columns: Vec<Column<Json>> = if specs.is_empty() {
        infer_columns(first)
    } else {
        specs
            .iter()
            .map(|s| ColumnSpec::parse(s).map(ColumnSpec::into_column))
            .collect::<Result<_>>()?
    };
    for column in columns.iter_mut() {
        if no_search.iter().any(|n| n == &column.key) {
            column.searchable = false;
        }
    }
    Ok(columns)
}

fn infer_columns(first: Option<&Json>) -> Vec<Column<Json>> {
    match first {
        Some(Json::Object(map)) => map.keys().map(|k| Column::field(k.as_str())).collect(),
        Some(_) => vec![Column::computed("value", |record: &Json| {
            Ok(Rendered::Value(record.into()))
        })],
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cell_text;
    use serde_json::json;

    #[test]
    fn test_parse_specs() {
        assert_eq!(
            ColumnSpec::parse("email").unwrap(),
            ColumnSpec::Field {
                field: "email".into(),
                label: None
            }
        );
        assert_eq!(
            ColumnSpec::parse("email = E-mail").unwrap(),
            ColumnSpec::Field {
                field: "email".into(),
                label: Some("E-mail".into())
            }
        );
        let spec = ColumnSpec::parse("name={first} {last}").unwrap();
        assert_eq!(spec.key(), "name");
        assert!(matches!(spec, ColumnSpec::Computed { .. }));
        assert!(ColumnSpec::parse("=x").is_err());
        assert!(ColumnSpec::parse("  ").is_err());
    }

    #[test]
    fn test_template_render() {
        let template = Template::parse("{first} {last}").unwrap();
        assert_eq!(template.fields(), vec!["first", "last"]);
        let ok = template.render("name", &json!({"first": "Ada", "last": "Lovelace"}));
        assert_eq!(ok, Ok(Rendered::Text("Ada Lovelace".into())));
        let null = template.render("name", &json!({"first": "Ada", "last": null}));
        assert_eq!(null, Ok(Rendered::Text("Ada ".into())));
        assert!(template.render("name", &json!({"first": "Ada"})).is_err());
    }

    #[test]
    fn test_computed_columns_are_not_sortable() {
        let columns = build_columns(&["id".into(), "name={first} {last}".into()], &[], None).unwrap();
        assert!(columns[0].is_sortable());
        assert!(!columns[1].is_sortable());
        let cell = columns[1].render(&json!({"first": "A"}));
        assert_eq!(cell_text(&cell), "Error");
    }

    #[test]
    fn test_infer_from_first_record() {
        let first = json!({"b": 1, "a": 2});
        let columns = build_columns(&[], &["a".into()], Some(&first)).unwrap();
        let keys: Vec<_> = columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(!columns[0].searchable);
        assert!(columns[1].searchable);
    }

    #[test]
    fn test_infer_scalar_records() {
        let columns = build_columns(&[], &[], Some(&json!(5))).unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(cell_text(&columns[0].render(&json!("x"))), "x");
        assert!(build_columns(&[], &[], None).unwrap().is_empty());
    }
}
