//! Column descriptors: how one column's value is pulled out of a record,
//! rendered, searched and sorted.

use std::fmt;
use std::sync::Arc;

use super::value::{Record, Value};

/// Failure while rendering a single cell. Contained to that cell.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// A computed accessor or action renderer reported a failure.
    #[error("renderer for '{column}' failed: {message}")]
    Renderer { column: String, message: String },

    /// A structured node had no text content to extract.
    #[error("node <{tag}> has no text content")]
    NoText { tag: String },
}

impl RenderError {
    pub fn renderer(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Renderer {
            column: column.into(),
            message: message.into(),
        }
    }
}

/// A structured rendering: a tagged node with optional text and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub tag: String,
    pub text: Option<String>,
    pub children: Vec<Rendered>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Rendered) -> Self {
        self.children.push(child);
        self
    }

    /// Primary text content: the node's own text, else the text of its
    /// children concatenated. Text-less children (icons, images) are skipped;
    /// a node with no text anywhere below it has nothing to extract.
    pub fn text_content(&self) -> Result<String, RenderError> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        let parts: Vec<String> = self
            .children
            .iter()
            .filter_map(|child| child.text_content().ok())
            .collect();
        if parts.is_empty() {
            return Err(RenderError::NoText {
                tag: self.tag.clone(),
            });
        }
        Ok(parts.concat())
    }
}

/// What a cell renders to.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Text(String),
    Value(Value),
    Node(Node),
}

impl Rendered {
    pub fn text_content(&self) -> Result<String, RenderError> {
        match self {
            Rendered::Text(s) => Ok(s.clone()),
            Rendered::Value(v) => Ok(v.display_text()),
            Rendered::Node(node) => node.text_content(),
        }
    }
}

impl From<&str> for Rendered {
    fn from(s: &str) -> Self {
        Rendered::Text(s.to_string())
    }
}

impl From<String> for Rendered {
    fn from(s: String) -> Self {
        Rendered::Text(s)
    }
}

impl From<Value> for Rendered {
    fn from(v: Value) -> Self {
        Rendered::Value(v)
    }
}

impl From<Node> for Rendered {
    fn from(n: Node) -> Self {
        Rendered::Node(n)
    }
}

/// Renderer signature shared by computed accessors and row actions.
pub type RenderFn<R> = Arc<dyn Fn(&R) -> Result<Rendered, RenderError> + Send + Sync>;

/// How a column reads its value.
///
/// Only `Field` columns have a stable underlying value, so only they can be
/// sorted by clicking the header.
pub enum Accessor<R> {
    Field(String),
    Computed(RenderFn<R>),
}

impl<R> Clone for Accessor<R> {
    fn clone(&self) -> Self {
        match self {
            Accessor::Field(name) => Accessor::Field(name.clone()),
            Accessor::Computed(f) => Accessor::Computed(Arc::clone(f)),
        }
    }
}

impl<R> fmt::Debug for Accessor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Accessor::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

pub struct Column<R> {
    pub key: String,
    pub header: String,
    pub accessor: Accessor<R>,
    pub align: Align,
    pub searchable: bool,
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            header: self.header.clone(),
            accessor: self.accessor.clone(),
            align: self.align,
            searchable: self.searchable,
        }
    }
}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("accessor", &self.accessor)
            .field("align", &self.align)
            .field("searchable", &self.searchable)
            .finish()
    }
}

impl<R: Record> Column<R> {
    /// A column reading `field` directly; key and header default to the field name.
    pub fn field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            key: field.clone(),
            header: field.clone(),
            accessor: Accessor::Field(field),
            align: Align::default(),
            searchable: true,
        }
    }

    pub fn computed<F>(key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&R) -> Result<Rendered, RenderError> + Send + Sync + 'static,
    {
        let key = key.into();
        Self {
            header: key.clone(),
            key,
            accessor: Accessor::Computed(Arc::new(f)),
            align: Align::default(),
            searchable: true,
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn with_searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    /// The field this column sorts by, if it has one.
    pub fn sort_field(&self) -> Option<&str> {
        match &self.accessor {
            Accessor::Field(name) => Some(name),
            Accessor::Computed(_) => None,
        }
    }

    pub fn is_sortable(&self) -> bool {
        self.sort_field().is_some()
    }

    /// Render one cell. Field columns never fail; null renders as empty text.
    pub fn render(&self, record: &R) -> Result<Rendered, RenderError> {
        match &self.accessor {
            Accessor::Field(name) => Ok(Rendered::Text(
                record
                    .field(name)
                    .map(|v| v.display_text())
                    .unwrap_or_default(),
            )),
            Accessor::Computed(f) => f(record),
        }
    }

    /// Text this column contributes to search, or `None` when rendering or
    /// text extraction failed for this record.
    pub fn search_text(&self, record: &R) -> Option<String> {
        match self.render(record).and_then(|r| r.text_content()) {
            Ok(text) => Some(text),
            Err(e) => {
                log::debug!("search skipped column '{}': {}", self.key, e);
                None
            }
        }
    }
}

/// Text shown in place of a cell whose renderer failed.
pub const ERROR_MARKER: &str = "Error";

/// Render a cell to display text, substituting [`ERROR_MARKER`] when the
/// renderer failed. A successful rendering without text shows as empty.
pub fn cell_text(result: &Result<Rendered, RenderError>) -> String {
    match result {
        Ok(rendered) => rendered.text_content().unwrap_or_default(),
        Err(_) => ERROR_MARKER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_column_renders_display_text() {
        let col: Column<serde_json::Value> = Column::field("age");
        assert_eq!(col.render(&json!({"age": 7})), Ok(Rendered::Text("7".into())));
        assert_eq!(col.render(&json!({"age": null})), Ok(Rendered::Text(String::new())));
        assert_eq!(col.render(&json!({})), Ok(Rendered::Text(String::new())));
        assert!(col.is_sortable());
    }

    #[test]
    fn test_computed_column_is_not_sortable() {
        let col: Column<serde_json::Value> =
            Column::computed("badge", |_| Ok(Rendered::from("x"))).with_header("Badge");
        assert!(!col.is_sortable());
        assert_eq!(col.sort_field(), None);
        assert_eq!(col.header, "Badge");
    }

    #[test]
    fn test_node_text_content() {
        let node = Node::new("span")
            .with_child(Rendered::from("Email "))
            .with_child(Node::new("b").with_text("sent").into());
        assert_eq!(node.text_content().unwrap(), "Email sent");
        assert!(matches!(
            Node::new("icon").text_content(),
            Err(RenderError::NoText { .. })
        ));
        let labelled = Node::new("span")
            .with_child(Node::new("icon").into())
            .with_child(Rendered::from("Admin"));
        assert_eq!(labelled.text_content().unwrap(), "Admin");
    }

    #[test]
    fn test_textless_cell_is_blank_not_error() {
        let avatar: Column<serde_json::Value> =
            Column::computed("avatar", |_| Ok(Node::new("img").into()));
        assert_eq!(cell_text(&avatar.render(&json!({}))), "");
        assert_eq!(avatar.search_text(&json!({})), None);

        let broken: Column<serde_json::Value> =
            Column::computed("broken", |_| Err(RenderError::renderer("broken", "no url")));
        assert_eq!(cell_text(&broken.render(&json!({}))), ERROR_MARKER);
    }

    #[test]
    fn test_search_text_contains_failures() {
        let col: Column<serde_json::Value> = Column::computed("boom", |_| {
            Err(RenderError::renderer("boom", "bad record"))
        });
        assert_eq!(col.search_text(&json!({})), None);

        let icon: Column<serde_json::Value> =
            Column::computed("icon", |_| Ok(Node::new("i").into()));
        assert_eq!(icon.search_text(&json!({})), None);
    }

    #[test]
    fn test_cell_text_error_marker() {
        assert_eq!(cell_text(&Err(RenderError::renderer("c", "x"))), ERROR_MARKER);
        assert_eq!(cell_text(&Ok(Rendered::from("ok"))), "ok");
    }
}
