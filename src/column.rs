use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::value::{FieldPath, Row, display_value};

pub type ExtractFn = Arc<dyn Fn(&Row) -> Value + Send + Sync>;
pub type RenderFn = Arc<dyn Fn(&Row) -> String + Send + Sync>;

/// Where a column's value comes from. Exactly one variant governs extraction.
#[derive(Clone)]
pub enum Selector {
    Path(FieldPath),
    Function(ExtractFn),
}

impl Selector {
    pub fn path(path: &str) -> Self {
        Selector::Path(FieldPath::parse(path))
    }

    pub fn function(f: impl Fn(&Row) -> Value + Send + Sync + 'static) -> Self {
        Selector::Function(Arc::new(f))
    }

    pub fn as_path(&self) -> Option<&str> {
        match self {
            Selector::Path(path) => Some(path.as_str()),
            Selector::Function(_) => None,
        }
    }

    pub fn extract<'r>(&self, row: &'r Row) -> Option<Cow<'r, Value>> {
        match self {
            Selector::Path(path) => path.lookup(row).map(Cow::Borrowed),
            Selector::Function(f) => Some(Cow::Owned(f(row))),
        }
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Path(path) => f.debug_tuple("Path").field(&path.as_str()).finish(),
            Selector::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// One column of a table.
///
/// ```
/// use dtv::column::ColumnDescriptor;
///
/// let columns = vec![
///     ColumnDescriptor::path("Name", "breeds[0].name").sortable(),
///     ColumnDescriptor::path("Origin", "breeds[0].origin"),
///     ColumnDescriptor::path("ID", "id"),
/// ];
/// assert_eq!(columns[0].sort_field(), Some("breeds[0].name"));
/// ```
#[derive(Clone)]
pub struct ColumnDescriptor {
    /// Header label, also matched by `column:keyword` searches.
    pub name: String,
    pub selector: Selector,
    pub sortable: bool,
    /// Overrides the cell text. Sorting and searching ignore it.
    pub render: Option<RenderFn>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, selector: Selector) -> Self {
        Self {
            name: name.into(),
            selector,
            sortable: false,
            render: None,
        }
    }

    pub fn path(name: impl Into<String>, path: &str) -> Self {
        Self::new(name, Selector::path(path))
    }

    pub fn function(
        name: impl Into<String>,
        f: impl Fn(&Row) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, Selector::function(f))
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn render(mut self, f: impl Fn(&Row) -> String + Send + Sync + 'static) -> Self {
        self.render = Some(Arc::new(f));
        self
    }

    /// The field a header activation sorts by. Only path columns have one.
    pub fn sort_field(&self) -> Option<&str> {
        self.selector.as_path()
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    pub fn cell(&self, row: &Row) -> String {
        match &self.render {
            Some(render) => render(row),
            None => display_value(self.selector.extract(row).as_deref()),
        }
    }
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("name", &self.name)
            .field("selector", &self.selector)
            .field("sortable", &self.sortable)
            .field("render", &self.render.is_some())
            .finish()
    }
}
