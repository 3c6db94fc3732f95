use std::fmt;

use tracing::trace;

use crate::value::{FieldPath, Row, compare_values};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            SortDirection::Ascending => "⬆",
            SortDirection::Descending => "⬇",
        }
    }
}

/// Active sort: the selector path of the sorted field and its direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOption {
    pub field: String,
    pub direction: SortDirection,
}

impl SortOption {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction.icon())
    }
}

/// The explicit default field wins over the first sortable column.
pub fn resolve_initial_sort(
    default_field: Option<&str>,
    first_sortable: Option<&str>,
) -> Option<SortOption> {
    default_field.or(first_sortable).map(SortOption::ascending)
}

/// Same field flips the direction, any other field starts ascending.
pub fn toggle_sort(current: Option<&SortOption>, clicked_field: &str) -> SortOption {
    match current {
        Some(current) if current.field == clicked_field => SortOption {
            field: current.field.clone(),
            direction: current.direction.toggled(),
        },
        _ => SortOption::ascending(clicked_field),
    }
}

/// Stable sort by the value at `sort.field`. `None` keeps the input order.
pub fn apply_sort<R: AsRef<Row>>(mut rows: Vec<R>, sort: Option<&SortOption>) -> Vec<R> {
    let Some(sort) = sort else {
        return rows;
    };
    let path = FieldPath::parse(&sort.field);
    trace!("Sorting {} rows by {}", rows.len(), sort);

    // sort_by is stable, so ties keep their relative input order in both directions
    match sort.direction {
        SortDirection::Ascending => rows.sort_by(|a, b| {
            compare_values(path.lookup(a.as_ref()), path.lookup(b.as_ref()))
        }),
        SortDirection::Descending => rows.sort_by(|a, b| {
            compare_values(path.lookup(b.as_ref()), path.lookup(a.as_ref()))
        }),
    }
    rows
}
