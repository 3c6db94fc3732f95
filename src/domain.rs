use std::fmt;
use std::io::Error;
use std::time::Duration;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use tracing_error::SpanTrace;

use crate::debounce::SEARCH_DEBOUNCE;
use crate::pagination::DEFAULT_PAGE_CHUNK_SIZE;

#[derive(Debug)]
pub enum TableError {
    IoError(Error),
    PolarsError(PolarsError),
    JsonError(serde_json::Error),
    LoadingFailed { reason: String, trace: SpanTrace },
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl TableError {
    /// Captures the active span trace together with the reason.
    pub fn loading_failed(reason: impl Into<String>) -> Self {
        TableError::LoadingFailed {
            reason: reason.into(),
            trace: SpanTrace::capture(),
        }
    }
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::IoError(e) => write!(f, "I/O error: {e}"),
            TableError::PolarsError(e) => write!(f, "Could not read table: {e}"),
            TableError::JsonError(e) => write!(f, "Invalid JSON: {e}"),
            TableError::LoadingFailed { reason, trace } => {
                write!(f, "Loading failed: {reason}")?;
                if trace.status() == tracing_error::SpanTraceStatus::CAPTURED {
                    write!(f, "\n{trace}")?;
                }
                Ok(())
            }
            TableError::FileNotFound => f.write_str("File not found"),
            TableError::PermissionDenied => f.write_str("Permission denied"),
            TableError::UnknownFileType => {
                f.write_str("Unknown file type (expected json, csv, parquet or arrow)")
            }
        }
    }
}

impl std::error::Error for TableError {}

impl From<Error> for TableError {
    fn from(err: Error) -> Self {
        TableError::IoError(err)
    }
}

impl From<PolarsError> for TableError {
    fn from(err: PolarsError) -> Self {
        TableError::PolarsError(err)
    }
}

impl From<serde_json::Error> for TableError {
    fn from(err: serde_json::Error) -> Self {
        TableError::JsonError(err)
    }
}

/// Feature flags and defaults of one table instance.
///
/// ```
/// use dtv::domain::TableOptions;
///
/// let options = TableOptions::default()
///     .pagination(true)
///     .selectable_rows(true)
///     .default_sort_field("name");
/// assert_eq!(options.default_sort_field.as_deref(), Some("name"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Setters)]
#[setters(into, strip_option)]
pub struct TableOptions {
    pub is_loading: bool,
    pub selectable_rows: bool,
    pub is_disable_select_all: bool,
    pub no_table_head: bool,
    pub pagination: bool,
    pub searchable: bool,
    /// Initial sort key, a selector path.
    pub default_sort_field: Option<String>,
    /// Column name searched when the expression names no column (or even when it does).
    pub default_search_field: Option<String>,
    pub page_chunk_size: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            is_loading: false,
            selectable_rows: false,
            is_disable_select_all: false,
            no_table_head: false,
            pagination: false,
            searchable: false,
            default_sort_field: None,
            default_search_field: None,
            page_chunk_size: DEFAULT_PAGE_CHUNK_SIZE,
        }
    }
}

/// Viewer settings that do not belong to the table itself.
#[derive(Debug, Clone)]
pub struct TVConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub search_debounce: Duration,
}

impl Default for TVConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            max_column_width: 40,
            search_debounce: SEARCH_DEBOUNCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    SortColumn,
    ToggleRow,
    ToggleSelectAll,
    FirstPage,
    PreviousPage,
    NextPage,
    LastPage,
    GrowPageSize,
    ShrinkPageSize,
    Search,
    ClearSearch,
    ToggleLoading,
    Help,
    Exit,
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
q          quit
↑ ↓ ← →    move the cursor
s          sort by the cursor column (again to flip)
space      select / deselect the cursor row
a          select all / none
/          search: keyword or column:keyword (Enter applies, Esc clears)
c          clear the search
n p        next / previous page
g G        first / last page
+ -        rows per page
l          toggle the loading placeholder
?          this help, Esc closes it";
