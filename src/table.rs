//! The table orchestrator: owns sort, search, page and selection state and
//! turns raw rows into the rows that are shown.
//!
//! Recomputation order is fixed: filter, then sort. Chunking and slicing
//! happen on read, from the cached view and the page state.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info, trace};

use crate::column::{ColumnDescriptor, Selector};
use crate::domain::TableOptions;
use crate::pagination::{PageState, chunk, current_slice, display_index};
use crate::search::{SearchExpression, apply_search, resolve_search_selector};
use crate::selection::SelectionSet;
use crate::sort::{SortDirection, SortOption, apply_sort, resolve_initial_sort, toggle_sort};
use crate::value::{Row, RowKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRow {
    /// 1-based position in the filtered and sorted table.
    pub display_index: usize,
    pub key: Option<RowKey>,
    pub checked: bool,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub name: String,
    pub sortable: bool,
    /// Direction if this column is the active sort.
    pub sort: Option<SortDirection>,
}

// A row plus its position in `DataTable::rows`, so the pipeline can run on
// borrowed rows and still report positions.
struct Indexed<'a> {
    position: usize,
    row: &'a Row,
}

impl AsRef<Row> for Indexed<'_> {
    fn as_ref(&self) -> &Row {
        self.row
    }
}

#[derive(Debug)]
pub struct DataTable {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Row>,
    options: TableOptions,
    sort: Option<SortOption>,
    search: SearchExpression,
    page: PageState,
    selection: SelectionSet,
    view: Vec<usize>, // Positions in `rows`, filtered and sorted
}

impl DataTable {
    pub fn new(columns: Vec<ColumnDescriptor>, rows: Vec<Row>, options: TableOptions) -> Self {
        let first_sortable = columns
            .iter()
            .filter(|c| c.sortable)
            .find_map(|c| c.sort_field());
        let sort = resolve_initial_sort(options.default_sort_field.as_deref(), first_sortable);
        let page = PageState::new(options.page_chunk_size);
        debug!(
            "New table with {} columns, {} rows, initial sort {:?}",
            columns.len(),
            rows.len(),
            sort
        );

        let mut table = Self {
            columns,
            rows,
            options,
            sort,
            search: SearchExpression::default(),
            page,
            selection: SelectionSet::new(),
            view: Vec::new(),
        };
        table.recompute();
        table
    }

    fn search_selector(&self) -> Option<&Selector> {
        resolve_search_selector(
            &self.columns,
            self.search.column.as_deref(),
            self.options.default_search_field.as_deref(),
        )
    }

    fn recompute(&mut self) {
        let start_time = Instant::now();
        let indexed: Vec<Indexed> = self
            .rows
            .iter()
            .enumerate()
            .map(|(position, row)| Indexed { position, row })
            .collect();

        let filtered = match self.search_selector() {
            Some(selector) if !self.search.is_empty() => {
                apply_search(indexed, selector, &self.search.keyword)
            }
            _ => indexed,
        };
        let sorted = apply_sort(filtered, self.sort.as_ref());
        let view: Vec<usize> = sorted.into_iter().map(|r| r.position).collect();

        self.view = view;
        self.page.clamp(self.view.len());
        trace!(
            "Recomputed view: {}/{} rows, page {} in {}ms",
            self.view.len(),
            self.rows.len(),
            self.page.index(),
            start_time.elapsed().as_millis()
        );
    }

    // -------------------- Accessors ---------------------- //

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn sort_option(&self) -> Option<&SortOption> {
        self.sort.as_ref()
    }

    pub fn search(&self) -> &SearchExpression {
        &self.search
    }

    pub fn page(&self) -> &PageState {
        &self.page
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn total_count(&self) -> usize {
        self.rows.len()
    }

    pub fn filtered_count(&self) -> usize {
        self.view.len()
    }

    pub fn page_count(&self) -> usize {
        self.page.page_count(self.filtered_count())
    }

    pub fn selected_count(&self) -> usize {
        self.selection.selected_count(self.total_count())
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selection.is_selected(key)
    }

    pub fn range_label(&self) -> String {
        self.page.range_label(self.filtered_count())
    }

    pub fn header(&self) -> Vec<HeaderCell> {
        self.columns
            .iter()
            .map(|column| {
                let sort = match (&self.sort, column.sort_field()) {
                    (Some(sort), Some(field)) if column.sortable && sort.field == field => {
                        Some(sort.direction)
                    }
                    _ => None,
                };
                HeaderCell {
                    name: column.name.clone(),
                    sortable: column.sortable,
                    sort,
                }
            })
            .collect()
    }

    /// Rows of the current page, or all filtered rows without pagination.
    /// Empty while loading.
    pub fn visible_rows(&self) -> Vec<VisibleRow> {
        if self.options.is_loading {
            return Vec::new();
        }

        let size = self.page.chunk_size();
        let page_index = self.page.index();
        let positions = if self.options.pagination {
            let chunks = chunk(&self.view, size);
            current_slice(&chunks, page_index)
        } else {
            &self.view[..]
        };

        positions
            .iter()
            .enumerate()
            .map(|(idx, &position)| {
                let row = &self.rows[position];
                let key = row.key();
                let checked = self.selection.is_all_selected()
                    || key.as_deref().is_some_and(|k| self.selection.is_selected(k));
                VisibleRow {
                    display_index: if self.options.pagination {
                        display_index(idx, size, page_index)
                    } else {
                        idx + 1
                    },
                    key,
                    checked,
                    cells: self.columns.iter().map(|c| c.cell(row)).collect(),
                }
            })
            .collect()
    }

    // -------------------- Mutators ---------------------- //

    /// Replaces the data. Selected keys that no longer exist are dropped.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        info!("Replacing {} rows with {}", self.rows.len(), rows.len());
        self.rows = rows;
        let keys: HashSet<RowKey> =
            self.rows.iter().filter_map(Row::key).collect();
        self.selection.retain(|key| keys.contains(key));
        self.recompute();
    }

    /// Header activation for `field`: flips the direction on the active
    /// field, otherwise sorts ascending by it.
    pub fn toggle_sort(&mut self, field: &str) -> SortOption {
        let sort = toggle_sort(self.sort.as_ref(), field);
        debug!("Sort changed to {}", sort);
        self.sort = Some(sort.clone());
        self.recompute();
        sort
    }

    /// Header activation by column position. Columns that are not sortable,
    /// or have no selector path, are ignored.
    pub fn toggle_sort_column(&mut self, column_index: usize) -> Option<SortOption> {
        let field = self
            .columns
            .get(column_index)
            .filter(|c| c.sortable)
            .and_then(|c| c.sort_field())
            .map(str::to_string);
        match field {
            Some(field) => Some(self.toggle_sort(&field)),
            None => {
                trace!("Column {} is not sortable", column_index);
                None
            }
        }
    }

    /// Applies a (debounced) search text. An empty keyword clears the filter.
    pub fn submit_search(&mut self, raw: &str) {
        let search = SearchExpression::parse(raw);
        if search == self.search {
            return;
        }
        debug!("Search changed to {:?}", search);
        self.search = search;
        self.recompute();
        info!(
            "Search {:?} matches {}/{} rows",
            raw,
            self.filtered_count(),
            self.total_count()
        );
    }

    /// Re-chunks and returns to the first page.
    pub fn set_page_size(&mut self, page_chunk_size: usize) {
        debug!("Page size {} -> {}", self.page.chunk_size(), page_chunk_size);
        self.page.set_chunk_size(page_chunk_size);
    }

    pub fn set_page_index(&mut self, page_index: usize) -> bool {
        let total = self.filtered_count();
        self.page.set_index(page_index, total)
    }

    pub fn first_page(&mut self) -> bool {
        let total = self.filtered_count();
        self.page.first(total)
    }

    pub fn previous_page(&mut self) -> bool {
        let total = self.filtered_count();
        self.page.previous(total)
    }

    pub fn next_page(&mut self) -> bool {
        let total = self.filtered_count();
        self.page.next(total)
    }

    pub fn last_page(&mut self) -> bool {
        let total = self.filtered_count();
        self.page.last(total)
    }

    /// Flips the selection of the row with `key`. Returns the new explicit
    /// state, or `None` if no row has that key.
    pub fn toggle_row(&mut self, key: &str) -> Option<bool> {
        if !self.rows.iter().any(|r| r.key().as_deref() == Some(key)) {
            debug!("Ignoring selection toggle for unknown row {key}");
            return None;
        }
        let selected = self.selection.toggle(key);
        trace!("Row {key} selected: {selected}");
        Some(selected)
    }

    /// Flips the select-all flag. Does nothing when select-all is disabled.
    pub fn toggle_select_all(&mut self) -> bool {
        if self.options.is_disable_select_all {
            debug!("Select all is disabled");
            return self.selection.is_all_selected();
        }
        self.selection.toggle_all()
    }

    pub fn set_loading(&mut self, is_loading: bool) {
        self.options.is_loading = is_loading;
    }
}
