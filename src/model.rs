use std::time::Instant;

use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, info, trace};

use crate::debounce::Debouncer;
use crate::domain::{HELP_TEXT, Message, TVConfig, TableError};
use crate::inputter::{InputResult, Inputter};
use crate::table::{DataTable, HeaderCell, VisibleRow};

pub const COLUMN_WIDTH_MARGIN: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ready,
    Loading,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modus {
    Table,
    Popup,
    SearchInput,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationView {
    pub range_label: String,
    pub page: usize, // 1-based
    pub page_count: usize,
    pub page_size: usize,
    pub can_go_previous: bool,
    pub can_go_next: bool,
}

/// Everything the ui needs to draw one frame.
#[derive(Debug, Clone)]
pub struct UIData {
    pub name: String,
    pub header: Option<Vec<HeaderCell>>, // None without a table head
    pub rows: Vec<VisibleRow>,
    pub column_widths: Vec<usize>,
    pub index_width: usize,
    pub selectable: bool,
    pub show_select_all: bool,
    pub all_selected: bool,
    pub selection_summary: Option<String>,
    pub cursor_row: usize,
    pub cursor_column: usize,
    pub is_loading: bool,
    pub pagination: Option<PaginationView>,
    pub searchable: bool,
    pub search: InputResult,
    pub active_search: bool,
    pub search_pending: bool,
    pub show_popup: bool,
    pub popup_message: String,
    pub status_message: String,
    pub last_update: Instant,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            header: None,
            rows: Vec::new(),
            column_widths: Vec::new(),
            index_width: 0,
            selectable: false,
            show_select_all: false,
            all_selected: false,
            selection_summary: None,
            cursor_row: 0,
            cursor_column: 0,
            is_loading: false,
            pagination: None,
            searchable: false,
            search: InputResult::default(),
            active_search: false,
            search_pending: false,
            show_popup: false,
            popup_message: String::new(),
            status_message: String::new(),
            last_update: Instant::now(),
        }
    }
}

pub struct Model {
    config: TVConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    table: DataTable,
    cursor_row: usize,    // Index into the visible rows
    cursor_column: usize, // Index into the table columns
    input: Inputter,
    search_debounce: Debouncer<String>,
    uidata: UIData,
}

impl Model {
    pub fn new(name: impl Into<String>, table: DataTable, config: &TVConfig) -> Self {
        let status = if table.options().is_loading {
            Status::Loading
        } else {
            Status::Ready
        };
        let mut model = Self {
            config: config.clone(),
            status,
            modus: Modus::Table,
            previous_modus: Modus::Table,
            table,
            cursor_row: 0,
            cursor_column: 0,
            input: Inputter::default(),
            search_debounce: Debouncer::new(config.search_debounce),
            uidata: UIData::empty(),
        };
        model.uidata.name = name.into();
        model.update_uidata();
        let message = format!("Loaded {} rows", model.table.total_count());
        model.set_status_message(message);
        model
    }

    pub fn table(&self) -> &DataTable {
        &self.table
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    /// True while the search prompt owns the keyboard.
    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::SearchInput
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), TableError> {
        self.poll_search(Instant::now());

        if let Some(msg) = message {
            trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);
            match self.modus {
                Modus::Table => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveUp => self.move_cursor_up(),
                    Message::MoveDown => self.move_cursor_down(),
                    Message::MoveLeft => self.move_cursor_left(),
                    Message::MoveRight => self.move_cursor_right(),
                    Message::SortColumn => self.sort_cursor_column(),
                    Message::ToggleRow => self.toggle_cursor_row(),
                    Message::ToggleSelectAll => self.toggle_select_all(),
                    Message::FirstPage
                    | Message::PreviousPage
                    | Message::NextPage
                    | Message::LastPage => self.change_page(msg),
                    Message::GrowPageSize => self.change_page_size(1),
                    Message::ShrinkPageSize => self.change_page_size(-1),
                    Message::Search => self.enter_search_mode(),
                    Message::ClearSearch => self.clear_search(),
                    Message::ToggleLoading => self.toggle_loading(),
                    Message::Help => self.show_help(),
                    Message::Exit | Message::RawKey(_) => (),
                },
                Modus::Popup => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit => self.exit(),
                    _ => (),
                },
                Modus::SearchInput => {
                    if let Message::RawKey(key) = msg {
                        self.raw_input(key)
                    }
                }
            }
        }
        Ok(())
    }

    /// Applies a debounced search whose quiet window has passed. Returns true
    /// if a search ran.
    pub fn poll_search(&mut self, now: Instant) -> bool {
        match self.search_debounce.poll(now) {
            Some(text) => {
                debug!("Debounced search {text:?}");
                self.apply_search(&text);
                true
            }
            None => false,
        }
    }

    // -------------------- Control handling functions ---------------------- //

    fn exit(&mut self) {
        if self.modus == Modus::Popup {
            trace!("Close popup ...");
            self.modus = self.previous_modus;
            self.previous_modus = Modus::Popup;
            self.uidata.show_popup = false;
            self.uidata.last_update = Instant::now();
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::Popup;
        self.uidata.popup_message = HELP_TEXT.to_string();
        self.uidata.show_popup = true;
        self.uidata.last_update = Instant::now();
    }

    fn enter_search_mode(&mut self) {
        if !self.table.options().searchable {
            self.set_status_message("Search is disabled");
            return;
        }
        trace!("Entering search mode ...");
        self.previous_modus = self.modus;
        self.modus = Modus::SearchInput;
        self.input.resume();
        self.update_uidata();
    }

    fn leave_search_mode(&mut self) {
        self.modus = self.previous_modus;
        self.previous_modus = Modus::SearchInput;
    }

    fn raw_input(&mut self, key: KeyEvent) {
        let result = self.input.read(key);
        if result.canceled {
            self.search_debounce.cancel();
            self.leave_search_mode();
            self.apply_search("");
        } else if result.finished {
            // Enter applies right away
            self.search_debounce.cancel();
            self.leave_search_mode();
            self.apply_search(&result.input);
        } else if result.changed {
            self.search_debounce.schedule(result.input, Instant::now());
            self.update_uidata();
        } else {
            self.update_uidata();
        }
    }

    fn clear_search(&mut self) {
        self.input.clear();
        self.search_debounce.cancel();
        self.apply_search("");
    }

    fn apply_search(&mut self, text: &str) {
        let start_time = Instant::now();
        self.table.submit_search(text);
        self.cursor_row = 0;
        self.update_uidata();
        if text.is_empty() {
            self.set_status_message("Search cleared");
        } else {
            let message = format!(
                "{} of {} rows match \"{}\" ({}ms)",
                self.table.filtered_count(),
                self.table.total_count(),
                text,
                start_time.elapsed().as_millis()
            );
            self.set_status_message(message);
        }
    }

    fn sort_cursor_column(&mut self) {
        match self.table.toggle_sort_column(self.cursor_column) {
            Some(sort) => {
                let message = format!("Sorted by {sort}");
                self.update_uidata();
                self.set_status_message(message);
            }
            None => {
                let name = self
                    .table
                    .columns()
                    .get(self.cursor_column)
                    .map(|c| c.name.clone())
                    .unwrap_or_default();
                self.set_status_message(format!("Column \"{name}\" is not sortable"));
            }
        }
    }

    fn toggle_cursor_row(&mut self) {
        if !self.table.options().selectable_rows {
            return;
        }
        let key = self
            .uidata
            .rows
            .get(self.cursor_row)
            .and_then(|row| row.key.clone());
        match key {
            Some(key) => {
                self.table.toggle_row(&key);
                self.update_uidata();
            }
            None => self.set_status_message("Row has no id and cannot be selected"),
        }
    }

    fn toggle_select_all(&mut self) {
        let options = self.table.options();
        if !options.selectable_rows || options.is_disable_select_all {
            return;
        }
        self.table.toggle_select_all();
        self.update_uidata();
    }

    fn change_page(&mut self, msg: Message) {
        if !self.table.options().pagination {
            return;
        }
        let changed = match msg {
            Message::FirstPage => self.table.first_page(),
            Message::PreviousPage => self.table.previous_page(),
            Message::NextPage => self.table.next_page(),
            Message::LastPage => self.table.last_page(),
            _ => false,
        };
        if changed {
            self.cursor_row = 0;
            self.update_uidata();
        }
    }

    fn change_page_size(&mut self, step: isize) {
        if !self.table.options().pagination {
            return;
        }
        let size = self.table.page().next_size_option(step);
        self.table.set_page_size(size);
        self.cursor_row = 0;
        self.update_uidata();
        self.set_status_message(format!("Showing {size} rows per page"));
    }

    fn toggle_loading(&mut self) {
        let is_loading = !self.table.options().is_loading;
        info!("Loading placeholder: {is_loading}");
        self.table.set_loading(is_loading);
        self.status = if is_loading {
            Status::Loading
        } else {
            Status::Ready
        };
        self.update_uidata();
    }

    fn move_cursor_up(&mut self) {
        self.cursor_row = self.cursor_row.saturating_sub(1);
        self.update_cursor();
    }

    fn move_cursor_down(&mut self) {
        if self.cursor_row + 1 < self.uidata.rows.len() {
            self.cursor_row += 1;
        }
        self.update_cursor();
    }

    fn move_cursor_left(&mut self) {
        self.cursor_column = self.cursor_column.saturating_sub(1);
        self.update_cursor();
    }

    fn move_cursor_right(&mut self) {
        if self.cursor_column + 1 < self.table.columns().len() {
            self.cursor_column += 1;
        }
        self.update_cursor();
    }

    fn update_cursor(&mut self) {
        self.uidata.cursor_row = self.cursor_row;
        self.uidata.cursor_column = self.cursor_column;
        self.uidata.last_update = Instant::now();
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.uidata.status_message = message.into();
        self.uidata.last_update = Instant::now();
    }

    fn update_uidata(&mut self) {
        let rows = self.table.visible_rows();
        self.cursor_row = self.cursor_row.min(rows.len().saturating_sub(1));

        let options = self.table.options();
        let header = self.table.header();
        let column_widths = column_widths(&header, &rows, self.config.max_column_width);
        let index_width = rows
            .last()
            .map(|r| r.display_index.to_string().len())
            .unwrap_or(1);

        let pagination = options.pagination.then(|| {
            let page = self.table.page();
            let total = self.table.filtered_count();
            PaginationView {
                range_label: self.table.range_label(),
                page: page.index() + 1,
                page_count: self.table.page_count(),
                page_size: page.chunk_size(),
                can_go_previous: page.can_go_previous(),
                can_go_next: page.can_go_next(total),
            }
        });

        let ui = &mut self.uidata;
        ui.header = (!options.no_table_head).then_some(header);
        ui.rows = rows;
        ui.column_widths = column_widths;
        ui.index_width = index_width;
        ui.selectable = options.selectable_rows;
        ui.show_select_all = options.selectable_rows && !options.is_disable_select_all;
        ui.all_selected = self.table.selection().is_all_selected();
        ui.selection_summary = options
            .selectable_rows
            .then(|| format!("{} item selected", self.table.selected_count()));
        ui.is_loading = options.is_loading;
        ui.pagination = pagination;
        ui.searchable = options.searchable;
        ui.search = self.input.get();
        ui.active_search = self.modus == Modus::SearchInput;
        ui.search_pending = self.search_debounce.is_pending();
        ui.cursor_row = self.cursor_row;
        ui.cursor_column = self.cursor_column;
        ui.last_update = Instant::now();
    }
}

fn column_widths(header: &[HeaderCell], rows: &[VisibleRow], max_column_width: usize) -> Vec<usize> {
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            // Room for the sort icon
            let name_width = cell.name.chars().count() + 2;
            let data_width = rows
                .iter()
                .filter_map(|r| r.cells.get(idx))
                .map(|c| c.chars().count())
                .max()
                .unwrap_or(0);
            (name_width.max(data_width) + COLUMN_WIDTH_MARGIN).min(max_column_width)
        })
        .collect()
}
