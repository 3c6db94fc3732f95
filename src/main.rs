use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use dtv::column::ColumnDescriptor;
use dtv::domain::{TVConfig, TableError, TableOptions};
use dtv::loader::{columns_from_rows, load_rows};
use dtv::model::{Model, Status};
use dtv::pagination::DEFAULT_PAGE_CHUNK_SIZE;
use dtv::table::DataTable;
use dtv::value::Row;

mod controller;
mod ui;

use controller::Controller;
use ui::TableUI;

/// Search, sort, page and select the rows of a JSON, CSV, Parquet or Arrow file.
#[derive(Parser, Debug)]
#[command(name = "dtv", version, about)]
struct Cli {
    /// File to show. `~` and `$VAR` are expanded.
    path: String,

    /// Column to show, as `LABEL=PATH` with a selector path like `breeds[0].name`.
    /// Repeat for more columns. Without it every top-level field is a column.
    #[arg(long = "column", value_name = "LABEL=PATH", value_parser = parse_column_spec)]
    columns: Vec<(String, String)>,

    /// Make the `--column` with this label sortable. Repeatable.
    #[arg(long = "sortable", value_name = "LABEL")]
    sortable: Vec<String>,

    /// Initial sort field (a selector path).
    #[arg(long)]
    sort_field: Option<String>,

    /// Column searched by every search expression.
    #[arg(long)]
    search_field: Option<String>,

    #[arg(long, default_value_t = DEFAULT_PAGE_CHUNK_SIZE)]
    page_size: usize,

    #[arg(long)]
    pagination: bool,

    #[arg(long)]
    searchable: bool,

    #[arg(long)]
    selectable: bool,

    #[arg(long)]
    disable_select_all: bool,

    /// Hide the table header.
    #[arg(long)]
    no_head: bool,

    /// Title shown above the table, defaults to the file name.
    #[arg(long)]
    title: Option<String>,

    #[arg(long, default_value_t = 40)]
    max_column_width: usize,

    /// Milliseconds to wait for input before redrawing.
    #[arg(long, default_value_t = 100)]
    event_poll_time: u64,

    /// Write logs to this file. Filter with RUST_LOG.
    #[arg(long)]
    log_file: Option<String>,
}

fn parse_column_spec(spec: &str) -> Result<(String, String), String> {
    match spec.split_once('=') {
        Some((label, path)) if !label.trim().is_empty() && !path.trim().is_empty() => {
            Ok((label.trim().to_string(), path.trim().to_string()))
        }
        _ => Err(format!("expected LABEL=PATH, got \"{spec}\"")),
    }
}

fn expand_path(path: &str) -> Result<PathBuf, TableError> {
    let expanded = shellexpand::full(path)
        .map_err(|e| TableError::loading_failed(format!("Cannot expand {path}: {e}")))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

impl Cli {
    fn table_options(&self) -> TableOptions {
        let mut options = TableOptions::default()
            .selectable_rows(self.selectable)
            .is_disable_select_all(self.disable_select_all)
            .no_table_head(self.no_head)
            .pagination(self.pagination)
            .searchable(self.searchable)
            .page_chunk_size(self.page_size);
        if let Some(field) = &self.sort_field {
            options = options.default_sort_field(field.as_str());
        }
        if let Some(field) = &self.search_field {
            options = options.default_search_field(field.as_str());
        }
        options
    }

    fn config(&self) -> TVConfig {
        TVConfig {
            event_poll_time: self.event_poll_time,
            max_column_width: self.max_column_width,
            ..TVConfig::default()
        }
    }

    fn column_descriptors(&self, rows: &[Row]) -> Vec<ColumnDescriptor> {
        if self.columns.is_empty() {
            return columns_from_rows(rows);
        }
        self.columns
            .iter()
            .map(|(label, path)| {
                let column = ColumnDescriptor::path(label.as_str(), path);
                if self.sortable.iter().any(|s| column.matches_name(s)) {
                    column.sortable()
                } else {
                    column
                }
            })
            .collect()
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<(), TableError> {
    // The terminal belongs to the ui, so logs only go to a file.
    let file_layer = match log_file {
        Some(path) => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(File::create(path)?)),
        ),
        None => None,
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(file_layer)
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_file = match cli.log_file.as_deref().map(expand_path).transpose() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(log_file.as_deref()) {
        eprintln!("Error: could not open log file: {e}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(cli: &Cli) -> Result<(), TableError> {
    info!("Starting dtv!");
    let path = expand_path(&cli.path)?;
    let rows = load_rows(&path)?;
    let columns = cli.column_descriptors(&rows);
    let config = cli.config();
    let name = cli.title.clone().unwrap_or_else(|| {
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string()
    });

    let table = DataTable::new(columns, rows, cli.table_options());
    let mut model = Model::new(name, table, &config);
    let mut ui = TableUI::new();
    let controller = Controller::new(&config);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut model, &mut ui, &controller);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    ui: &mut TableUI,
    controller: &Controller,
) -> Result<(), TableError> {
    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(model, f))?;

        // A timeout maps to no message and still lets the model fire a
        // pending search
        let message = controller.handle_event(model)?;
        model.update(message)?;
    }
    Ok(())
}
