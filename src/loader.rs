//! Loading rows from JSON, CSV, Parquet and Arrow IPC files.
//!
//! Tabular formats go through polars lazy readers and are converted column by
//! column (in parallel) into JSON values, then transposed into rows.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use serde_json::{Map, Number, Value};
use tracing::{debug, info, instrument, warn};

use crate::column::ColumnDescriptor;
use crate::domain::TableError;
use crate::value::{ID_FIELD, Row, RowKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Json,
    Csv,
    Parquet,
    Arrow,
}

#[derive(Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
    pub file_type: FileType,
}

pub fn detect_file_type(path: &Path) -> Result<FileType, TableError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("JSON") => Ok(FileType::Json),
        Some("CSV") => Ok(FileType::Csv),
        Some("PARQUET") | Some("PQ") => Ok(FileType::Parquet),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::Arrow),
        _ => Err(TableError::UnknownFileType),
    }
}

pub fn file_info(path: &Path) -> Result<FileInfo, TableError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TableError::FileNotFound,
        ErrorKind::PermissionDenied => TableError::PermissionDenied,
        _ => TableError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(TableError::loading_failed("Not a file!"));
    }

    Ok(FileInfo {
        path: path.to_path_buf(),
        file_size: metadata.len(),
        file_type: detect_file_type(path)?,
    })
}

/// Loads all rows of `path`. Rows without an `id` get their position as id.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_rows(path: &Path) -> Result<Vec<Row>, TableError> {
    let info = file_info(path)?;
    debug!("Loading {:?} file of {} bytes", info.file_type, info.file_size);
    let start_time = Instant::now();

    let mut rows = match info.file_type {
        FileType::Json => load_json(&info.path)?,
        FileType::Csv => frame_to_rows(load_csv(&info.path)?)?,
        FileType::Parquet => frame_to_rows(load_parquet(&info.path)?)?,
        FileType::Arrow => frame_to_rows(load_arrow(&info.path)?)?,
    };
    let assigned = ensure_ids(&mut rows);
    if assigned > 0 {
        debug!("Assigned ids to {assigned} rows");
    }

    info!(
        "Loading {} rows took {}ms ...",
        rows.len(),
        start_time.elapsed().as_millis()
    );
    Ok(rows)
}

fn load_json(path: &Path) -> Result<Vec<Row>, TableError> {
    let reader = BufReader::new(File::open(path)?);
    let value: Value = serde_json::from_reader(reader)?;
    rows_from_json(value)
}

/// Accepts an array of objects. Anything else is rejected.
pub fn rows_from_json(value: Value) -> Result<Vec<Row>, TableError> {
    let Value::Array(items) = value else {
        return Err(TableError::loading_failed("Expected a JSON array of objects"));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(map) => Ok(Row::from_map(map)),
            other => {
                warn!("Row {idx} is not an object: {other}");
                Err(TableError::loading_failed(format!(
                    "Row {idx} is not an object"
                )))
            }
        })
        .collect()
}

/// Gives rows without an `id` their position as id, or the next free number
/// when that is already taken by another row. Returns how many changed.
pub fn ensure_ids(rows: &mut [Row]) -> usize {
    let mut taken: HashSet<RowKey> = rows.iter().filter_map(Row::key).collect();
    let mut assigned = 0;
    for (position, row) in rows.iter_mut().enumerate() {
        if row.value().get(ID_FIELD).is_some() {
            continue;
        }
        let mut id = position;
        while taken.contains(&id.to_string()) {
            id += 1;
        }
        if row.ensure_id(id) {
            taken.insert(id.to_string());
            assigned += 1;
        }
    }
    assigned
}

/// One path column per top-level key of the first row, `id` first.
pub fn columns_from_rows(rows: &[Row]) -> Vec<ColumnDescriptor> {
    let Some(Value::Object(first)) = rows.first().map(Row::value) else {
        return Vec::new();
    };
    let mut names: Vec<&String> = first.keys().collect();
    if let Some(pos) = names.iter().position(|k| k.as_str() == ID_FIELD) {
        let id = names.remove(pos);
        names.insert(0, id);
    }
    names
        .into_iter()
        .map(|name| ColumnDescriptor::path(name.as_str(), name).sortable())
        .collect()
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

fn is_integer_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

fn is_float_type(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

// Converts one column into JSON values. Integers and floats stay numbers,
// booleans stay booleans, everything else is rendered by polars as a string.
fn column_values(column: &Column) -> Result<Vec<Value>, PolarsError> {
    let dtype = column.dtype();
    let values = if is_integer_type(dtype) {
        let col = column.cast(&DataType::Int64)?;
        col.i64()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::from))
            .collect()
    } else if is_float_type(dtype) {
        let col = column.cast(&DataType::Float64)?;
        col.f64()?
            .into_iter()
            .map(|v| v.and_then(Number::from_f64).map_or(Value::Null, Value::Number))
            .collect()
    } else if matches!(dtype, DataType::Boolean) {
        column
            .bool()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Bool))
            .collect()
    } else {
        let col = column.cast(&DataType::String)?;
        col.str()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, |s| Value::String(s.to_string())))
            .collect()
    };
    Ok(values)
}

fn frame_to_rows(frame: LazyFrame) -> Result<Vec<Row>, TableError> {
    // Each column is converted in its own rayon task.
    let df = frame.collect()?;
    let height = df.height();
    let columns: Result<Vec<(String, Vec<Value>)>, PolarsError> = df
        .get_columns()
        .par_iter()
        .map(|c| Ok((c.name().to_string(), column_values(c)?)))
        .collect();
    let columns = columns?;
    debug!("Converted {} columns of {} rows", columns.len(), height);

    let mut maps: Vec<Map<String, Value>> = (0..height).map(|_| Map::new()).collect();
    for (name, values) in columns {
        for (map, value) in maps.iter_mut().zip(values) {
            map.insert(name.clone(), value);
        }
    }
    Ok(maps.into_iter().map(Row::from_map).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TableOptions;
    use crate::table::DataTable;
    use serde_json::json;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    #[test]
    fn detects_file_types() {
        assert_eq!(detect_file_type(Path::new("a.json")).unwrap(), FileType::Json);
        assert_eq!(detect_file_type(Path::new("a.CSV")).unwrap(), FileType::Csv);
        assert_eq!(detect_file_type(Path::new("a.pq")).unwrap(), FileType::Parquet);
        assert_eq!(detect_file_type(Path::new("a.feather")).unwrap(), FileType::Arrow);
        assert!(matches!(
            detect_file_type(Path::new("a.xlsx")),
            Err(TableError::UnknownFileType)
        ));
        assert!(matches!(
            detect_file_type(Path::new("noext")),
            Err(TableError::UnknownFileType)
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            load_rows(&fixture("does_not_exist.json")),
            Err(TableError::FileNotFound)
        ));
        assert!(matches!(
            file_info(&fixture("")),
            Err(TableError::LoadingFailed { .. })
        ));
    }

    #[test]
    fn json_rows_must_be_objects() {
        let rows = rows_from_json(json!([{"id": 1}, {"name": "x"}])).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows_from_json(json!([{"id": 1}, 3])).is_err());
        assert!(rows_from_json(json!({"id": 1})).is_err());
    }

    #[test]
    fn ids_are_assigned_by_position() {
        let mut rows = rows_from_json(json!([{"id": "a"}, {"name": "x"}, {"name": "y"}])).unwrap();
        assert_eq!(ensure_ids(&mut rows), 2);
        let keys: Vec<_> = rows.iter().map(|r| r.key().unwrap()).collect();
        assert_eq!(keys, ["a", "1", "2"]);
        assert_eq!(ensure_ids(&mut rows), 0);
    }

    #[test]
    fn assigned_ids_skip_existing_ones() {
        let mut rows = rows_from_json(json!([
            {"id": 1, "name": "a"},
            {"name": "b"},
            {"id": "2", "name": "c"},
            {"name": "d"}
        ]))
        .unwrap();
        assert_eq!(ensure_ids(&mut rows), 2);
        let keys: Vec<_> = rows.iter().map(|r| r.key().unwrap()).collect();
        assert_eq!(keys, ["1", "3", "2", "4"]);

        let mut table = DataTable::new(
            vec![ColumnDescriptor::path("Name", "name")],
            rows,
            TableOptions::default().selectable_rows(true),
        );
        assert_eq!(table.toggle_row("1"), Some(true));
        let checked: Vec<_> = table.visible_rows().iter().map(|r| r.checked).collect();
        assert_eq!(checked, [true, false, false, false]);
    }

    #[test]
    fn columns_follow_first_row_with_id_first() {
        let rows = rows_from_json(json!([{"name": "x", "id": 1, "age": 3}])).unwrap();
        let names: Vec<_> = columns_from_rows(&rows).into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["id", "name", "age"]);
        assert!(columns_from_rows(&[]).is_empty());
    }

    #[test]
    fn loads_json_fixture() {
        let rows = load_rows(&fixture("cats.json")).unwrap();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.key().is_some()));
        assert_eq!(
            rows[0].lookup("breeds[0].origin"),
            Some(&json!("Egypt"))
        );
    }

    #[test]
    fn loads_csv_fixture() {
        let rows = load_rows(&fixture("testdata_01.csv")).unwrap();
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].lookup("name"), Some(&json!("Bella")));
        assert_eq!(rows[0].lookup("age"), Some(&json!(3)));
        assert_eq!(rows[0].lookup("weight"), Some(&json!(4.5)));
        assert_eq!(rows[0].lookup("vaccinated"), Some(&json!(true)));
        assert_eq!(rows[0].key().as_deref(), Some("1"));
        assert_eq!(rows[2].lookup("owner"), Some(&Value::Null));
    }
}
