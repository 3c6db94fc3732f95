use std::path::{Path, PathBuf};

use dtv::column::ColumnDescriptor;
use dtv::domain::TableOptions;
use dtv::loader::{columns_from_rows, load_rows};
use dtv::sort::SortDirection;
use dtv::table::DataTable;
use dtv::value::Row;
use serde_json::{Value, json};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn cat_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::path("ID", "id"),
        ColumnDescriptor::path("Breed", "breeds[0].name").sortable(),
        ColumnDescriptor::path("Origin", "breeds[0].origin").sortable(),
        ColumnDescriptor::function("Image", |row: &Row| {
            let url = row.lookup("url").and_then(Value::as_str).unwrap_or("");
            Value::from(url.rsplit('/').next().unwrap_or(""))
        }),
    ]
}

fn column(table: &DataTable, idx: usize) -> Vec<String> {
    table
        .visible_rows()
        .into_iter()
        .map(|r| r.cells[idx].clone())
        .collect()
}

#[test]
fn sorts_and_searches_nested_fields() {
    let rows = load_rows(&fixture("cats.json")).unwrap();
    let options = TableOptions::default()
        .searchable(true)
        .default_sort_field("breeds[0].origin");
    let mut table = DataTable::new(cat_columns(), rows, options);

    // the cat without breeds has no origin and sorts last
    assert_eq!(
        column(&table, 2),
        ["Egypt", "France", "Greece", "United States", "United States", ""]
    );
    // ties keep file order
    assert_eq!(column(&table, 1)[3..5], ["American Bobtail", "American Curl"]);

    table.toggle_sort("breeds[0].origin");
    assert_eq!(column(&table, 2)[0], "");
    assert_eq!(column(&table, 2)[1], "United States");
    assert_eq!(column(&table, 1)[1..3], ["American Bobtail", "American Curl"]);

    table.submit_search("Origin:united states");
    assert_eq!(table.filtered_count(), 2);
    table.submit_search("Image:8RsP7Xt3f.jpg");
    assert_eq!(column(&table, 1), ["Chartreux"]);
}

#[test]
fn generated_ids_are_selectable() {
    let rows = load_rows(&fixture("cats.json")).unwrap();
    let options = TableOptions::default().selectable_rows(true);
    let mut table = DataTable::new(cat_columns(), rows, options);
    assert_eq!(table.toggle_row("5"), Some(true));
    let checked: Vec<_> = table
        .visible_rows()
        .into_iter()
        .filter(|r| r.checked)
        .map(|r| r.cells[3].clone())
        .collect();
    assert_eq!(checked, ["MTY3ODIyMQ.jpg"]);
}

#[test]
fn csv_pages_through_search_results() {
    let rows = load_rows(&fixture("testdata_01.csv")).unwrap();
    let columns = columns_from_rows(&rows);
    let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        ["id", "name", "species", "age", "weight", "vaccinated", "owner"]
    );

    let options = TableOptions::default()
        .pagination(true)
        .page_chunk_size(2usize)
        .default_sort_field("age");
    let mut table = DataTable::new(columns, rows, options);
    assert_eq!(table.page_count(), 6);

    table.submit_search("species:dog");
    assert_eq!(table.filtered_count(), 6);
    assert_eq!(table.range_label(), "1 - 2 of 6");
    assert_eq!(column(&table, 1), ["Bella", "Bailey"]);
    assert!(table.last_page());
    assert_eq!(column(&table, 1), ["Charlie", "Rocky"]);
    assert_eq!(
        table
            .visible_rows()
            .iter()
            .map(|r| r.display_index)
            .collect::<Vec<_>>(),
        [5, 6]
    );

    table.toggle_sort("age");
    assert_eq!(table.header()[3].sort, Some(SortDirection::Descending));
    assert_eq!(column(&table, 1), ["Bella", "Bailey"]);
}

#[test]
fn whole_csv_floats_match_integer_keywords() {
    let rows = load_rows(&fixture("testdata_01.csv")).unwrap();
    let mut table = DataTable::new(columns_from_rows(&rows), rows, TableOptions::default());

    table.submit_search("weight:22");
    assert_eq!(column(&table, 1), ["Charlie"]);
    assert_eq!(column(&table, 4), ["22"]);
}

#[test]
fn bella_and_max() {
    let rows = vec![
        Row::new(json!({"id": 1, "name": "Bella"})),
        Row::new(json!({"id": 2, "name": "Max"})),
    ];
    let columns = vec![ColumnDescriptor::path("Name", "name").sortable()];
    let options = TableOptions::default()
        .default_sort_field("name")
        .page_chunk_size(10usize);
    let mut table = DataTable::new(columns, rows, options);

    let visible = table.visible_rows();
    assert_eq!(visible[0].cells, ["Bella"]);
    assert_eq!(visible[0].display_index, 1);
    assert_eq!(visible[1].cells, ["Max"]);
    assert_eq!(visible[1].display_index, 2);

    table.toggle_sort("name");
    let visible = table.visible_rows();
    assert_eq!(visible[0].cells, ["Max"]);
    assert_eq!(visible[1].cells, ["Bella"]);
}
