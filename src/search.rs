use rayon::prelude::*;
use tracing::trace;

use crate::column::{ColumnDescriptor, Selector};
use crate::value::{Row, search_text};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchExpression {
    pub column: Option<String>,
    pub keyword: String,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl SearchExpression {
    /// A colon with a word character directly on both sides makes this a
    /// `column:keyword` expression. The text is then split on every colon and
    /// only the first two parts are kept, so `"a:b:c"` searches `b` in `a`.
    /// An empty column part means no column. Anything else, including `":x"`
    /// and `"x:"`, is a bare keyword.
    pub fn parse(raw: &str) -> Self {
        let chars: Vec<char> = raw.chars().collect();
        let has_column = chars
            .windows(3)
            .any(|w| matches!(w, [before, ':', after] if is_word_char(*before) && is_word_char(*after)));
        if !has_column {
            return SearchExpression {
                column: None,
                keyword: raw.to_string(),
            };
        }

        let mut parts = raw.split(':');
        let column = parts.next().filter(|c| !c.is_empty()).map(str::to_string);
        let keyword = parts.next().unwrap_or_default().to_string();
        SearchExpression { column, keyword }
    }

    /// An empty keyword means "no filter".
    pub fn is_empty(&self) -> bool {
        self.keyword.is_empty()
    }
}

/// Picks the column to search: the default search field, then the named
/// column, then the first column. Names match case-insensitively and an
/// unknown name falls through to the next rule.
pub fn resolve_search_selector<'a>(
    columns: &'a [ColumnDescriptor],
    column_name: Option<&str>,
    default_search_field: Option<&str>,
) -> Option<&'a Selector> {
    let by_name = |name: &str| columns.iter().find(|c| c.matches_name(name));

    default_search_field
        .and_then(by_name)
        .or_else(|| column_name.and_then(by_name))
        .or_else(|| columns.first())
        .map(|c| &c.selector)
}

/// Keeps rows whose extracted value equals `keyword`, ignoring case.
///
/// This is an exact match, not a substring match: `"a"` does not find `"ab"`.
pub fn apply_search<R>(rows: Vec<R>, selector: &Selector, keyword: &str) -> Vec<R>
where
    R: AsRef<Row> + Send,
{
    if keyword.is_empty() {
        return rows;
    }
    let keyword = keyword.to_lowercase();
    let before = rows.len();

    let matches: Vec<R> = rows
        .into_par_iter()
        .filter(|row| {
            let value = selector.extract(row.as_ref());
            search_text(value.as_deref()).is_some_and(|text| text.to_lowercase() == keyword)
        })
        .collect();

    trace!("Search for {:?} kept {}/{} rows", keyword, matches.len(), before);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expr(column: Option<&str>, keyword: &str) -> SearchExpression {
        SearchExpression {
            column: column.map(str::to_string),
            keyword: keyword.to_string(),
        }
    }

    #[test]
    fn parses_column_and_keyword() {
        assert_eq!(SearchExpression::parse("colName:keyword"), expr(Some("colName"), "keyword"));
        assert_eq!(SearchExpression::parse("c:keyword"), expr(Some("c"), "keyword"));
        assert_eq!(SearchExpression::parse("colName:k"), expr(Some("colName"), "k"));
    }

    #[test]
    fn parses_bare_keyword() {
        assert_eq!(SearchExpression::parse("keyword"), expr(None, "keyword"));
        assert_eq!(SearchExpression::parse(":keyword"), expr(None, ":keyword"));
        assert_eq!(SearchExpression::parse("colName:"), expr(None, "colName:"));
        assert_eq!(SearchExpression::parse("a : b"), expr(None, "a : b"));
        assert_eq!(SearchExpression::parse(""), expr(None, ""));
    }

    #[test]
    fn extra_colons_keep_first_two_parts() {
        assert_eq!(SearchExpression::parse("a:b:c"), expr(Some("a"), "b"));
        assert_eq!(SearchExpression::parse(":a:b"), expr(None, "a"));
        assert_eq!(SearchExpression::parse("url:https://x"), expr(Some("url"), "https"));
        assert_eq!(SearchExpression::parse("Örigin:x"), expr(Some("Örigin"), "x"));
    }

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::path("Name", "breeds[0].name").sortable(),
            ColumnDescriptor::path("Origin", "breeds[0].origin"),
            ColumnDescriptor::path("ID", "id"),
            ColumnDescriptor::path("URL", "url").sortable(),
        ]
    }

    fn resolved(column_name: Option<&str>, default_field: Option<&str>) -> Option<String> {
        let columns = columns();
        resolve_search_selector(&columns, column_name, default_field)
            .and_then(Selector::as_path)
            .map(str::to_string)
    }

    #[test]
    fn default_search_field_wins() {
        assert_eq!(resolved(None, Some("Name")).as_deref(), Some("breeds[0].name"));
        assert_eq!(resolved(Some("ID"), Some("Name")).as_deref(), Some("breeds[0].name"));
        assert_eq!(resolved(Some("ID"), Some("name")).as_deref(), Some("breeds[0].name"));
    }

    #[test]
    fn column_name_then_first_column() {
        assert_eq!(resolved(Some("Origin"), None).as_deref(), Some("breeds[0].origin"));
        assert_eq!(resolved(Some("url"), None).as_deref(), Some("url"));
        assert_eq!(resolved(None, None).as_deref(), Some("breeds[0].name"));
    }

    #[test]
    fn unknown_names_fall_through() {
        assert_eq!(resolved(None, Some("invalidSearchField")).as_deref(), Some("breeds[0].name"));
        assert_eq!(resolved(Some("invalidSearchField"), None).as_deref(), Some("breeds[0].name"));
        assert_eq!(
            resolved(Some("Origin"), Some("invalidSearchField")).as_deref(),
            Some("breeds[0].origin")
        );
        assert!(resolve_search_selector(&[], Some("Name"), Some("Name")).is_none());
    }

    #[test]
    fn exact_case_insensitive_match() {
        let rows = vec![
            Row::new(json!({"name": "a"})),
            Row::new(json!({"name": "b"})),
            Row::new(json!({"name": "ab"})),
        ];
        let selector = Selector::path("name");
        let found = apply_search(rows.clone(), &selector, "A");
        assert_eq!(found, vec![rows[0].clone()]);
        let found = apply_search(rows.clone(), &selector, "a");
        assert_eq!(found.len(), 1);
        assert!(apply_search(rows, &selector, "zzz").is_empty());
    }

    #[test]
    fn empty_keyword_is_no_filter() {
        let rows = vec![Row::new(json!({"name": "a"})), Row::new(json!({"name": "b"}))];
        assert_eq!(apply_search(rows.clone(), &Selector::path("name"), ""), rows);
    }

    #[test]
    fn numbers_match_their_text_and_absent_never_matches() {
        let rows = vec![
            Row::new(json!({"id": 12})),
            Row::new(json!({"id": "12"})),
            Row::new(json!({"other": 12})),
            Row::new(json!({"id": null})),
        ];
        let found = apply_search(rows.iter().collect::<Vec<_>>(), &Selector::path("id"), "12");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn preserves_input_order() {
        let rows: Vec<Row> = (0..200)
            .map(|i| Row::new(json!({"id": i, "kind": if i % 3 == 0 { "x" } else { "y" }})))
            .collect();
        let found = apply_search(rows.iter().collect::<Vec<_>>(), &Selector::path("kind"), "X");
        let ids: Vec<String> = found.iter().filter_map(|r| r.key()).collect();
        let expected: Vec<String> = (0..200).filter(|i| i % 3 == 0).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
    }
}
