//! Row values, selector paths and the ordering used for sorting.
//!
//! A [`Row`] is a JSON object. Columns reach into it with a [`FieldPath`]
//! such as `breeds[0].name`. Lookups never fail: a path that does not
//! resolve, or that is malformed, yields `None` ("absent"), and absent values
//! still take part in sorting through [`compare_values`].

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

/// String form of a row's `id` field. `1` and `"1"` map to the same key.
pub type RowKey = String;

/// Name of the identifier field every row is expected to carry.
pub const ID_FIELD: &str = "id";

#[derive(Debug, Clone, PartialEq)]
pub struct Row(Value);

impl Row {
    pub fn new(value: Value) -> Self {
        Row(value)
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Row(Value::Object(map))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Looks up a selector path. Parses the path on every call, so hot loops
    /// should parse a [`FieldPath`] once and reuse it.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        FieldPath::parse(path).lookup(self)
    }

    /// The selection and rendering key of this row, if it has a usable `id`.
    pub fn key(&self) -> Option<RowKey> {
        self.0.get(ID_FIELD).and_then(value_key)
    }

    /// Sets the `id` field when the row is an object without one.
    /// Returns true if the row was changed.
    pub fn ensure_id(&mut self, id: usize) -> bool {
        match &mut self.0 {
            Value::Object(map) if !map.contains_key(ID_FIELD) => {
                map.insert(ID_FIELD.to_string(), Value::from(id));
                true
            }
            _ => false,
        }
    }
}

impl AsRef<Row> for Row {
    fn as_ref(&self) -> &Row {
        self
    }
}

impl From<Value> for Row {
    fn from(value: Value) -> Self {
        Row(value)
    }
}

fn value_key(value: &Value) -> Option<RowKey> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed selector path: `a.b`, `a[0].b`, `a["key with spaces"]`, `a.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    // None if the path is malformed. Such a path only matches a top-level
    // key spelled exactly like it.
    segments: Option<Vec<Segment>>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Self {
        FieldPath {
            raw: raw.to_string(),
            segments: parse_segments(raw),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn lookup<'r>(&self, row: &'r Row) -> Option<&'r Value> {
        // A literal top-level key wins over path interpretation ("a.b" as a key).
        if let Value::Object(map) = row.value()
            && let Some(value) = map.get(&self.raw)
        {
            return Some(value);
        }

        let segments = self.segments.as_ref()?;
        let mut current = row.value();
        for segment in segments {
            current = match (segment, current) {
                (Segment::Key(key), Value::Object(map)) => map.get(key)?,
                (Segment::Key(key), Value::Array(items)) => items.get(key.parse::<usize>().ok()?)?,
                (Segment::Index(idx), Value::Array(items)) => items.get(*idx)?,
                (Segment::Index(idx), Value::Object(map)) => map.get(&idx.to_string())?,
                _ => return None,
            };
        }
        Some(current)
    }
}

fn parse_segments(raw: &str) -> Option<Vec<Segment>> {
    if raw.is_empty() {
        return None;
    }

    let mut segments = Vec::new();
    let mut key = String::new();
    let mut after_bracket = false;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if !key.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut key)));
                } else if !after_bracket {
                    // ".a" or "a..b"
                    return None;
                }
                after_bracket = false;
                if chars.peek().is_none() {
                    return None;
                }
            }
            '[' => {
                if !key.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut key)));
                }
                let segment = match chars.peek() {
                    Some(&quote) if quote == '"' || quote == '\'' => {
                        chars.next();
                        let mut inner = String::new();
                        let mut closed = false;
                        for c in chars.by_ref() {
                            if c == quote {
                                closed = true;
                                break;
                            }
                            inner.push(c);
                        }
                        if !closed || chars.next() != Some(']') {
                            return None;
                        }
                        Segment::Key(inner)
                    }
                    _ => {
                        let mut inner = String::new();
                        let mut closed = false;
                        for c in chars.by_ref() {
                            if c == ']' {
                                closed = true;
                                break;
                            }
                            inner.push(c);
                        }
                        if !closed {
                            return None;
                        }
                        let inner = inner.trim();
                        match inner.parse::<usize>() {
                            Ok(idx) => Segment::Index(idx),
                            Err(_) if !inner.is_empty() => Segment::Key(inner.to_string()),
                            Err(_) => return None,
                        }
                    }
                };
                segments.push(segment);
                after_bracket = true;
            }
            _ => {
                // "a[0]b"
                if after_bracket {
                    return None;
                }
                key.push(c);
            }
        }
    }

    if !key.is_empty() {
        segments.push(Segment::Key(key));
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
        Value::Null => 5,
    }
}

/// Total ascending order over optional values.
///
/// booleans < numbers < strings < arrays < objects < null < absent.
/// Integers compare exactly, other numbers as f64 (`total_cmp`). Strings
/// compare by code point, arrays element-wise and objects are all equal.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_present(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                let ord = compare_present(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a.len().cmp(&b.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (as_integer(a), as_integer(b)) {
        return a.cmp(&b);
    }
    let a = a.as_f64().unwrap_or(f64::NAN);
    let b = b.as_f64().unwrap_or(f64::NAN);
    a.total_cmp(&b)
}

// Whole floats drop the trailing ".0", so a CSV weight of 22.0 reads "22".
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => f.to_string(),
        _ => n.to_string(),
    }
}

/// Text shown in a cell for an extracted value. Absent and null render empty.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => number_text(n),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Text a search keyword is compared against. Absent, null and composite
/// values have none and never match.
pub fn search_text(value: Option<&Value>) -> Option<Cow<'_, str>> {
    match value {
        Some(Value::String(s)) => Some(Cow::Borrowed(s.as_str())),
        Some(Value::Number(n)) => Some(Cow::Owned(number_text(n))),
        Some(Value::Bool(true)) => Some(Cow::Borrowed("true")),
        Some(Value::Bool(false)) => Some(Cow::Borrowed("false")),
        _ => None,
    }
}
