//! Query-related data models.
//!
//! This module defines query parameters and the rectangular result set that flows
//! from a backend session into the result formatter.

use serde_json::Value as JsonValue;

/// Default row limit appended to queries without a limiting clause.
pub const DEFAULT_ROW_LIMIT: u32 = 100;

/// Maximum allowed row limit. Larger requests are clamped, never rejected.
pub const MAX_ROW_LIMIT: u32 = 1000;

/// Default per-command timeout in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Schema used when a tool call does not name one.
pub const DEFAULT_SCHEMA: &str = "public";

static NULL: JsonValue = JsonValue::Null;

/// A text value bound to a `$n` placeholder.
///
/// Catalog lookups only ever bind schema and table names, so parameters are text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam(String);

impl QueryParam {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QueryParam {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One result row; values are positional and line up with `ResultSet::columns`.
pub type Row = Vec<JsonValue>;

/// Rows produced by a single query execution, consumed once by the formatter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// True if the backend had more rows than the fetch cap allowed.
    pub truncated: bool,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            truncated: false,
        }
    }

    /// Create an empty result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a result from rows fetched with a cap of `max_rows`.
    ///
    /// Callers fetch one row past the cap; its presence marks the result truncated.
    pub fn capped(columns: Vec<String>, mut rows: Vec<Row>, max_rows: Option<usize>) -> Self {
        let truncated = match max_rows {
            Some(max) if rows.len() > max => {
                rows.truncate(max);
                true
            }
            _ => false,
        };
        Self {
            columns,
            rows,
            truncated,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of `column` in `row`, or NULL when the column is absent.
    pub fn value<'a>(&self, row: &'a Row, column: &str) -> &'a JsonValue {
        self.column_index(column)
            .and_then(|idx| row.get(idx))
            .unwrap_or(&NULL)
    }

    pub fn first_row(&self) -> Option<&Row> {
        self.rows.first()
    }
}
