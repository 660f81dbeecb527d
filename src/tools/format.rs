//! Result formatting for MCP tools.
//!
//! Every tool answers with markdown text. Rendering is deterministic: column order,
//! row order and the textual form of each value depend only on the input, so callers
//! can assert on exact output.

use crate::models::{MAX_ROW_LIMIT, ResultSet, Row};
use serde_json::Value as JsonValue;

pub const NO_ROWS_MESSAGE: &str = "Query executed successfully. No rows returned.";

/// How the separator row under a table header is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorStyle {
    /// `|---|---|` regardless of header width.
    Short,
    /// Dashes spanning each padded header cell, e.g. `|--------|` under `| Column |`.
    Fitted,
}

/// Stringify a single value. NULL renders as the `NULL` sentinel.
pub fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(arr) => serde_json::to_string(arr).unwrap_or_default(),
        JsonValue::Object(obj) => serde_json::to_string(obj).unwrap_or_default(),
    }
}

/// Make text safe for a single markdown table cell.
pub fn escape_cell(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '|' => escaped.push_str("\\|"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                escaped.push(' ');
            }
            '\n' => escaped.push(' '),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Render a markdown table with one line per row. No summary is appended.
pub fn render_table<H, R>(headers: &[H], rows: R, style: SeparatorStyle) -> String
where
    H: AsRef<str>,
    R: IntoIterator<Item = Vec<String>>,
{
    let mut lines = Vec::new();
    lines.push(table_line(headers.iter().map(|h| escape_cell(h.as_ref()))));

    let separator: String = headers
        .iter()
        .map(|h| match style {
            SeparatorStyle::Short => "|---".to_string(),
            SeparatorStyle::Fitted => format!("|{}", "-".repeat(h.as_ref().chars().count() + 2)),
        })
        .collect();
    lines.push(separator + "|");

    for row in rows {
        lines.push(table_line(row.iter().map(|cell| escape_cell(cell))));
    }
    lines.join("\n")
}

fn table_line(cells: impl Iterator<Item = String>) -> String {
    let cells: Vec<String> = cells.collect();
    format!("| {} |", cells.join(" | "))
}

/// Render an arbitrary result set followed by a `**Rows returned**` summary.
pub fn render(columns: &[String], rows: &[Row]) -> String {
    let cells = rows.iter().map(|row| {
        (0..columns.len())
            .map(|idx| format_value(row.get(idx).unwrap_or(&JsonValue::Null)))
            .collect::<Vec<String>>()
    });
    let table = render_table(columns, cells, SeparatorStyle::Short);
    format!("{}\n\n**Rows returned**: {}", table, rows.len())
}

/// Report for the `query` tool.
pub fn render_query_result(result: &ResultSet) -> String {
    if result.is_empty() {
        return NO_ROWS_MESSAGE.to_string();
    }
    let mut report = render(&result.columns, &result.rows);
    if result.truncated {
        report.push_str(&format!("\n*Results truncated to {} rows*", MAX_ROW_LIMIT));
    }
    report
}

/// Report for `list_tables`. Expects `table_name` and `table_type` columns.
pub fn render_table_list(schema: &str, result: &ResultSet) -> String {
    if result.is_empty() {
        return format!("No tables found in schema '{}'", schema);
    }
    let rows = result.rows.iter().map(|row| {
        vec![
            format_value(result.value(row, "table_name")),
            format_value(result.value(row, "table_type")),
        ]
    });
    let table = render_table(&["Table Name", "Type"], rows, SeparatorStyle::Fitted);
    format!("{}\n\n**Total tables**: {}", table, result.row_count())
}

/// Report for `describe_table`. Expects the `information_schema.columns` shape.
pub fn render_table_description(schema: &str, table: &str, result: &ResultSet) -> String {
    if result.is_empty() {
        return format!("Table '{}.{}' not found", schema, table);
    }
    let rows = result.rows.iter().map(|row| {
        let mut column_type = format_value(result.value(row, "data_type"));
        match result.value(row, "character_maximum_length") {
            JsonValue::Null => {}
            max_length => column_type.push_str(&format!("({})", format_value(max_length))),
        }

        let nullable = match result.value(row, "is_nullable").as_str() {
            Some("YES") => "Yes",
            _ => "No",
        };

        let default = match result.value(row, "column_default") {
            JsonValue::Null => "-".to_string(),
            JsonValue::String(s) if s.is_empty() => "-".to_string(),
            value => format_value(value),
        };

        vec![
            format_value(result.value(row, "column_name")),
            column_type,
            nullable.to_string(),
            default,
        ]
    });
    let rendered = render_table(
        &["Column", "Type", "Nullable", "Default"],
        rows,
        SeparatorStyle::Fitted,
    );
    format!("## Table: {}.{}\n\n{}", schema, table, rendered)
}

/// Size figures for `get_table_stats`, already human-readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSizes {
    pub total: String,
    pub table: String,
    pub indexes: String,
}

/// Report for `get_table_stats`.
pub fn render_table_stats(schema: &str, table: &str, row_count: i64, sizes: &TableSizes) -> String {
    format!(
        "## Table Statistics: {}.{}\n\n\
         **Row Count**: {}\n\
         **Total Size**: {}\n\
         **Table Size**: {}\n\
         **Indexes Size**: {}\n",
        schema,
        table,
        format_thousands(row_count),
        sizes.total,
        sizes.table,
        sizes.indexes
    )
}

/// Group digits in threes: `1234567` -> `1,234,567`.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
