//! Query execution tool.
//!
//! This module implements the `query` MCP tool for executing read-only SQL.
//! Statements are classified before a connection is leased; anything containing a
//! write, DDL, privilege or procedure keyword is rejected without touching the database.

use crate::db::{ConnectionPool, Connector};
use crate::error::{DbError, DbResult};
use crate::models::{DEFAULT_ROW_LIMIT, MAX_ROW_LIMIT};
use crate::tools::format::render_query_result;
use crate::tools::sql_validator;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

fn default_limit() -> i64 {
    i64::from(DEFAULT_ROW_LIMIT)
}

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryArgs {
    #[schemars(description = "The SQL query to execute (must be a SELECT statement)")]
    pub sql: String,
    /// Reduced to `MAX_ROW_LIMIT` when larger.
    #[serde(default = "default_limit")]
    #[schemars(
        description = "Maximum number of rows to return (default: 100, max: 1000)",
        range(min = 0)
    )]
    pub limit: i64,
}

/// Row limit actually applied for a requested `limit`.
///
/// Values above `MAX_ROW_LIMIT` are reduced to it. Zero is kept and yields no rows.
pub fn effective_limit(requested: i64) -> DbResult<u32> {
    if requested < 0 {
        return Err(DbError::invalid_arguments(format!(
            "argument 'limit' must not be negative, got {}",
            requested
        )));
    }
    // Lossless: the value is within 0..=MAX_ROW_LIMIT.
    Ok(requested.min(i64::from(MAX_ROW_LIMIT)) as u32)
}

/// Append `LIMIT <limit>` unless the statement already has a limiting clause.
///
/// Trailing semicolons are removed first so the clause stays inside the statement.
/// Comments and literals are ignored when looking for an existing `LIMIT`.
pub fn apply_limit(sql: &str, limit: u32) -> String {
    let statement = sql.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace());

    if sql_validator::scan(statement).has_limit {
        return statement.to_string();
    }

    // A trailing line comment would swallow a clause appended on the same line.
    let ends_in_line_comment = statement
        .lines()
        .last()
        .is_some_and(|line| line.contains("--"));
    let separator = if ends_in_line_comment { "\n" } else { " " };

    format!("{}{}LIMIT {}", statement, separator, limit)
}

/// Handler for query execution.
pub struct QueryToolHandler<C: Connector> {
    pool: Arc<ConnectionPool<C>>,
}

impl<C: Connector> QueryToolHandler<C> {
    /// Create a new query tool handler.
    pub fn new(pool: Arc<ConnectionPool<C>>) -> Self {
        Self { pool }
    }

    /// Handle the query tool call.
    ///
    /// The statement is classified first; an unsafe statement never reaches the pool.
    /// At most `MAX_ROW_LIMIT` rows are read back, whatever limit the SQL itself names.
    pub async fn query(&self, args: QueryArgs) -> DbResult<String> {
        let sql = args.sql.trim();
        if sql.is_empty() {
            return Err(DbError::invalid_arguments("argument 'sql' must not be empty"));
        }

        sql_validator::validate_readonly(sql)?;

        if sql_validator::scan(sql).statement_count > 1 {
            return Err(DbError::invalid_arguments(
                "argument 'sql' must contain a single statement",
            ));
        }

        let limit = effective_limit(args.limit)?;
        if i64::from(limit) != args.limit {
            debug!(requested = args.limit, effective = limit, "Row limit reduced to maximum");
        }

        let statement = apply_limit(sql, limit);
        debug!(sql = %statement, "Executing query");

        let mut conn = self.pool.lease().await?;
        let result = conn
            .fetch(&statement, &[], Some(MAX_ROW_LIMIT as usize))
            .await?;
        drop(conn);

        if result.truncated {
            warn!(max_rows = MAX_ROW_LIMIT, "Query result truncated");
        }
        info!(
            row_count = result.row_count(),
            truncated = result.truncated,
            "Query executed"
        );

        Ok(render_query_result(&result))
    }
}
