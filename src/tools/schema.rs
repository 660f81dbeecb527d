//! Schema introspection tools.
//!
//! This module implements `list_tables`, `describe_table` and `get_table_stats`.
//! Catalog lookups are parameterized; the row count, which cannot take the table
//! name as a bind parameter, quotes both identifiers instead.

use crate::db::{ConnectionPool, Connector};
use crate::error::{DbError, DbResult};
use crate::models::{DEFAULT_SCHEMA, QueryParam, ResultSet};
use crate::tools::format::{
    TableSizes, format_value, render_table_description, render_table_list, render_table_stats,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

/// Input for the list_tables tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListTablesArgs {
    #[serde(default = "default_schema")]
    #[schemars(description = "Filter by schema name (default: public)")]
    pub schema: String,
}

/// Input for the describe_table and get_table_stats tools.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TableArgs {
    #[schemars(description = "Name of the table")]
    pub table: String,
    #[serde(default = "default_schema")]
    #[schemars(description = "Schema name (default: public)")]
    pub schema: String,
}

impl TableArgs {
    /// `schema.table` as shown in reports.
    pub fn display_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    /// `"schema"."table"`, safe to splice into SQL.
    pub fn quoted_name(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }
}

/// Quote a PostgreSQL identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub const LIST_TABLES: &str = r#"
        SELECT
            table_name::text AS table_name,
            table_type::text AS table_type
        FROM information_schema.tables
        WHERE table_schema = $1
        ORDER BY table_name
        "#;

    pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            column_name::text AS column_name,
            data_type::text AS data_type,
            is_nullable::text AS is_nullable,
            column_default::text AS column_default,
            character_maximum_length::int AS character_maximum_length
        FROM information_schema.columns
        WHERE table_schema = $1 AND table_name = $2
        ORDER BY ordinal_position
        "#;

    pub const TABLE_SIZES: &str = r#"
        SELECT
            pg_size_pretty(pg_total_relation_size($1::regclass)) AS total_size,
            pg_size_pretty(pg_relation_size($1::regclass)) AS table_size,
            pg_size_pretty(pg_indexes_size($1::regclass)) AS indexes_size
        "#;

    pub fn count_rows(quoted_table: &str) -> String {
        format!("SELECT COUNT(*) AS row_count FROM {}", quoted_table)
    }
}

pub struct SchemaToolHandler<C: Connector> {
    pool: Arc<ConnectionPool<C>>,
}

impl<C: Connector> SchemaToolHandler<C> {
    pub fn new(pool: Arc<ConnectionPool<C>>) -> Self {
        Self { pool }
    }

    pub async fn list_tables(&self, args: ListTablesArgs) -> DbResult<String> {
        let params = [QueryParam::from(args.schema.as_str())];
        let result = self.fetch(queries::LIST_TABLES, &params).await?;

        info!(schema = %args.schema, count = result.row_count(), "Listed tables");

        Ok(render_table_list(&args.schema, &result))
    }

    /// An unknown table is reported as "not found", not as an error.
    pub async fn describe_table(&self, args: TableArgs) -> DbResult<String> {
        let params = [
            QueryParam::from(args.schema.as_str()),
            QueryParam::from(args.table.as_str()),
        ];
        let result = self.fetch(queries::DESCRIBE_COLUMNS, &params).await?;

        info!(
            table = %args.display_name(),
            columns = result.row_count(),
            "Described table"
        );

        Ok(render_table_description(&args.schema, &args.table, &result))
    }

    /// Row count and on-disk sizes. Both lookups share one lease.
    pub async fn get_table_stats(&self, args: TableArgs) -> DbResult<String> {
        let display_name = args.display_name();
        let quoted = args.quoted_name();

        let stats_error = |e: DbError| match e {
            DbError::QueryExecution { message, .. } => DbError::table_stats(&display_name, message),
            other => other,
        };

        let mut conn = self.pool.lease().await?;
        let counted = conn
            .fetch(&queries::count_rows(&quoted), &[], Some(1))
            .await
            .map_err(&stats_error)?;
        let sized = conn
            .fetch(queries::TABLE_SIZES, &[QueryParam::from(quoted)], Some(1))
            .await
            .map_err(&stats_error)?;
        drop(conn);

        let row_count = counted
            .first_row()
            .and_then(|row| counted.value(row, "row_count").as_i64())
            .ok_or_else(|| DbError::table_stats(&display_name, "row count query returned no value"))?;

        let sizes = sized
            .first_row()
            .map(|row| TableSizes {
                total: format_value(sized.value(row, "total_size")),
                table: format_value(sized.value(row, "table_size")),
                indexes: format_value(sized.value(row, "indexes_size")),
            })
            .ok_or_else(|| DbError::table_stats(&display_name, "size query returned no rows"))?;

        info!(table = %display_name, row_count = row_count, "Collected table statistics");

        Ok(render_table_stats(&args.schema, &args.table, row_count, &sizes))
    }

    async fn fetch(&self, sql: &str, params: &[QueryParam]) -> DbResult<ResultSet> {
        let mut conn = self.pool.lease().await?;
        conn.fetch(sql, params, None).await
    }
}
