//! MCP tool implementations.
//!
//! This module contains all database tool handlers:
//! - `query`: Execute read-only SQL
//! - `list_tables`: List tables in a schema
//! - `describe_table`: Get column information for a table
//! - `get_table_stats`: Row count and on-disk sizes of a table
//! - `sql_validator`: Keyword classification for read-only enforcement
//! - `catalog`: Declared input schemas of every tool
//! - `dispatcher`: Name and argument validation, routing, error reports
//! - `format`: Markdown rendering of results

pub mod catalog;
pub mod dispatcher;
pub mod format;
pub mod query;
pub mod schema;
pub mod sql_validator;

pub use catalog::list_definitions;
pub use dispatcher::{ToolCall, ToolDispatcher, ToolReport};
pub use query::{QueryArgs, QueryToolHandler};
pub use schema::{ListTablesArgs, SchemaToolHandler, TableArgs};
pub use sql_validator::{QueryVerdict, classify};
