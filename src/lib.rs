//! Read-only PostgreSQL MCP server library.
//!
//! This library exposes a fixed set of read-only database tools (`query`,
//! `list_tables`, `describe_table`, `get_table_stats`) to AI assistants over MCP,
//! and guarantees that no tool call can modify the database.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::{DbError, DbResult};
pub use mcp::DbService;
