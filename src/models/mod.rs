//! Data models for the read-only gateway.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;
pub mod tool;

// Re-export commonly used types
pub use query::{
    DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_ROW_LIMIT, DEFAULT_SCHEMA, MAX_ROW_LIMIT, QueryParam,
    ResultSet, Row,
};
pub use tool::{FieldSchema, FieldType, JsonObject, ToolDefinition, ToolName};
