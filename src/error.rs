//! Error types for the read-only gateway.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Every variant renders an actionable message, because at the tool boundary the error
//! is shown to the caller as text rather than propagated as a driver error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Only SELECT queries are allowed (found forbidden keyword {keyword})")]
    UnsafeQuery { keyword: String },

    #[error("Query error: {message}")]
    QueryExecution {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
    },

    #[error("Error getting table stats for {table}: {message}")]
    TableStats { table: String, message: String },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    CommandTimeout {
        operation: String,
        elapsed_secs: u64,
    },

    #[error("Failed to initialize database pool: {message}")]
    PoolInitialization { message: String, suggestion: String },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create an unknown tool error.
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool { name: name.into() }
    }

    /// Create an invalid arguments error.
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create an unsafe query error naming the keyword that triggered it.
    pub fn unsafe_query(keyword: impl Into<String>) -> Self {
        Self::UnsafeQuery {
            keyword: keyword.into(),
        }
    }

    /// Create a query execution error with optional SQL state.
    pub fn query_execution(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::QueryExecution {
            message: message.into(),
            sql_state,
        }
    }

    /// Create a table statistics error.
    pub fn table_stats(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TableStats {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a command timeout error.
    pub fn command_timeout(operation: impl Into<String>, elapsed_secs: u64) -> Self {
        Self::CommandTimeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create a pool initialization error with a helpful suggestion.
    pub fn pool_initialization(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::PoolInitialization {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::PoolInitialization { suggestion, .. } => Some(suggestion),
            Self::Connection { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// True only for errors that must abort process startup.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PoolInitialization { .. })
    }

    /// True if a connection that produced this error must not be handed out again.
    pub fn discards_connection(&self) -> bool {
        matches!(self, Self::CommandTimeout { .. } | Self::Connection { .. })
    }

    /// Message to show the caller, with SQLSTATE and suggestion appended when known.
    pub fn to_report(&self) -> String {
        let base = match self {
            Self::QueryExecution {
                sql_state: Some(code),
                ..
            } => format!("{} (SQLSTATE: {})", self, code),
            _ => self.to_string(),
        };
        match self.suggestion() {
            Some(suggestion) => format!("Error: {}. {}", base, suggestion),
            None => format!("Error: {}", base),
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::query_execution(db_err.message(), code)
            }
            sqlx::Error::RowNotFound => DbError::query_execution("No rows returned", None),
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::TypeNotFound { type_name } => {
                DbError::query_execution(format!("Type not found: {}", type_name), None)
            }
            sqlx::Error::ColumnNotFound(col) => {
                DbError::query_execution(format!("Column not found: {}", col), None)
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => DbError::query_execution(
                format!("Failed to decode column {}: {}", index, source),
                None,
            ),
            sqlx::Error::Decode(source) => {
                DbError::query_execution(format!("Decode error: {}", source), None)
            }
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::query_execution(format!("Unknown database error: {}", err), None),
        }
    }
}

/// Result type alias for gateway operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_error_suggestion() {
        let err = DbError::pool_initialization("refused", "Check that PostgreSQL is running");
        assert_eq!(err.suggestion(), Some("Check that PostgreSQL is running"));
        assert_eq!(DbError::unknown_tool("x").suggestion(), None);
    }

    #[test]
    fn test_only_pool_initialization_is_fatal() {
        assert!(DbError::pool_initialization("down", "start it").is_fatal());
        assert!(!DbError::command_timeout("query execution", 30).is_fatal());
        assert!(!DbError::query_execution("syntax error", None).is_fatal());
        assert!(!DbError::unsafe_query("DROP").is_fatal());
    }

    #[test]
    fn test_discards_connection() {
        assert!(DbError::command_timeout("query execution", 30).discards_connection());
        assert!(DbError::connection("reset", "retry").discards_connection());
        assert!(!DbError::query_execution("relation does not exist", None).discards_connection());
    }

    #[test]
    fn test_report_includes_sql_state() {
        let err = DbError::query_execution(
            "relation \"missing\" does not exist",
            Some("42P01".to_string()),
        );
        assert_eq!(
            err.to_report(),
            "Error: Query error: relation \"missing\" does not exist (SQLSTATE: 42P01)"
        );
    }

    #[test]
    fn test_report_for_unsafe_query() {
        let err = DbError::unsafe_query("DELETE");
        assert!(err.to_report().starts_with("Error: Only SELECT queries are allowed"));
        assert!(err.to_report().contains("DELETE"));
    }

    #[test]
    fn test_report_appends_suggestion() {
        let err = DbError::connection("Connection pool is closed", "Restart the server");
        assert_eq!(
            err.to_report(),
            "Error: Connection failed: Connection pool is closed. Restart the server"
        );
    }

    #[test]
    fn test_row_not_found_maps_to_query_execution() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::QueryExecution { .. }));
    }

    #[test]
    fn test_io_error_discards_connection() {
        let err: DbError = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "broken pipe",
        ))
        .into();
        assert!(matches!(err, DbError::Connection { .. }));
        assert!(err.discards_connection());
    }
}
