//! Tool dispatch.
//!
//! `ToolDispatcher` is the single entry point from the protocol layer: it resolves the
//! tool name against the catalog, validates the arguments against the tool's declared
//! schema, turns them into a typed [`ToolCall`] and routes it to a handler. Nothing
//! touches the connection pool until all of that has succeeded.

use crate::db::{ConnectionPool, Connector};
use crate::error::{DbError, DbResult};
use crate::models::{JsonObject, ToolDefinition, ToolName};
use crate::tools::catalog;
use crate::tools::query::{QueryArgs, QueryToolHandler};
use crate::tools::schema::{ListTablesArgs, SchemaToolHandler, TableArgs};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// A validated tool invocation with typed arguments.
#[derive(Debug, Clone)]
pub enum ToolCall {
    Query(QueryArgs),
    ListTables(ListTablesArgs),
    DescribeTable(TableArgs),
    GetTableStats(TableArgs),
}

impl ToolCall {
    /// Validate `arguments` against the catalog and build the typed call.
    pub fn parse(name: &str, arguments: &JsonObject) -> DbResult<Self> {
        let tool: ToolName = name.parse()?;
        let validated = catalog::definition(tool).validate(arguments)?;

        Ok(match tool {
            ToolName::Query => Self::Query(decode(tool, validated)?),
            ToolName::ListTables => Self::ListTables(decode(tool, validated)?),
            ToolName::DescribeTable => Self::DescribeTable(decode(tool, validated)?),
            ToolName::GetTableStats => Self::GetTableStats(decode(tool, validated)?),
        })
    }

    pub fn tool(&self) -> ToolName {
        match self {
            Self::Query(_) => ToolName::Query,
            Self::ListTables(_) => ToolName::ListTables,
            Self::DescribeTable(_) => ToolName::DescribeTable,
            Self::GetTableStats(_) => ToolName::GetTableStats,
        }
    }
}

fn decode<T: DeserializeOwned>(tool: ToolName, validated: JsonObject) -> DbResult<T> {
    serde_json::from_value(JsonValue::Object(validated)).map_err(|e| {
        DbError::invalid_arguments(format!("invalid arguments for tool '{}': {}", tool, e))
    })
}

/// Text payload returned to the caller for one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReport {
    pub text: String,
    pub is_error: bool,
}

impl ToolReport {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(err: &DbError) -> Self {
        Self {
            text: err.to_report(),
            is_error: true,
        }
    }
}

/// Routes named tool invocations to their handlers.
pub struct ToolDispatcher<C: Connector> {
    pool: Arc<ConnectionPool<C>>,
    query_handler: QueryToolHandler<C>,
    schema_handler: SchemaToolHandler<C>,
}

impl<C: Connector> ToolDispatcher<C> {
    pub fn new(pool: Arc<ConnectionPool<C>>) -> Self {
        Self {
            query_handler: QueryToolHandler::new(Arc::clone(&pool)),
            schema_handler: SchemaToolHandler::new(Arc::clone(&pool)),
            pool,
        }
    }

    /// Tool definitions to advertise.
    pub fn definitions(&self) -> &'static [ToolDefinition] {
        catalog::list_definitions()
    }

    pub fn pool(&self) -> &Arc<ConnectionPool<C>> {
        &self.pool
    }

    /// Validate and run one tool call.
    pub async fn invoke(&self, name: &str, arguments: &JsonObject) -> DbResult<String> {
        let call = ToolCall::parse(name, arguments)?;
        self.execute(call).await
    }

    /// Run an already validated call.
    pub async fn execute(&self, call: ToolCall) -> DbResult<String> {
        match call {
            ToolCall::Query(args) => self.query_handler.query(args).await,
            ToolCall::ListTables(args) => self.schema_handler.list_tables(args).await,
            ToolCall::DescribeTable(args) => self.schema_handler.describe_table(args).await,
            ToolCall::GetTableStats(args) => self.schema_handler.get_table_stats(args).await,
        }
    }

    /// Run one tool call, converting every failure into an error report.
    pub async fn call(&self, name: &str, arguments: &JsonObject) -> ToolReport {
        info!(tool = %name, "Tool called");
        debug!(tool = %name, arguments = %JsonValue::Object(arguments.clone()), "Tool arguments");

        let start = Instant::now();
        match self.invoke(name, arguments).await {
            Ok(text) => {
                debug!(
                    tool = %name,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Tool call completed"
                );
                ToolReport::success(text)
            }
            Err(e) => {
                error!(tool = %name, error = %e, "Error executing tool");
                ToolReport::error(&e)
            }
        }
    }
}
