//! MCP service implementation using rmcp.
//!
//! This module defines the `DbService` struct that exposes the tool catalog over the
//! MCP protocol. Tools are listed from the catalog and every call is forwarded to the
//! `ToolDispatcher`, so a failing tool produces an error payload rather than a
//! protocol error.

use crate::db::{Connector, PgConnector};
use crate::models::ToolDefinition;
use crate::tools::{ToolDispatcher, ToolReport};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
};
use std::sync::Arc;

const INSTRUCTIONS: &str = "Read-only tools for exploring a PostgreSQL database.\n\
    \n\
    ## Workflow\n\
    1. Call `list_tables` to see the tables of a schema (default: public)\n\
    2. Call `describe_table` to see the columns of a table\n\
    3. Call `get_table_stats` for row count and on-disk size\n\
    4. Call `query` with a SELECT statement to read data\n\
    \n\
    ## Query Rules\n\
    - Only read-only statements are accepted. Statements containing INSERT, UPDATE, \
    DELETE, DROP, CREATE, ALTER, TRUNCATE, REPLACE, GRANT, REVOKE, EXEC or EXECUTE are \
    rejected, even inside string literals.\n\
    - A `LIMIT` is appended when the statement has none (default 100, maximum 1000).\n\
    - At most 1000 rows are returned per query.";

pub struct DbService<C: Connector = PgConnector> {
    dispatcher: Arc<ToolDispatcher<C>>,
}

impl<C: Connector> Clone for DbService<C> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<C: Connector> DbService<C> {
    /// Create a new DbService instance.
    pub fn new(dispatcher: Arc<ToolDispatcher<C>>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<ToolDispatcher<C>> {
        &self.dispatcher
    }

    /// Tools as advertised over MCP.
    pub fn tools(&self) -> Vec<Tool> {
        self.dispatcher.definitions().iter().map(to_mcp_tool).collect()
    }
}

fn to_mcp_tool(definition: &ToolDefinition) -> Tool {
    Tool::new(
        definition.name.as_str(),
        definition.description,
        Arc::new(definition.input_schema.clone()),
    )
}

fn to_call_result(report: ToolReport) -> CallToolResult {
    let content = vec![Content::text(report.text)];
    if report.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

impl<C: Connector> ServerHandler for DbService<C> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_owned(),
                title: Some("PostgreSQL Read-Only MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.unwrap_or_default();
        let report = self.dispatcher.call(&request.name, &arguments).await;
        Ok(to_call_result(report))
    }
}
