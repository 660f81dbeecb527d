//! Stdio transport for the MCP server.
//!
//! This transport uses standard input/output for communication,
//! which is the standard mode for CLI-based MCP integrations.

use crate::db::{ConnectionPool, Connector};
use crate::error::{DbError, DbResult};
use crate::mcp::DbService;
use crate::tools::ToolDispatcher;
use crate::transport::Transport;
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Stdio transport implementation.
///
/// Reads JSON-RPC messages from stdin and writes responses to stdout. The pool is
/// closed when the client disconnects or a shutdown signal arrives.
pub struct StdioTransport<C: Connector> {
    pool: Arc<ConnectionPool<C>>,
}

impl<C: Connector> StdioTransport<C> {
    pub fn new(pool: Arc<ConnectionPool<C>>) -> Self {
        Self { pool }
    }
}

impl<C: Connector> Transport for StdioTransport<C> {
    async fn run(&self) -> DbResult<()> {
        info!("Starting MCP server with stdio transport");

        let dispatcher = Arc::new(ToolDispatcher::new(Arc::clone(&self.pool)));
        let service = DbService::new(dispatcher);

        let running_service = match service.serve(stdio()).await {
            Ok(running) => running,
            Err(e) => {
                self.pool.close_all().await;
                return Err(DbError::internal(format!(
                    "Failed to start stdio transport: {}",
                    e
                )));
            }
        };

        let mut outcome = Ok(());
        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(quit_reason) => {
                        info!(reason = ?quit_reason, "Stdio transport completed normally");
                    }
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        outcome = Err(DbError::internal(format!("Stdio transport error: {}", e)));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if shutdown_requested {
            tokio::spawn(async {
                wait_for_signal().await;
                warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });
        }

        // Runs on every exit path, including transport errors.
        self.pool.close_all().await;

        if shutdown_requested {
            // tokio::select! cannot interrupt a blocking stdin read.
            info!("Exiting process");
            std::process::exit(0);
        }

        outcome
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }
}
