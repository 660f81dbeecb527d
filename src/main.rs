//! pg-readonly-mcp - Main entry point.
//!
//! Starts an MCP server on stdio that exposes read-only tools for one PostgreSQL
//! database.

use pg_readonly_mcp::config::Config;
use pg_readonly_mcp::db::{ConnectionPool, PgConnector};
use pg_readonly_mcp::transport::{StdioTransport, Transport};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries the MCP protocol.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_filter()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse_args();

    init_tracing(&config);

    info!("Starting pg-readonly-mcp v{}", env!("CARGO_PKG_VERSION"));

    let target = match config.connection_target() {
        Ok(target) => target,
        Err(e) => {
            error!(error = %e, "Invalid DATABASE_URL");
            return Err(e.into());
        }
    };

    // The pool must be up before any tool call is accepted.
    let pool = match ConnectionPool::connect(PgConnector::new(target), config.pool_config()).await
    {
        Ok(pool) => pool,
        Err(e) => {
            error!(
                error = %e,
                suggestion = e.suggestion().unwrap_or_default(),
                "Failed to initialize database pool"
            );
            return Err(e.into());
        }
    };

    let transport = StdioTransport::new(pool);
    info!(transport = transport.name(), "Using stdio transport");

    if let Err(e) = transport.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
