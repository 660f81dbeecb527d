//! Database access layer.
//!
//! This module provides database access functionality:
//! - Bounded connection pool with leases and command timeouts
//! - PostgreSQL sessions behind the pool's `Connector` seam
//! - Type mappings from PostgreSQL rows to JSON values

pub mod pool;
pub mod postgres;
pub mod types;

pub use pool::{ConnectionPool, Connector, PoolConfig, PooledConnection, Session};
pub use postgres::{PgConnector, PgSession};
