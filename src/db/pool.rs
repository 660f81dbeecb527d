//! Bounded connection pool.
//!
//! The pool owns every backend session. Operations lease one session at a time
//! through [`ConnectionPool::lease`]; the returned [`PooledConnection`] hands the
//! session back when dropped, on success and error paths alike.
//!
//! # Behavior
//!
//! - At most `max_connections` sessions are leased at once. Further callers wait on a
//!   fair semaphore until a lease is released (back-pressure, never rejection).
//! - `min_connections` sessions are opened eagerly; failure there is a
//!   `PoolInitialization` error and is not retried.
//! - Every command runs under `command_timeout`. A session whose command timed out, or
//!   which reported a connection-level error, is dropped instead of being reused.
//! - [`ConnectionPool::close_all`] waits for in-flight leases, then closes every idle
//!   session. Leases requested after that point fail.

use crate::config::{DEFAULT_MAX_CONNECTIONS, DEFAULT_MIN_CONNECTIONS};
use crate::error::{DbError, DbResult};
use crate::models::{DEFAULT_COMMAND_TIMEOUT_SECS, QueryParam, ResultSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// One live backend session.
pub trait Session: Send + 'static {
    /// Run `sql` and collect at most `max_rows` rows (all rows when `None`).
    fn fetch(
        &mut self,
        sql: &str,
        params: &[QueryParam],
        max_rows: Option<usize>,
    ) -> impl Future<Output = DbResult<ResultSet>> + Send;

    /// Gracefully terminate the session.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Opens backend sessions for the pool.
pub trait Connector: Send + Sync + 'static {
    type Session: Session;

    fn connect(&self) -> impl Future<Output = DbResult<Self::Session>> + Send;

    /// Human-readable connection target for logs. Must not contain secrets.
    fn describe(&self) -> String;
}

/// Pool sizing and timeout settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub min_connections: u32,
    pub max_connections: u32,
    pub command_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: DEFAULT_MIN_CONNECTIONS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
        }
    }
}

impl PoolConfig {
    /// Validate pool settings.
    pub fn validate(&self) -> DbResult<()> {
        let invalid = |message: String| {
            DbError::pool_initialization(message, "Adjust the pool settings and restart")
        };

        if self.max_connections == 0 {
            return Err(invalid("max_connections must be greater than 0".to_string()));
        }
        if self.min_connections > self.max_connections {
            return Err(invalid(format!(
                "min_connections ({}) cannot exceed max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        if self.command_timeout.is_zero() {
            return Err(invalid("command_timeout must be greater than 0".to_string()));
        }
        Ok(())
    }
}

pub struct ConnectionPool<C: Connector> {
    connector: C,
    config: PoolConfig,
    idle: Mutex<Vec<C::Session>>,
    permits: Arc<Semaphore>,
    /// Live sessions, idle and leased.
    size: AtomicUsize,
    closed: AtomicBool,
}

impl<C: Connector> std::fmt::Debug for ConnectionPool<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("target", &self.connector.describe())
            .field("config", &self.config)
            .field("size", &self.size())
            .field("idle", &self.idle_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<C: Connector> ConnectionPool<C> {
    /// Open the pool and its `min_connections` initial sessions.
    pub async fn connect(connector: C, config: PoolConfig) -> DbResult<Arc<Self>> {
        config.validate()?;

        info!(
            database = %connector.describe(),
            min_connections = config.min_connections,
            max_connections = config.max_connections,
            command_timeout_secs = config.command_timeout.as_secs(),
            "Initializing database connection pool"
        );

        let mut sessions = Vec::with_capacity(config.min_connections as usize);
        for _ in 0..config.min_connections {
            match connector.connect().await {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    for session in sessions {
                        session.close().await;
                    }
                    let suggestion = e.suggestion().map(str::to_string).unwrap_or_else(|| {
                        "Check that the PostgreSQL server is running and DATABASE_URL is correct"
                            .to_string()
                    });
                    return Err(DbError::pool_initialization(e.to_string(), suggestion));
                }
            }
        }

        let pool = Arc::new(Self {
            connector,
            config,
            size: AtomicUsize::new(sessions.len()),
            idle: Mutex::new(sessions),
            permits: Arc::new(Semaphore::new(config.max_connections as usize)),
            closed: AtomicBool::new(false),
        });

        info!(size = pool.size(), "Database connection pool initialized");
        Ok(pool)
    }

    /// Lease a session, waiting while all `max_connections` are in use.
    pub async fn lease(self: &Arc<Self>) -> DbResult<PooledConnection<C>> {
        if self.is_closed() {
            return Err(pool_closed());
        }

        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| pool_closed())?;

        if self.is_closed() {
            return Err(pool_closed());
        }

        let session = match self.take_idle() {
            Some(session) => session,
            None => {
                let session = match timeout(self.config.command_timeout, self.connector.connect())
                    .await
                {
                    Ok(result) => result?,
                    Err(_) => {
                        return Err(DbError::command_timeout(
                            "connect",
                            self.config.command_timeout.as_secs(),
                        ));
                    }
                };
                let size = self.size.fetch_add(1, Ordering::AcqRel) + 1;
                debug!(size = size, "Opened new pooled connection");
                session
            }
        };

        Ok(PooledConnection {
            pool: Arc::clone(self),
            session: Some(session),
            discard: false,
            _permit: permit,
        })
    }

    /// Wait for in-flight leases, then close every pooled session.
    pub async fn close_all(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!("Connection pool already closed");
            return;
        }

        info!("Closing database connection pool");

        // Holding every permit means no lease is outstanding.
        let drained = self
            .permits
            .acquire_many(self.config.max_connections)
            .await
            .ok();
        self.permits.close();

        let sessions = std::mem::take(&mut *self.idle.lock().unwrap_or_else(PoisonError::into_inner));
        let count = sessions.len();
        for session in sessions {
            session.close().await;
        }
        self.size.store(0, Ordering::Release);
        drop(drained);

        info!(closed = count, "All database connections closed");
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Number of live sessions (idle and leased).
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn take_idle(&self) -> Option<C::Session> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).pop()
    }

    fn give_back(&self, session: C::Session, discard: bool) {
        if discard {
            // Dropping the session tears down the socket without reusing it.
            drop(session);
            let size = self.size.fetch_sub(1, Ordering::AcqRel).saturating_sub(1);
            warn!(size = size, "Discarded pooled connection after failed command");
            return;
        }
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(session);
    }
}

fn pool_closed() -> DbError {
    DbError::connection("Connection pool is closed", "The server is shutting down")
}

/// RAII lease of one pooled session.
///
/// Dropping the lease returns the session to the pool, or discards it when a command
/// on it timed out or failed at the connection level. The pool permit is released
/// after the session is back, so a waiting caller always finds it.
pub struct PooledConnection<C: Connector> {
    pool: Arc<ConnectionPool<C>>,
    session: Option<C::Session>,
    discard: bool,
    _permit: OwnedSemaphorePermit,
}

impl<C: Connector> std::fmt::Debug for PooledConnection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("discard", &self.discard)
            .finish_non_exhaustive()
    }
}

impl<C: Connector> PooledConnection<C> {
    /// Run a command on the leased session under the pool's command timeout.
    pub async fn fetch(
        &mut self,
        sql: &str,
        params: &[QueryParam],
        max_rows: Option<usize>,
    ) -> DbResult<ResultSet> {
        let command_timeout = self.pool.config.command_timeout;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| DbError::internal("Pooled connection used after release"))?;

        let result = match timeout(command_timeout, session.fetch(sql, params, max_rows)).await {
            Ok(result) => result,
            Err(_) => Err(DbError::command_timeout(
                "query execution",
                command_timeout.as_secs(),
            )),
        };

        if let Err(e) = &result {
            if e.discards_connection() {
                self.discard = true;
            }
        }
        result
    }
}

impl<C: Connector> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.pool.give_back(session, self.discard);
        }
    }
}
