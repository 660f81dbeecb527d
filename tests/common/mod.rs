//! Shared test helpers: an in-memory connector with scripted responses.
//!
//! Every statement a session receives is recorded, so tests can assert on the exact
//! SQL sent to the backend (or on the absence of any backend call).

#![allow(dead_code)]

use pg_readonly_mcp::db::{ConnectionPool, Connector, PoolConfig, Session};
use pg_readonly_mcp::error::{DbError, DbResult};
use pg_readonly_mcp::models::{QueryParam, ResultSet};
use pg_readonly_mcp::tools::ToolDispatcher;
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted answer for statements containing a given substring.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Rows(ResultSet),
    /// Backend error with an optional SQLSTATE.
    Error {
        message: String,
        sql_state: Option<String>,
    },
    /// Sleep before answering with an empty result.
    Sleep(Duration),
}

/// One statement received by a mock session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub session: usize,
    pub sql: String,
    pub params: Vec<QueryParam>,
    pub max_rows: Option<usize>,
}

#[derive(Debug, Default)]
pub struct MockState {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<Vec<(String, MockResponse)>>,
    delay: Mutex<Duration>,
    pub fail_connect: AtomicBool,
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
}

impl MockState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer statements containing `pattern` with `response`. First match wins.
    pub fn respond(&self, pattern: &str, response: MockResponse) {
        self.responses
            .lock()
            .unwrap()
            .push((pattern.to_string(), response));
    }

    pub fn respond_rows(&self, pattern: &str, result: ResultSet) {
        self.respond(pattern, MockResponse::Rows(result));
    }

    pub fn respond_error(&self, pattern: &str, message: &str, sql_state: Option<&str>) {
        self.respond(
            pattern,
            MockResponse::Error {
                message: message.to_string(),
                sql_state: sql_state.map(str::to_string),
            },
        );
    }

    /// Delay applied to every statement.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.sql).collect()
    }

    fn response_for(&self, sql: &str) -> Option<MockResponse> {
        self.responses
            .lock()
            .unwrap()
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
    }
}

/// Decrements the active counter even when the fetch future is cancelled.
struct ActiveGuard(Arc<MockState>);

impl ActiveGuard {
    fn enter(state: &Arc<MockState>) -> Self {
        let now = state.active.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_active.fetch_max(now, Ordering::SeqCst);
        Self(Arc::clone(state))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct MockConnector {
    pub state: Arc<MockState>,
}

impl MockConnector {
    pub fn new(state: Arc<MockState>) -> Self {
        Self { state }
    }
}

impl Connector for MockConnector {
    type Session = MockSession;

    async fn connect(&self) -> DbResult<MockSession> {
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(DbError::connection(
                "Failed to connect: Connection refused (os error 111)",
                "Check that the PostgreSQL server is running and accessible",
            ));
        }
        let id = self.state.connects.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MockSession {
            id,
            state: Arc::clone(&self.state),
        })
    }

    fn describe(&self) -> String {
        "postgres://mock@localhost:5432/mock".to_string()
    }
}

#[derive(Debug)]
pub struct MockSession {
    pub id: usize,
    state: Arc<MockState>,
}

impl Session for MockSession {
    async fn fetch(
        &mut self,
        sql: &str,
        params: &[QueryParam],
        max_rows: Option<usize>,
    ) -> DbResult<ResultSet> {
        let _active = ActiveGuard::enter(&self.state);
        self.state.calls.lock().unwrap().push(RecordedCall {
            session: self.id,
            sql: sql.to_string(),
            params: params.to_vec(),
            max_rows,
        });

        let delay = *self.state.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match self.state.response_for(sql) {
            Some(MockResponse::Rows(result)) => Ok(ResultSet::capped(
                result.columns,
                result.rows,
                max_rows,
            )),
            Some(MockResponse::Error { message, sql_state }) => {
                Err(DbError::query_execution(message, sql_state))
            }
            Some(MockResponse::Sleep(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(ResultSet::empty())
            }
            None => Ok(ResultSet::empty()),
        }
    }

    async fn close(self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Build a result set from column names and rows.
pub fn result(columns: &[&str], rows: Vec<Vec<JsonValue>>) -> ResultSet {
    ResultSet::new(columns.iter().map(|c| c.to_string()).collect(), rows)
}

pub async fn pool(
    state: &Arc<MockState>,
    config: PoolConfig,
) -> Arc<ConnectionPool<MockConnector>> {
    ConnectionPool::connect(MockConnector::new(Arc::clone(state)), config)
        .await
        .expect("mock pool should initialize")
}

pub async fn dispatcher(state: &Arc<MockState>) -> ToolDispatcher<MockConnector> {
    ToolDispatcher::new(pool(state, PoolConfig::default()).await)
}

/// Build a JSON argument object.
pub fn args(value: JsonValue) -> serde_json::Map<String, JsonValue> {
    value.as_object().cloned().unwrap_or_default()
}
