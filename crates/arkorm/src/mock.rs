//! Scripted in-memory connection for tests.
//!
//! [`MockConnection`] records every statement it receives and replays queued
//! responses in FIFO order. With nothing queued, row queries return no rows
//! and writes report one affected row. Successful INSERTs hand out
//! incrementing identities.

use crate::connection::{Connection, Row};
use crate::error::{OrmError, OrmResult};
use crate::statement::{Statement, StatementKind};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
enum Scripted {
    Rows(Vec<Row>),
    Affected(u64),
    Error(OrmError),
}

#[derive(Debug)]
struct State {
    statements: Vec<Statement>,
    responses: VecDeque<Scripted>,
    next_id: u64,
    last_id: Option<u64>,
}

#[derive(Debug)]
pub struct MockConnection {
    state: Mutex<State>,
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                statements: Vec::new(),
                responses: VecDeque::new(),
                next_id: 1,
                last_id: None,
            }),
        }
    }

    /// First identity handed out for an INSERT.
    pub fn with_first_insert_id(self, id: u64) -> Self {
        self.lock().next_id = id;
        self
    }

    pub fn push_rows(&self, rows: Vec<Row>) {
        self.lock().responses.push_back(Scripted::Rows(rows));
    }

    pub fn push_affected(&self, affected: u64) {
        self.lock().responses.push_back(Scripted::Affected(affected));
    }

    pub fn push_error(&self, err: OrmError) {
        self.lock().responses.push_back(Scripted::Error(err));
    }

    /// Every statement received so far, in order.
    pub fn statements(&self) -> Vec<Statement> {
        self.lock().statements.clone()
    }

    /// SQL text of every statement received so far.
    pub fn sql_log(&self) -> Vec<String> {
        self.lock().statements.iter().map(|s| s.sql.clone()).collect()
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.statements.clear();
        state.responses.clear();
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn run_query(&self, stmt: &Statement) -> OrmResult<Vec<Row>> {
        let mut state = self.lock();
        state.statements.push(stmt.clone());
        match state.responses.pop_front() {
            None => Ok(Vec::new()),
            Some(Scripted::Rows(rows)) => Ok(rows),
            Some(Scripted::Error(err)) => Err(err),
            Some(Scripted::Affected(_)) => Err(OrmError::connection(format!(
                "mock: scripted an affected count but received a row query: {}",
                stmt.sql
            ))),
        }
    }

    fn run_execute(&self, stmt: &Statement) -> OrmResult<u64> {
        let mut state = self.lock();
        state.statements.push(stmt.clone());
        let affected = match state.responses.pop_front() {
            None => 1,
            Some(Scripted::Affected(n)) => n,
            Some(Scripted::Error(err)) => return Err(err),
            Some(Scripted::Rows(_)) => {
                return Err(OrmError::connection(format!(
                    "mock: scripted rows but received a write: {}",
                    stmt.sql
                )));
            }
        };
        if stmt.kind == StatementKind::Insert && affected > 0 {
            let id = state.next_id;
            state.next_id += 1;
            state.last_id = Some(id);
        }
        Ok(affected)
    }
}

impl Connection for MockConnection {
    fn query(
        &self,
        stmt: &Statement,
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        let result = self.run_query(stmt);
        async move { result }
    }

    fn execute(
        &self,
        stmt: &Statement,
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send {
        let result = self.run_execute(stmt);
        async move { result }
    }

    fn last_insert_id(&self) -> Option<u64> {
        self.lock().last_id
    }
}
