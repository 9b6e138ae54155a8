//! Statement logging through `tracing`.
//!
//! [`InstrumentedConnection`] wraps any [`Connection`] and emits one event per
//! statement under the `arkorm.sql` target. Statements slower than the
//! configured threshold are logged at WARN, failures at ERROR.
//!
//! ```ignore
//! use arkorm::{InstrumentedConnection, SqlLogConfig};
//! use std::time::Duration;
//!
//! let conn = InstrumentedConnection::new(
//!     mysql_conn,
//!     &SqlLogConfig::default().slow_query_threshold(Duration::from_millis(200)),
//! );
//! ```

use crate::config::SqlLogConfig;
use crate::connection::{Connection, Row};
use crate::error::OrmResult;
use crate::statement::Statement;
use std::time::{Duration, Instant};

/// Cut `sql` to at most `max_bytes` on a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[derive(Debug, Clone)]
pub struct InstrumentedConnection<C> {
    inner: C,
    config: SqlLogConfig,
}

impl<C: Connection> InstrumentedConnection<C> {
    pub fn new(inner: C, config: &SqlLogConfig) -> Self {
        Self {
            inner,
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &SqlLogConfig {
        &self.config
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn display_sql(&self, sql: &str) -> String {
        match self.config.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    fn report(&self, stmt: &Statement, elapsed: Duration, outcome: Result<u64, &str>) {
        if !self.config.enabled {
            return;
        }
        let sql = self.display_sql(&stmt.sql);
        let kind = stmt.kind.as_str();
        let param_count = stmt.params.len();
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        match outcome {
            Err(error) => tracing::error!(
                target: "arkorm.sql",
                kind,
                param_count,
                elapsed_ms,
                sql = %sql,
                error,
                "statement failed"
            ),
            Ok(count) => {
                let slow = self.config.slow_threshold().is_some_and(|t| elapsed >= t);
                if slow {
                    tracing::warn!(
                        target: "arkorm.sql",
                        kind,
                        param_count,
                        elapsed_ms,
                        count,
                        sql = %sql,
                        "slow statement"
                    );
                } else {
                    tracing::debug!(
                        target: "arkorm.sql",
                        kind,
                        param_count,
                        elapsed_ms,
                        count,
                        sql = %sql,
                    );
                }
            }
        }
    }
}

impl<C: Connection> Connection for InstrumentedConnection<C> {
    async fn query(&self, stmt: &Statement) -> OrmResult<Vec<Row>> {
        let start = Instant::now();
        let result = self.inner.query(stmt).await;
        match &result {
            Ok(rows) => self.report(stmt, start.elapsed(), Ok(rows.len() as u64)),
            Err(e) => self.report(stmt, start.elapsed(), Err(&e.to_string())),
        }
        result
    }

    async fn execute(&self, stmt: &Statement) -> OrmResult<u64> {
        let start = Instant::now();
        let result = self.inner.execute(stmt).await;
        match &result {
            Ok(n) => self.report(stmt, start.elapsed(), Ok(*n)),
            Err(e) => self.report(stmt, start.elapsed(), Err(&e.to_string())),
        }
        result
    }

    fn last_insert_id(&self) -> Option<u64> {
        self.inner.last_insert_id()
    }
}
