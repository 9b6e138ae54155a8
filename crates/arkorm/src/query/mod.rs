//! Stateful, resettable SQL statement builder.
//!
//! A [`Query`] accumulates clause state through chained calls and compiles it
//! into a [`Statement`]: SQL text with `?` placeholders plus the bound values
//! in placeholder order.
//!
//! ```
//! use arkorm::{Conjunction, Query};
//!
//! let mut q = Query::new();
//! q.find()
//!     .from("users")
//!     .where_eq("a", 1)
//!     .group(Conjunction::Or)
//!     .where_eq("b", 2)
//!     .where_eq("c", 3);
//!
//! let stmt = q.compile()?;
//! assert_eq!(stmt.sql, "SELECT * FROM `users` WHERE `a` = ? AND (`b` = ? OR `c` = ?)");
//! assert_eq!(stmt.params.len(), 3);
//! # Ok::<(), arkorm::OrmError>(())
//! ```

mod create_table;
mod where_clause;

#[cfg(test)]
mod tests;

pub use where_clause::WhereClause;

use crate::condition::{Conjunction, JoinType, Op};
use crate::connection::{Connection, Row};
use crate::error::{OrmError, OrmResult};
use crate::ident::{format_field_name, quote_ident};
use crate::schema::ColumnDescriptor;
use crate::statement::{EscapeMode, Statement, StatementKind};
use crate::value::Value;

/// A JOIN entry, emitted in insertion order right after FROM.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: String,
    pub alias: Option<String>,
    pub foreign_key: String,
    pub referenced: String,
    pub join_type: JoinType,
}

/// Result of [`Query::execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Rows(Vec<Row>),
    Affected(u64),
}

impl QueryOutput {
    /// Rows of a SELECT; empty for every other statement.
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            QueryOutput::Rows(rows) => rows,
            QueryOutput::Affected(_) => Vec::new(),
        }
    }

    /// Affected-row count, or the number of rows returned for a SELECT.
    pub fn affected(&self) -> u64 {
        match self {
            QueryOutput::Rows(rows) => rows.len() as u64,
            QueryOutput::Affected(n) => *n,
        }
    }
}

/// Statement builder for CREATE TABLE, SELECT, DELETE, INSERT and UPDATE.
///
/// The statement-starting calls ([`find`](Self::find), [`count`](Self::count),
/// [`delete`](Self::delete), [`update`](Self::update),
/// [`insert_into`](Self::insert_into), [`create_table`](Self::create_table))
/// reset all clause state first, so one builder can be reused for a sequence of
/// statements. Not meant to be shared between concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct Query {
    kind: StatementKind,
    table: Option<String>,
    fields: Vec<String>,
    columns: Vec<ColumnDescriptor>,
    joins: Vec<Join>,
    conditions: WhereClause,
    order: Vec<(String, bool)>,
    limit: Option<u64>,
    offset: Option<u64>,
    assignments: Vec<(String, Value)>,
    escape_mode: EscapeMode,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with an explicit string escape mode for literal rendering.
    pub fn with_escape_mode(mode: EscapeMode) -> Self {
        Self {
            escape_mode: mode,
            ..Self::default()
        }
    }

    pub fn escape_mode(&self) -> EscapeMode {
        self.escape_mode
    }

    pub fn set_escape_mode(&mut self, mode: EscapeMode) -> &mut Self {
        self.escape_mode = mode;
        self
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn conditions(&self) -> &WhereClause {
        &self.conditions
    }

    /// Clear every clause buffer. Idempotent. The escape mode is kept.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::with_escape_mode(self.escape_mode);
        self
    }

    // ==================== Statement starters ====================

    pub fn create_table(&mut self, table: impl Into<String>) -> &mut Self {
        self.reset();
        self.kind = StatementKind::CreateTable;
        self.table = Some(table.into());
        self
    }

    pub fn add_column(&mut self, column: ColumnDescriptor) -> &mut Self {
        self.columns.push(column);
        self
    }

    pub fn find(&mut self) -> &mut Self {
        self.reset();
        self.kind = StatementKind::Select;
        self
    }

    /// `SELECT COUNT(*)`.
    pub fn count(&mut self) -> &mut Self {
        self.reset();
        self.kind = StatementKind::Select;
        self.fields.push("COUNT(*)".to_string());
        self
    }

    pub fn delete(&mut self) -> &mut Self {
        self.reset();
        self.kind = StatementKind::Delete;
        self
    }

    pub fn update(&mut self, table: impl Into<String>) -> &mut Self {
        self.reset();
        self.kind = StatementKind::Update;
        self.table = Some(table.into());
        self
    }

    /// Start an INSERT of `payload` (column, value) pairs, in order.
    pub fn insert_into<K, I>(&mut self, table: impl Into<String>, payload: I) -> &mut Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        self.reset();
        self.kind = StatementKind::Insert;
        self.table = Some(table.into());
        self.assignments = payload.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self
    }

    // ==================== Clauses ====================

    /// Append to the select list. Defaults to `*` when nothing was added.
    pub fn fields<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn from(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = Some(table.into());
        self
    }

    pub fn into(&mut self, table: impl Into<String>) -> &mut Self {
        self.from(table)
    }

    /// `AND field = value`.
    pub fn where_eq(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.where_with(field, value, Op::Eq, Conjunction::And)
    }

    pub fn where_with(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
        op: Op,
        conjunction: Conjunction,
    ) -> &mut Self {
        self.conditions.push(field, value.into(), op, conjunction);
        self
    }

    /// Push a group marker.
    ///
    /// With no group open, the marker opens one: the predicates that follow
    /// are parenthesized and joined to each other by `conjunction`. The group
    /// itself is joined to the preceding predicates by the conjunction of its
    /// first predicate. The next marker, or the end of the clause, closes it.
    /// Groups do not nest.
    pub fn group(&mut self, conjunction: Conjunction) -> &mut Self {
        self.conditions.push_marker(conjunction);
        self
    }

    pub fn join(
        &mut self,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
        referenced: impl Into<String>,
        join_type: JoinType,
    ) -> &mut Self {
        self.joins.push(Join {
            table: table.into(),
            alias: None,
            foreign_key: foreign_key.into(),
            referenced: referenced.into(),
            join_type,
        });
        self
    }

    /// Join `table AS alias`.
    pub fn join_as(
        &mut self,
        table: impl Into<String>,
        alias: impl Into<String>,
        foreign_key: impl Into<String>,
        referenced: impl Into<String>,
        join_type: JoinType,
    ) -> &mut Self {
        self.joins.push(Join {
            table: table.into(),
            alias: Some(alias.into()),
            foreign_key: foreign_key.into(),
            referenced: referenced.into(),
            join_type,
        });
        self
    }

    pub fn sort(&mut self, field: impl Into<String>, ascending: bool) -> &mut Self {
        self.order.push((field.into(), ascending));
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    /// Add an UPDATE assignment. Setting the same field twice keeps the last value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let field = field.into();
        let value = value.into();
        match self.assignments.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.assignments.push((field, value)),
        }
        self
    }

    // ==================== Compilation ====================

    /// Compile the accumulated state into one statement.
    pub fn compile(&self) -> OrmResult<Statement> {
        let raw_table = match self.table.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => {
                return Err(OrmError::build(format!(
                    "{} statement has no table",
                    self.kind
                )));
            }
        };
        let table = format_field_name(raw_table)?;

        let mut params = Vec::new();
        let sql = match self.kind {
            StatementKind::CreateTable => {
                create_table::render(raw_table, &self.columns)?
            }
            StatementKind::Select => {
                let fields = if self.fields.is_empty() {
                    "*".to_string()
                } else {
                    self.fields
                        .iter()
                        .map(|f| format_field_name(f))
                        .collect::<OrmResult<Vec<_>>>()?
                        .join(", ")
                };
                let mut sql = format!("SELECT {fields} FROM {table}");
                self.push_joins(&mut sql)?;
                self.push_where(&mut sql, &mut params)?;
                self.push_tail(&mut sql)?;
                sql
            }
            StatementKind::Delete => {
                let mut sql = if self.joins.is_empty() {
                    format!("DELETE FROM {table}")
                } else {
                    format!("DELETE {table} FROM {table}")
                };
                self.push_joins(&mut sql)?;
                self.push_where(&mut sql, &mut params)?;
                self.push_tail(&mut sql)?;
                sql
            }
            StatementKind::Update => {
                if self.assignments.is_empty() {
                    return Err(OrmError::build(format!("UPDATE {table} has no assignments")));
                }
                let mut sets = Vec::with_capacity(self.assignments.len());
                for (field, value) in &self.assignments {
                    sets.push(format!("{} = ?", format_field_name(field)?));
                    params.push(value.clone());
                }
                let mut sql = format!("UPDATE {table} SET {}", sets.join(", "));
                self.push_where(&mut sql, &mut params)?;
                sql
            }
            StatementKind::Insert => {
                // An empty payload inserts a row of column defaults.
                let mut columns = Vec::with_capacity(self.assignments.len());
                for (field, value) in &self.assignments {
                    columns.push(format_field_name(field)?);
                    params.push(value.clone());
                }
                let placeholders = vec!["?"; columns.len()].join(", ");
                format!(
                    "INSERT INTO {table} ({}) VALUES ({placeholders})",
                    columns.join(", ")
                )
            }
            StatementKind::DropTable => format!("DROP TABLE {table}"),
        };

        Ok(Statement::new(self.kind, sql)
            .with_params(params)
            .with_escape_mode(self.escape_mode))
    }

    fn push_joins(&self, sql: &mut String) -> OrmResult<()> {
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join.join_type.as_sql());
            sql.push(' ');
            sql.push_str(&format_field_name(&join.table)?);
            if let Some(alias) = &join.alias {
                sql.push_str(" AS ");
                sql.push_str(&quote_ident(alias));
            }
            sql.push_str(" ON ");
            sql.push_str(&format_field_name(&join.foreign_key)?);
            sql.push_str(" = ");
            sql.push_str(&format_field_name(&join.referenced)?);
        }
        Ok(())
    }

    fn push_where(&self, sql: &mut String, params: &mut Vec<Value>) -> OrmResult<()> {
        let clause = self.conditions.render(params)?;
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        Ok(())
    }

    fn push_tail(&self, sql: &mut String) -> OrmResult<()> {
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(field, asc)| {
                    format_field_name(field).map(|f| format!("{f} {}", if *asc { "ASC" } else { "DESC" }))
                })
                .collect::<OrmResult<Vec<_>>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            if self.limit.is_none() {
                sql.push_str(&format!(" LIMIT {}", u64::MAX));
            }
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        Ok(())
    }

    // ==================== Execution ====================

    /// Compile and run the statement.
    ///
    /// SELECT yields [`QueryOutput::Rows`] (empty when nothing matched);
    /// everything else yields [`QueryOutput::Affected`].
    pub async fn execute<C: Connection>(&self, conn: &C) -> OrmResult<QueryOutput> {
        let stmt = self.compile()?;
        if stmt.kind.returns_rows() {
            Ok(QueryOutput::Rows(conn.query(&stmt).await?))
        } else {
            Ok(QueryOutput::Affected(conn.execute(&stmt).await?))
        }
    }

    /// Whether exactly one table matches `table`.
    ///
    /// More than one match (the name is used as a `LIKE` pattern) is a build
    /// error because existence cannot be decided.
    pub async fn table_exists<C: Connection>(&self, conn: &C, table: &str) -> OrmResult<bool> {
        let stmt = Statement::new(StatementKind::Select, "SHOW TABLES LIKE ?")
            .with_params(vec![Value::from(table)])
            .with_escape_mode(self.escape_mode);
        let rows = conn.query(&stmt).await?;
        match rows.len() {
            0 => Ok(false),
            1 => Ok(true),
            n => Err(OrmError::build(format!(
                "Could not determine if table {table} exists: {n} tables match"
            ))),
        }
    }

    pub async fn drop_table<C: Connection>(&mut self, conn: &C, table: &str) -> OrmResult<u64> {
        self.reset();
        self.kind = StatementKind::DropTable;
        self.table = Some(table.to_string());
        let stmt = self.compile()?;
        conn.execute(&stmt).await
    }
}
