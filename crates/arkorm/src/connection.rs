//! Connection abstraction and result rows.

use crate::error::OrmResult;
use crate::statement::Statement;
use crate::value::Value;

/// One result row: column label to value, in select-list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A live database handle.
///
/// Implementations must surface backend failures as errors: an empty row set
/// always means "no rows", never "something went wrong".
///
/// Calls made through one handle are awaited one after another; nothing in
/// this crate issues statements concurrently on the same connection.
pub trait Connection: Send + Sync {
    /// Run a statement that produces rows.
    fn query(
        &self,
        stmt: &Statement,
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Run a statement that does not produce rows and return the affected count.
    fn execute(
        &self,
        stmt: &Statement,
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send;

    /// Identity generated by the most recent INSERT on this handle.
    fn last_insert_id(&self) -> Option<u64>;
}

impl<C: Connection> Connection for &C {
    fn query(
        &self,
        stmt: &Statement,
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        (**self).query(stmt)
    }

    fn execute(
        &self,
        stmt: &Statement,
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send {
        (**self).execute(stmt)
    }

    fn last_insert_id(&self) -> Option<u64> {
        (**self).last_insert_id()
    }
}
