//! Condition primitives for WHERE clauses.
//!
//! A WHERE clause is kept as a flat sequence of [`Condition`]s: predicates
//! and group markers. See [`Query::group`](crate::Query::group) for how the
//! markers are interpreted.

use crate::value::Value;
use std::fmt;

/// Comparison operator of a predicate.
///
/// # Example
/// ```
/// use arkorm::{Conjunction, Op, Query};
///
/// let mut q = Query::new();
/// q.find()
///     .from("users")
///     .where_with("age", 18, Op::Gte, Conjunction::And)
///     .where_with("name", "A%", Op::Like, Conjunction::And);
/// let stmt = q.compile()?;
/// assert_eq!(stmt.sql, "SELECT * FROM `users` WHERE `age` >= ? AND `name` LIKE ?");
/// # Ok::<(), arkorm::OrmError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Op {
    #[default]
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
}

impl Op {
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Like => "LIKE",
            Op::NotLike => "NOT LIKE",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Logical connective between predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// JOIN flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
}

impl JoinType {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
        }
    }
}

/// `field op ?`, joined to what precedes it by `conjunction`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub op: Op,
    pub value: Value,
    pub conjunction: Conjunction,
}

/// One entry of a WHERE sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Predicate(Predicate),
    /// Opens a group (when none is open) or closes the open one.
    GroupMarker(Conjunction),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_render_as_sql() {
        let all = [
            (Op::Eq, "="),
            (Op::Ne, "!="),
            (Op::Gt, ">"),
            (Op::Gte, ">="),
            (Op::Lt, "<"),
            (Op::Lte, "<="),
            (Op::Like, "LIKE"),
            (Op::NotLike, "NOT LIKE"),
        ];
        for (op, sql) in all {
            assert_eq!(op.to_string(), sql);
        }
    }

    #[test]
    fn defaults() {
        assert_eq!(Op::default(), Op::Eq);
        assert_eq!(Conjunction::default().as_sql(), "AND");
        assert_eq!(JoinType::default().as_sql(), "INNER JOIN");
    }
}
