//! WHERE clause rendering.

use crate::condition::{Condition, Conjunction, Op, Predicate};
use crate::error::OrmResult;
use crate::ident::format_field_name;
use crate::value::Value;

/// Ordered WHERE entries: predicates interleaved with group markers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    conditions: Vec<Condition>,
}

/// The group currently being collected.
struct OpenGroup {
    /// Joins the predicates inside the parentheses.
    inner: Conjunction,
    /// Joins the whole group to the top-level list; taken from its first predicate.
    outer: Conjunction,
    parts: Vec<String>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn clear(&mut self) {
        self.conditions.clear();
    }

    pub fn push(&mut self, field: impl Into<String>, value: Value, op: Op, conjunction: Conjunction) {
        self.conditions.push(Condition::Predicate(Predicate {
            field: field.into(),
            op,
            value,
            conjunction,
        }));
    }

    pub fn push_marker(&mut self, conjunction: Conjunction) {
        self.conditions.push(Condition::GroupMarker(conjunction));
    }

    /// Render the clause body (without `WHERE`), appending bound values to `params`
    /// in placeholder order.
    ///
    /// Groups are one level deep: a marker opens a group when none is open and
    /// closes the open one otherwise. Empty groups render nothing.
    pub fn render(&self, params: &mut Vec<Value>) -> OrmResult<String> {
        let mut out = String::new();
        let mut group: Option<OpenGroup> = None;

        for condition in &self.conditions {
            match condition {
                Condition::Predicate(p) => {
                    let fragment = format!("{} {} ?", format_field_name(&p.field)?, p.op.as_sql());
                    params.push(p.value.clone());
                    match group.as_mut() {
                        Some(g) => {
                            if g.parts.is_empty() {
                                g.outer = p.conjunction;
                            }
                            g.parts.push(fragment);
                        }
                        None => push_joined(&mut out, p.conjunction, &fragment),
                    }
                }
                Condition::GroupMarker(conjunction) => match group.take() {
                    Some(open) => close_group(&mut out, open),
                    None => {
                        group = Some(OpenGroup {
                            inner: *conjunction,
                            outer: Conjunction::And,
                            parts: Vec::new(),
                        });
                    }
                },
            }
        }
        if let Some(open) = group {
            close_group(&mut out, open);
        }

        Ok(out)
    }
}

fn push_joined(out: &mut String, conjunction: Conjunction, fragment: &str) {
    if !out.is_empty() {
        out.push(' ');
        out.push_str(conjunction.as_sql());
        out.push(' ');
    }
    out.push_str(fragment);
}

fn close_group(out: &mut String, group: OpenGroup) {
    if group.parts.is_empty() {
        return;
    }
    let separator = format!(" {} ", group.inner.as_sql());
    let text = format!("({})", group.parts.join(&separator));
    push_joined(out, group.outer, &text);
}
