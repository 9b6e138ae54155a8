//! Join and alias construction for reads over an entity graph.
//!
//! The root table keeps its own name. Every nested slot is joined under an
//! alias equal to its dotted slot path (`address`, `address.country`), so the
//! same table can appear more than once and dotted filter keys resolve to
//! `` `path`.`column` ``.

use crate::condition::JoinType;
use crate::error::{OrmError, OrmResult};
use crate::filter::Filter;
use crate::ident::quote_ident;
use crate::query::Query;
use crate::schema::Schema;

/// Add one INNER JOIN per nested slot, depth first.
pub(crate) fn push_joins(query: &mut Query, schema: &'static Schema) -> OrmResult<()> {
    push_joins_under(query, schema, schema.table, None)
}

fn push_joins_under(
    query: &mut Query,
    schema: &'static Schema,
    alias: &str,
    prefix: Option<&str>,
) -> OrmResult<()> {
    for (slot, sub) in schema.nested() {
        let fk_column = schema.foreign_key_for(slot).ok_or_else(|| {
            OrmError::build(format!(
                "{} has no foreign key for nested slot {slot}",
                schema.table
            ))
        })?;
        let referenced = fk_column
            .foreign_key
            .map(|fk| fk.column)
            .unwrap_or_default();
        let path = match prefix {
            Some(p) => format!("{p}.{slot}"),
            None => slot.to_string(),
        };

        query.join_as(
            sub.table,
            path.clone(),
            format!("{}.{}", quote_ident(alias), quote_ident(fk_column.name)),
            format!("{}.{}", quote_ident(&path), quote_ident(referenced)),
            JoinType::Inner,
        );
        push_joins_under(query, sub, &path, Some(&path))?;
    }
    Ok(())
}

/// Select list for a find: every root column plus one aliased entry per
/// nested leaf column.
pub(crate) fn select_fields(schema: &'static Schema) -> Vec<String> {
    let mut fields = vec![format!("{}.*", quote_ident(schema.table))];
    for (slot, sub) in schema.nested() {
        push_nested_fields(&mut fields, sub, slot);
    }
    fields
}

fn push_nested_fields(fields: &mut Vec<String>, schema: &'static Schema, path: &str) {
    for column in schema.columns() {
        fields.push(format!(
            "{}.{} AS {}",
            quote_ident(path),
            quote_ident(column.name),
            quote_ident(&format!("{path}.{}", column.name))
        ));
    }
    for (slot, sub) in schema.nested() {
        push_nested_fields(fields, sub, &format!("{path}.{slot}"));
    }
}

/// Resolve a filter key (`name`, `address.country.name`) to a qualified column.
pub(crate) fn resolve_key(schema: &'static Schema, key: &str) -> OrmResult<String> {
    let (path, column) = match key.rsplit_once('.') {
        Some((path, column)) => (Some(path), column),
        None => (None, key),
    };

    let mut target = schema;
    if let Some(path) = path {
        for slot in path.split('.') {
            target = target.nested_schema(slot).ok_or_else(|| {
                OrmError::build(format!("unknown filter path {key} on {}", schema.table))
            })?;
        }
    }
    if target.column(column).is_none() {
        return Err(OrmError::build(format!(
            "unknown filter field {key} on {}",
            schema.table
        )));
    }

    let alias = path.unwrap_or(schema.table);
    Ok(format!("{}.{}", quote_ident(alias), quote_ident(column)))
}

/// AND one `=` predicate per filter entry.
pub(crate) fn push_filter(query: &mut Query, schema: &'static Schema, filter: &Filter) -> OrmResult<()> {
    for (key, value) in filter.iter() {
        let column = resolve_key(schema, key)?;
        query.where_eq(column, value.clone());
    }
    Ok(())
}
