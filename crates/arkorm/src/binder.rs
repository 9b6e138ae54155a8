//! Row materialization.

use crate::connection::Row;
use crate::entity::Entity;
use crate::error::OrmResult;
use crate::schema::Schema;

/// Turns one result row into an entity graph.
pub trait Binder: Send + Sync {
    fn bind(&self, schema: &'static Schema, row: &Row) -> OrmResult<Entity>;
}

/// Binds rows produced by [`Collection`](crate::Collection) reads.
///
/// Root columns arrive under their own names, nested ones under dotted
/// aliases (`address.country.name`). Every value is coerced through its
/// field's type; null and empty values are skipped, and columns with no
/// matching field are ignored. A value the field cannot read leaves the
/// field null and is logged at WARN, so one malformed column never fails
/// the whole read. The result is marked synced.
#[derive(Debug, Clone, Copy, Default)]
pub struct DbBinder;

impl Binder for DbBinder {
    fn bind(&self, schema: &'static Schema, row: &Row) -> OrmResult<Entity> {
        let mut entity = Entity::new(schema);

        for (column, raw) in row.iter() {
            if raw.is_empty() {
                continue;
            }
            let Ok(field) = entity.field_at_path(column) else {
                tracing::trace!(target: "arkorm.binder", column, table = schema.table, "ignoring unmapped column");
                continue;
            };
            let value = field.coerce(raw);
            if value.is_null() {
                tracing::warn!(
                    target: "arkorm.binder",
                    table = schema.table,
                    column,
                    value = %raw,
                    kind = ?field.kind(),
                    "cannot read {} value, leaving field null",
                    raw.type_name()
                );
                continue;
            }
            entity.set_path(column, value)?;
        }

        entity.mark_synced();
        Ok(entity)
    }
}
