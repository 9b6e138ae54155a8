//! Cascading writes over an entity graph.
//!
//! Sub-entities are written before their parent so the parent's foreign key
//! can pick up a freshly assigned key. Statements run one by one on the same
//! connection; a failure stops the cascade without undoing what already ran.

use crate::connection::Connection;
use crate::entity::{Entity, EntityState};
use crate::error::{OrmError, OrmResult};
use crate::query::Query;
use crate::value::Value;
use futures_util::future::BoxFuture;

/// Per-call cascade state: the shared builder plus the number of statements
/// that reached the database.
pub(crate) struct Cascade<'a, C> {
    pub(crate) conn: &'a C,
    pub(crate) query: &'a mut Query,
    pub(crate) applied: usize,
}

impl<'a, C: Connection> Cascade<'a, C> {
    pub(crate) fn new(conn: &'a C, query: &'a mut Query) -> Self {
        Self {
            conn,
            query,
            applied: 0,
        }
    }

    /// INSERT a new entity after writing its sub-entities.
    ///
    /// Returns `false` without touching the database when the entity is not new.
    pub(crate) fn insert<'e>(&'e mut self, entity: &'e mut Entity) -> BoxFuture<'e, OrmResult<bool>> {
        Box::pin(async move {
            if entity.state() != EntityState::New {
                tracing::debug!(target: "arkorm.collection", table = entity.table(), state = %entity.state(), "skipping insert");
                return Ok(false);
            }

            self.write_nested(entity).await?;

            let payload: Vec<(&str, Value)> = entity
                .fields()
                .filter(|f| !f.get().is_null())
                .map(|f| (f.name(), f.get().clone()))
                .collect();
            self.query.insert_into(entity.table(), payload);
            let affected = self.query.execute(self.conn).await?.affected();
            self.applied += 1;

            if affected == 0 {
                tracing::debug!(target: "arkorm.collection", table = entity.table(), "insert affected no rows");
                return Ok(false);
            }

            let assigned = self.conn.last_insert_id();
            if let Some(field) = entity.identity_field_mut()
                && field.get().is_null()
                && let Some(id) = assigned
            {
                let id = i64::try_from(id).map_err(|_| {
                    OrmError::decode(field.name(), format!("insert id {id} does not fit a signed BIGINT"))
                })?;
                field.set(Value::Int(id));
            }
            entity.mark_synced();
            tracing::debug!(target: "arkorm.collection", table = entity.table(), id = ?assigned, "inserted entity");
            Ok(true)
        })
    }

    /// UPDATE the modified non-key fields of an entity after cascading into
    /// its sub-entities.
    ///
    /// An entity that is not modified is left alone and reported as done.
    pub(crate) fn update<'e>(&'e mut self, entity: &'e mut Entity) -> BoxFuture<'e, OrmResult<bool>> {
        Box::pin(async move {
            if entity.state() != EntityState::Modified {
                return Ok(true);
            }

            self.write_nested(entity).await?;

            let changes: Vec<(&str, Value)> = entity
                .fields()
                .filter(|f| !f.is_primary_key() && f.modified())
                .map(|f| (f.name(), f.get().clone()))
                .collect();

            if !changes.is_empty() {
                let keys = entity.primary_keys();
                if keys.is_empty() || keys.iter().any(|k| k.get().is_null()) {
                    return Err(OrmError::build(format!(
                        "cannot update {} without primary key values",
                        entity.table()
                    )));
                }

                self.query.update(entity.table());
                for (name, value) in changes {
                    self.query.set(name, value);
                }
                for key in keys {
                    self.query.where_eq(key.name(), key.get().clone());
                }
                let affected = self.query.execute(self.conn).await?.affected();
                self.applied += 1;
                tracing::debug!(target: "arkorm.collection", table = entity.table(), affected, "updated entity");
            }

            entity.mark_synced();
            Ok(true)
        })
    }

    /// Insert new sub-entities and update the rest, copying each inserted
    /// sub-entity's referenced key into the parent's foreign key.
    async fn write_nested(&mut self, entity: &mut Entity) -> OrmResult<()> {
        let slots: Vec<&'static str> = entity.nested_entities().map(|(name, _)| name).collect();

        for slot in slots {
            let fk = entity
                .foreign_key_for(slot)
                .and_then(|f| f.foreign_key())
                .ok_or_else(|| {
                    OrmError::build(format!(
                        "{} has no foreign key for nested slot {slot}",
                        entity.table()
                    ))
                })?;
            let Some(sub) = entity.nested_mut(slot) else {
                continue;
            };

            if sub.state() == EntityState::New {
                if !self.insert(sub).await? {
                    continue;
                }
                let key = sub.get(fk.column)?.clone();
                if let Some(field) = entity.foreign_key_for_mut(slot) {
                    field.set(key);
                }
            } else {
                self.update(sub).await?;
            }
        }
        Ok(())
    }
}
