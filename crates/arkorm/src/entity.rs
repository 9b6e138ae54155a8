//! Entities: fields plus nested sub-entities, with a derived lifecycle state.

use crate::error::{OrmError, OrmResult};
use crate::field::Field;
use crate::schema::{Schema, SlotDef};
use crate::validation::ValidationErrors;
use crate::value::Value;
use std::fmt;

/// Lifecycle state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Not stored yet.
    New,
    /// Matches what is stored.
    Synced,
    /// Stored, with local changes somewhere in the graph.
    Modified,
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityState::New => "new",
            EntityState::Synced => "synced",
            EntityState::Modified => "modified",
        })
    }
}

/// One named member of an entity.
#[derive(Debug, Clone)]
pub enum Slot {
    Scalar(Field),
    Nested(Box<Entity>),
}

/// A row of one table plus the rows of its nested relations.
///
/// Fields and sub-entities share one namespace and keep declaration order.
/// Only the `is_new` flag is stored; [`state`](Self::state) is derived.
#[derive(Debug, Clone)]
pub struct Entity {
    schema: &'static Schema,
    slots: Vec<(&'static str, Slot)>,
    is_new: bool,
}

impl Entity {
    pub fn new(schema: &'static Schema) -> Self {
        let slots = schema
            .slots
            .iter()
            .map(|slot| match slot {
                SlotDef::Column(def) => (def.name, Slot::Scalar(Field::new(def))),
                SlotDef::Nested { name, schema } => {
                    (*name, Slot::Nested(Box::new(Entity::new(*schema))))
                }
            })
            .collect();
        Self {
            schema,
            slots,
            is_new: true,
        }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn table(&self) -> &'static str {
        self.schema.table
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn state(&self) -> EntityState {
        if self.is_new {
            return EntityState::New;
        }
        let nested_dirty = self
            .nested_entities()
            .any(|(_, sub)| sub.state() != EntityState::Synced);
        if nested_dirty || self.fields().any(Field::modified) {
            EntityState::Modified
        } else {
            EntityState::Synced
        }
    }

    // ==================== Slot access ====================

    pub fn slots(&self) -> impl Iterator<Item = (&'static str, &Slot)> {
        self.slots.iter().map(|(name, slot)| (*name, slot))
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.slots.iter().filter_map(|(_, slot)| match slot {
            Slot::Scalar(field) => Some(field),
            Slot::Nested(_) => None,
        })
    }

    pub fn fields_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.slots.iter_mut().filter_map(|(_, slot)| match slot {
            Slot::Scalar(field) => Some(field),
            Slot::Nested(_) => None,
        })
    }

    pub fn nested_entities(&self) -> impl Iterator<Item = (&'static str, &Entity)> {
        self.slots.iter().filter_map(|(name, slot)| match slot {
            Slot::Nested(sub) => Some((*name, sub.as_ref())),
            Slot::Scalar(_) => None,
        })
    }

    pub fn nested_entities_mut(&mut self) -> impl Iterator<Item = (&'static str, &mut Entity)> {
        self.slots.iter_mut().filter_map(|(name, slot)| match slot {
            Slot::Nested(sub) => Some((*name, sub.as_mut())),
            Slot::Scalar(_) => None,
        })
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields().find(|f| f.name() == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields_mut().find(|f| f.name() == name)
    }

    pub fn nested(&self, name: &str) -> Option<&Entity> {
        self.nested_entities()
            .find(|(slot, _)| *slot == name)
            .map(|(_, sub)| sub)
    }

    pub fn nested_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.nested_entities_mut()
            .find(|(slot, _)| *slot == name)
            .map(|(_, sub)| sub)
    }

    /// Current value of a field.
    pub fn get(&self, name: &str) -> OrmResult<&Value> {
        self.field(name)
            .map(Field::get)
            .ok_or_else(|| OrmError::unknown_property(format!("{}.{name}", self.table())))
    }

    /// Set a field. The empty string is stored as null.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> OrmResult<()> {
        let table = self.table();
        let field = self
            .field_mut(name)
            .ok_or_else(|| OrmError::unknown_property(format!("{table}.{name}")))?;
        let value = value.into();
        field.set(if value.is_empty() { Value::Null } else { value });
        Ok(())
    }

    /// Replace a sub-entity.
    ///
    /// When the new sub-entity's referenced column differs from the current
    /// foreign-key value, the foreign key is re-pointed at it.
    pub fn set_nested(&mut self, name: &str, entity: Entity) -> OrmResult<()> {
        let expected = self
            .schema
            .nested_schema(name)
            .ok_or_else(|| OrmError::unknown_property(format!("{}.{name}", self.table())))?;
        if !std::ptr::eq(expected, entity.schema) {
            return Err(OrmError::build(format!(
                "slot {name} holds {} entities, got {}",
                expected.table,
                entity.table()
            )));
        }

        if let Some(fk) = self.schema.foreign_key_for(name).copied()
            && let Some(fk_ref) = fk.foreign_key
        {
            let target = entity.get(fk_ref.column)?.clone();
            if let Some(field) = self.field_mut(fk.name)
                && *field.get() != target
            {
                field.set(target);
            }
        }

        if let Some(slot) = self.nested_mut(name) {
            *slot = entity;
        }
        Ok(())
    }

    // ==================== Dotted paths ====================

    pub fn get_path(&self, path: &str) -> OrmResult<&Value> {
        match path.split_once('.') {
            Some((head, rest)) => self
                .nested(head)
                .ok_or_else(|| OrmError::unknown_property(format!("{}.{head}", self.table())))?
                .get_path(rest),
            None => self.get(path),
        }
    }

    pub fn set_path(&mut self, path: &str, value: impl Into<Value>) -> OrmResult<()> {
        match path.split_once('.') {
            Some((head, rest)) => {
                let table = self.table();
                self.nested_mut(head)
                    .ok_or_else(|| OrmError::unknown_property(format!("{table}.{head}")))?
                    .set_path(rest, value)
            }
            None => self.set(path, value),
        }
    }

    /// Coerce `raw` through the target field's type, then set it.
    pub fn set_path_raw(&mut self, path: &str, raw: &Value) -> OrmResult<()> {
        let field = self.field_at_path(path)?;
        let coerced = field.coerce(raw);
        self.set_path(path, coerced)
    }

    /// Field at a dotted path.
    pub fn field_at_path(&self, path: &str) -> OrmResult<&Field> {
        match path.split_once('.') {
            Some((head, rest)) => self
                .nested(head)
                .ok_or_else(|| OrmError::unknown_property(format!("{}.{head}", self.table())))?
                .field_at_path(rest),
            None => self
                .field(path)
                .ok_or_else(|| OrmError::unknown_property(format!("{}.{path}", self.table()))),
        }
    }

    // ==================== Keys ====================

    pub fn primary_keys(&self) -> Vec<&Field> {
        self.fields().filter(|f| f.is_primary_key()).collect()
    }

    /// The auto-increment field, if the table has one.
    pub fn identity_field(&self) -> Option<&Field> {
        self.fields().find(|f| f.is_auto_key())
    }

    pub fn identity_field_mut(&mut self) -> Option<&mut Field> {
        self.fields_mut().find(|f| f.is_auto_key())
    }

    /// The field holding the foreign key of nested slot `slot`.
    pub fn foreign_key_for(&self, slot: &str) -> Option<&Field> {
        self.fields()
            .find(|f| f.foreign_key().is_some_and(|fk| fk.property == slot))
    }

    pub fn foreign_key_for_mut(&mut self, slot: &str) -> Option<&mut Field> {
        self.fields_mut()
            .find(|f| f.foreign_key().is_some_and(|fk| fk.property == slot))
    }

    // ==================== Sync ====================

    /// Record that the whole graph is stored.
    ///
    /// An entity whose first primary key is null (or that has none) stays new
    /// and nothing is marked.
    pub fn mark_synced(&mut self) {
        let has_key = self
            .fields()
            .find(|f| f.is_primary_key())
            .is_some_and(|f| !f.get().is_null());
        if !has_key {
            self.is_new = true;
            return;
        }

        self.is_new = false;
        for field in self.fields_mut() {
            field.mark_synced();
        }
        for (_, sub) in self.nested_entities_mut() {
            sub.mark_synced();
        }
    }

    /// Align the synced state with a fresh copy read from the database.
    ///
    /// A missing or new remote makes this entity new. Otherwise each field
    /// adopts the remote value as its synced value and sub-entities reconcile
    /// against the remote's sub-entities.
    pub fn reconcile_with_database(&mut self, remote: Option<&Entity>) {
        let remote = match remote {
            Some(r) if !r.is_new() => r,
            _ => {
                self.is_new = true;
                return;
            }
        };

        self.is_new = false;
        for (name, slot) in self.slots.iter_mut() {
            let name: &str = name;
            match slot {
                Slot::Scalar(field) => {
                    let value = remote.get(name).cloned().unwrap_or_default();
                    field.adopt_database_value(value);
                }
                Slot::Nested(sub) => sub.reconcile_with_database(remote.nested(name)),
            }
        }
    }

    // ==================== Validation / rendering ====================

    /// Errors of every field and sub-entity; nested paths are prefixed with the slot name.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        for (name, slot) in self.slots() {
            match slot {
                Slot::Scalar(field) => errors.extend(field.validate()),
                Slot::Nested(sub) => {
                    for err in sub.validate() {
                        errors.push(err.nested_under(name));
                    }
                }
            }
        }
        errors
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .slots()
            .map(|(name, slot)| {
                let value = match slot {
                    Slot::Scalar(field) => field.get().to_json(),
                    Slot::Nested(sub) => sub.to_json(),
                };
                (name.to_string(), value)
            })
            .collect();
        serde_json::Value::Object(map)
    }
}
