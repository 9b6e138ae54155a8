//! Table mapper with cascading persistence.
//!
//! A [`Collection`] binds one [`Schema`] to a connection. Writes walk the
//! entity graph (sub-entities first), reads widen the statement with one
//! INNER JOIN per nested slot and split the aliased columns back into nested
//! entities through a [`Binder`].
//!
//! ```ignore
//! use arkorm::{Collection, Filter};
//!
//! let mut users = Collection::new(&conn, &USERS);
//! let mut user = users.new_entity();
//! user.set("name", "Ann")?;
//! users.insert(&mut user).await?;
//!
//! let found = users.find(&Filter::new().eq("address.city", "Oslo")).await?;
//! ```

mod cascade;
mod select;


use crate::binder::{Binder, DbBinder};
use crate::config::OrmConfig;
use crate::connection::Connection;
use crate::entity::Entity;
use crate::error::{OrmError, OrmResult};
use crate::filter::Filter;
use crate::query::Query;
use crate::registry::{self, Model};
use crate::schema::Schema;
use crate::value::Value;
use cascade::Cascade;

const LOG_TARGET: &str = "arkorm.collection";

/// Maps entities of one schema to their table.
#[derive(Debug)]
pub struct Collection<C, B = DbBinder> {
    schema: &'static Schema,
    conn: C,
    query: Query,
    binder: B,
}

impl<C: Connection> Collection<C> {
    pub fn new(conn: C, schema: &'static Schema) -> Self {
        Self {
            schema,
            conn,
            query: Query::new(),
            binder: DbBinder,
        }
    }

    pub fn for_model<M: Model>(conn: C) -> Self {
        Self::new(conn, M::SCHEMA)
    }

    /// Collection for a schema registered with [`register_schema!`](crate::register_schema).
    pub fn for_table(conn: C, table: &str) -> OrmResult<Self> {
        let schema = registry::lookup(table)
            .ok_or_else(|| OrmError::build(format!("no schema registered for table {table}")))?;
        Ok(Self::new(conn, schema))
    }
}

impl<C: Connection, B: Binder> Collection<C, B> {
    /// Swap the binder used by reads.
    pub fn with_binder<B2: Binder>(self, binder: B2) -> Collection<C, B2> {
        Collection {
            schema: self.schema,
            conn: self.conn,
            query: self.query,
            binder,
        }
    }

    pub fn with_config(mut self, config: &OrmConfig) -> Self {
        self.query.set_escape_mode(config.escape_mode);
        self
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn table(&self) -> &'static str {
        self.schema.table
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// The builder as left by the last operation.
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn new_entity(&self) -> Entity {
        Entity::new(self.schema)
    }

    // ==================== Table lifecycle ====================

    /// CREATE TABLE from the schema's column definitions.
    pub async fn install(&mut self) -> OrmResult<()> {
        self.query.create_table(self.schema.table);
        for descriptor in self.schema.descriptors() {
            self.query.add_column(descriptor);
        }
        self.query.execute(&self.conn).await?;
        tracing::debug!(target: LOG_TARGET, table = self.schema.table, "installed table");
        Ok(())
    }

    pub async fn uninstall(&mut self) -> OrmResult<()> {
        self.query.drop_table(&self.conn, self.schema.table).await?;
        tracing::debug!(target: LOG_TARGET, table = self.schema.table, "dropped table");
        Ok(())
    }

    pub async fn installed(&self) -> OrmResult<bool> {
        self.query.table_exists(&self.conn, self.schema.table).await
    }

    // ==================== Writes ====================

    /// Insert a new entity and every new sub-entity.
    ///
    /// Returns `false` without writing anything when `entity` is not new.
    pub async fn insert(&mut self, entity: &mut Entity) -> OrmResult<bool> {
        self.ensure_schema(entity)?;
        let mut cascade = Cascade::new(&self.conn, &mut self.query);
        let result = cascade.insert(entity).await;
        report_partial(self.schema.table, "insert", cascade.applied, &result);
        result
    }

    /// Write the modified fields of an entity and cascade into its sub-entities.
    ///
    /// Returns `true` without writing anything when `entity` is not modified.
    pub async fn update_entity(&mut self, entity: &mut Entity) -> OrmResult<bool> {
        self.ensure_schema(entity)?;
        let mut cascade = Cascade::new(&self.conn, &mut self.query);
        let result = cascade.update(entity).await;
        report_partial(self.schema.table, "update", cascade.applied, &result);
        result
    }

    /// `UPDATE table SET ... WHERE filter` on root columns.
    pub async fn update_where<K, I>(&mut self, assignments: I, filter: &Filter) -> OrmResult<u64>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        self.query.update(self.schema.table);
        for (field, value) in assignments {
            self.query.set(field, value);
        }
        if let Some((key, _)) = filter.iter().find(|(key, _)| key.contains('.')) {
            return Err(OrmError::build(format!(
                "update on {} cannot filter on nested field {key}",
                self.schema.table
            )));
        }
        select::push_filter(&mut self.query, self.schema, filter)?;
        Ok(self.query.execute(&self.conn).await?.affected())
    }

    // ==================== Reads ====================

    pub async fn find(&mut self, filter: &Filter) -> OrmResult<Vec<Entity>> {
        self.prepare_find(filter)?;
        self.fetch().await
    }

    /// First match, or `None`.
    pub async fn find_one(&mut self, filter: &Filter) -> OrmResult<Option<Entity>> {
        self.prepare_find(filter)?;
        self.query.limit(1);
        Ok(self.fetch().await?.into_iter().next())
    }

    pub async fn count(&mut self, filter: &Filter) -> OrmResult<i64> {
        self.query.count().from(self.schema.table);
        select::push_joins(&mut self.query, self.schema)?;
        select::push_filter(&mut self.query, self.schema, filter)?;

        let rows = self.query.execute(&self.conn).await?.into_rows();
        let Some(row) = rows.first() else {
            return Ok(0);
        };
        let Some(raw) = row
            .get("COUNT(*)")
            .or_else(|| row.iter().next().map(|(_, v)| v))
        else {
            return Ok(0);
        };
        raw.as_i64()
            .or_else(|| raw.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| OrmError::decode("COUNT(*)", format!("not a count: {raw}")))
    }

    /// Delete matching root rows. Returns the affected-row count.
    pub async fn delete(&mut self, filter: &Filter) -> OrmResult<u64> {
        self.query.delete().from(self.schema.table);
        select::push_joins(&mut self.query, self.schema)?;
        select::push_filter(&mut self.query, self.schema, filter)?;
        let affected = self.query.execute(&self.conn).await?.affected();
        tracing::debug!(target: LOG_TARGET, table = self.schema.table, affected, "deleted rows");
        Ok(affected)
    }

    /// Re-read `entity` by its primary keys and reconcile its synced state.
    ///
    /// An entity without key values, or whose row is gone, becomes new.
    pub async fn refresh_state(&mut self, entity: &mut Entity) -> OrmResult<()> {
        self.ensure_schema(entity)?;
        let filter: Option<Filter> = {
            let keys = entity.primary_keys();
            let complete = !keys.is_empty() && keys.iter().all(|k| !k.get().is_null());
            complete.then(|| keys.iter().map(|k| (k.name(), k.get().clone())).collect())
        };
        let Some(filter) = filter else {
            entity.reconcile_with_database(None);
            return Ok(());
        };

        let remote = self.find_one(&filter).await?;
        entity.reconcile_with_database(remote.as_ref());
        Ok(())
    }

    fn prepare_find(&mut self, filter: &Filter) -> OrmResult<()> {
        self.query
            .find()
            .fields(select::select_fields(self.schema))
            .from(self.schema.table);
        select::push_joins(&mut self.query, self.schema)?;
        select::push_filter(&mut self.query, self.schema, filter)
    }

    async fn fetch(&self) -> OrmResult<Vec<Entity>> {
        let rows = self.query.execute(&self.conn).await?.into_rows();
        rows.iter()
            .map(|row| self.binder.bind(self.schema, row))
            .collect()
    }

    fn ensure_schema(&self, entity: &Entity) -> OrmResult<()> {
        if std::ptr::eq(entity.schema(), self.schema) {
            Ok(())
        } else {
            Err(OrmError::build(format!(
                "entity of {} passed to the {} collection",
                entity.table(),
                self.schema.table
            )))
        }
    }
}

/// Surface cascades that failed after some statements were already applied.
fn report_partial(table: &str, operation: &str, applied: usize, result: &OrmResult<bool>) {
    if let Err(error) = result
        && applied > 0
    {
        tracing::warn!(
            target: LOG_TARGET,
            table,
            operation,
            applied,
            error = %error,
            "cascade failed after statements were applied; they are not rolled back"
        );
    }
}
