//! Compile-time schema registry.
//!
//! Schemas are registered with [`register_schema!`](crate::register_schema)
//! and collected through `inventory`, so collections can be built from a
//! table name and every known table can be installed in one call.
//!
//! ```ignore
//! use arkorm::{register_schema, Collection, Schema};
//!
//! static USERS: Schema = Schema::new("users", &[/* ... */]);
//! register_schema!(USERS);
//!
//! let users = Collection::for_table(&conn, "users")?;
//! ```

use crate::collection::Collection;
use crate::connection::Connection;
use crate::error::OrmResult;
use crate::schema::Schema;

/// Marker type bound to a static schema.
pub trait Model {
    const SCHEMA: &'static Schema;
}

/// Registration entry submitted by [`register_schema!`](crate::register_schema).
pub struct SchemaRegistration {
    pub schema: &'static Schema,
}

impl SchemaRegistration {
    pub const fn new(schema: &'static Schema) -> Self {
        Self { schema }
    }
}

inventory::collect!(SchemaRegistration);

/// Register a `static` [`Schema`](crate::Schema) with the global registry.
#[macro_export]
macro_rules! register_schema {
    ($schema:path) => {
        $crate::inventory::submit! {
            $crate::registry::SchemaRegistration::new(&$schema)
        }
    };
}

/// Every registered schema, ordered by table name.
pub fn schemas() -> Vec<&'static Schema> {
    let mut all: Vec<&'static Schema> = inventory::iter::<SchemaRegistration>
        .into_iter()
        .map(|reg| reg.schema)
        .collect();
    all.sort_by_key(|s| s.table);
    all.dedup_by(|a, b| std::ptr::eq(*a, *b));
    all
}

pub fn lookup(table: &str) -> Option<&'static Schema> {
    inventory::iter::<SchemaRegistration>
        .into_iter()
        .map(|reg| reg.schema)
        .find(|s| s.table == table)
}

/// Create every registered table that does not exist yet.
///
/// Returns the tables that were created.
pub async fn install_all<C: Connection>(conn: &C) -> OrmResult<Vec<&'static str>> {
    let mut created = Vec::new();
    for schema in schemas() {
        let mut collection = Collection::new(conn, schema);
        if collection.installed().await? {
            continue;
        }
        collection.install().await?;
        created.push(schema.table);
    }
    if !created.is_empty() {
        tracing::info!(target: "arkorm.collection", tables = ?created, "installed tables");
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Row;
    use crate::mock::MockConnection;
    use crate::schema::{ColumnDef, SlotDef};

    static TAGS: Schema = Schema::new(
        "registry_tags",
        &[
            SlotDef::Column(ColumnDef::int("id").auto_increment()),
            SlotDef::Column(ColumnDef::varchar("label", 32)),
        ],
    );

    crate::register_schema!(TAGS);

    struct Tag;

    impl Model for Tag {
        const SCHEMA: &'static Schema = &TAGS;
    }

    #[test]
    fn registered_schema_is_found() {
        assert!(schemas().iter().any(|s| s.table == "registry_tags"));
        assert!(std::ptr::eq(lookup("registry_tags").unwrap(), &TAGS));
        assert!(lookup("nope").is_none());
    }

    #[test]
    fn for_table_and_for_model_agree() {
        let conn = MockConnection::new();
        let by_name = Collection::for_table(&conn, "registry_tags").unwrap();
        let by_model = Collection::for_model::<Tag>(&conn);
        assert!(std::ptr::eq(by_name.schema(), by_model.schema()));

        let err = Collection::for_table(&conn, "missing").unwrap_err();
        assert!(err.is_build_error());
    }

    #[tokio::test]
    async fn install_all_skips_existing_tables() {
        let conn = MockConnection::new();
        for schema in schemas() {
            if schema.table == "registry_tags" {
                // SHOW TABLES LIKE finds nothing, then CREATE TABLE runs.
                conn.push_rows(vec![]);
                conn.push_affected(0);
            } else {
                conn.push_rows(vec![Row::new().with("Tables_in_db", schema.table)]);
            }
        }

        let created = install_all(&conn).await.unwrap();
        assert_eq!(created, vec!["registry_tags"]);
        assert!(
            conn.sql_log()
                .iter()
                .any(|sql| sql.starts_with("CREATE TABLE `registry_tags`"))
        );
    }
}
