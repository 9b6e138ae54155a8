//! # arkorm
//!
//! A small MySQL persistence layer: a fluent statement compiler, entities
//! with field-level dirty tracking, and collections that write whole entity
//! graphs.
//!
//! ## Features
//!
//! - **Query compiler**: one [`Query`] builder for CREATE TABLE, SELECT, COUNT,
//!   INSERT, UPDATE, DELETE and DROP TABLE, with single-level condition groups
//! - **Dirty tracking**: every [`Field`] remembers its last stored value, and an
//!   [`Entity`] derives `new` / `synced` / `modified` from its fields and
//!   sub-entities
//! - **Cascading writes**: [`Collection::insert`] and
//!   [`Collection::update_entity`] write sub-entities first and carry generated
//!   keys into foreign keys
//! - **Joined reads**: nested entities are joined under their slot path and
//!   split back apart by a [`Binder`]
//! - **Statement logging**: wrap any connection in [`InstrumentedConnection`]
//!
//! ## Query compiler
//!
//! ```
//! use arkorm::{Conjunction, Op, Query};
//!
//! let mut q = Query::new();
//! q.find()
//!     .from("users")
//!     .where_eq("active", true)
//!     .group(Conjunction::Or)
//!     .where_eq("role", "admin")
//!     .where_with("karma", 100, Op::Gt, Conjunction::Or)
//!     .sort("name", true)
//!     .limit(10);
//!
//! let stmt = q.compile()?;
//! assert_eq!(
//!     stmt.sql,
//!     "SELECT * FROM `users` WHERE `active` = ? AND (`role` = ? OR `karma` > ?) ORDER BY `name` ASC LIMIT 10"
//! );
//! # Ok::<(), arkorm::OrmError>(())
//! ```
//!
//! ## Collections
//!
//! ```ignore
//! use arkorm::{Collection, Filter};
//!
//! let mut users = Collection::new(&conn, &USERS);
//!
//! let mut user = users.new_entity();
//! user.set("name", "Ann")?;
//! user.set_path("address.city", "Oslo")?;
//! users.insert(&mut user).await?; // inserts the address, then the user
//!
//! user.set("name", "Anne")?;
//! users.update_entity(&mut user).await?;
//!
//! let in_oslo = users.find(&Filter::new().eq("address.city", "Oslo")).await?;
//! ```

pub mod binder;
pub mod collection;
pub mod condition;
pub mod config;
pub mod connection;
pub mod entity;
pub mod error;
pub mod field;
pub mod filter;
pub mod ident;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod monitor;
pub mod query;
pub mod registry;
pub mod schema;
pub mod statement;
pub mod validation;
pub mod value;

pub use binder::{Binder, DbBinder};
pub use collection::Collection;
pub use condition::{Condition, Conjunction, JoinType, Op, Predicate};
pub use config::{OrmConfig, SqlLogConfig};
pub use connection::{Connection, Row};
pub use entity::{Entity, EntityState, Slot};
pub use error::{OrmError, OrmResult};
pub use field::Field;
pub use filter::Filter;
pub use ident::{Ident, format_field_name, quote_ident};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockConnection;
pub use monitor::InstrumentedConnection;
pub use query::{Join, Query, QueryOutput};
pub use registry::{Model, SchemaRegistration};
pub use schema::{ColumnDef, ColumnDescriptor, DefaultValue, FieldKind, ForeignKey, Schema, SlotDef};
pub use statement::{EscapeMode, Statement, StatementKind};
pub use validation::{ValidationCode, ValidationError, ValidationErrors};
pub use value::Value;

// Re-export inventory for use by `register_schema!`
pub use inventory;
