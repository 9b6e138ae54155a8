//! Static table definitions.
//!
//! A [`Schema`] is the column-definition table an [`Entity`](crate::Entity) is
//! built from. Schemas are plain `static`s so nested relations can point at
//! each other by reference:
//!
//! ```
//! use arkorm::schema::{ColumnDef, Schema, SlotDef};
//!
//! static ADDRESSES: Schema = Schema::new(
//!     "addresses",
//!     &[
//!         SlotDef::Column(ColumnDef::int("id").auto_increment()),
//!         SlotDef::Column(ColumnDef::varchar("city", 64).required()),
//!     ],
//! );
//!
//! static USERS: Schema = Schema::new(
//!     "users",
//!     &[
//!         SlotDef::Column(ColumnDef::int("id").auto_increment()),
//!         SlotDef::Column(ColumnDef::varchar("name", 255).with_label("Name")),
//!         SlotDef::Column(ColumnDef::int("address_id").references("address", "id")),
//!         SlotDef::Nested { name: "address", schema: &ADDRESSES },
//!     ],
//! );
//!
//! assert_eq!(USERS.foreign_key_for("address").map(|c| c.name), Some("address_id"));
//! ```

use crate::value::Value;

/// Logical type of a column. Decides storage type and value coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Varchar,
    Int,
    Float,
    Bool,
    /// Epoch seconds stored in an integer column.
    Timestamp,
}

impl FieldKind {
    pub const fn sql_type(self) -> &'static str {
        match self {
            FieldKind::Text => "TEXT",
            FieldKind::Varchar => "VARCHAR",
            FieldKind::Int | FieldKind::Timestamp => "INT",
            FieldKind::Float => "FLOAT",
            FieldKind::Bool => "TINYINT",
        }
    }

    pub const fn default_size(self) -> u32 {
        match self {
            FieldKind::Varchar => 255,
            FieldKind::Int | FieldKind::Timestamp => 11,
            FieldKind::Bool => 1,
            FieldKind::Text | FieldKind::Float => 0,
        }
    }

    const fn default_nullable(self) -> bool {
        matches!(self, FieldKind::Text)
    }
}

/// Column default usable in a `static` definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(&'static str),
}

impl DefaultValue {
    pub fn to_value(self) -> Value {
        match self {
            DefaultValue::Int(v) => Value::Int(v),
            DefaultValue::Float(v) => Value::Float(v),
            DefaultValue::Bool(v) => Value::Bool(v),
            DefaultValue::Text(v) => Value::Text(v.to_string()),
        }
    }
}

/// Foreign-key reference: `property` is the nested slot the key points at,
/// `column` the referenced column inside that slot's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub property: &'static str,
    pub column: &'static str,
}

/// Static definition of one column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub sql_type: &'static str,
    pub size: u32,
    pub nullable: bool,
    pub default: Option<DefaultValue>,
    pub auto_increment: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub index: bool,
    pub required: bool,
    pub foreign_key: Option<ForeignKey>,
    /// Regular expression the formatted value must match.
    pub validate: Option<&'static str>,
}

impl ColumnDef {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label: name,
            kind,
            sql_type: kind.sql_type(),
            size: kind.default_size(),
            nullable: kind.default_nullable(),
            default: None,
            auto_increment: false,
            primary_key: false,
            unique: false,
            index: true,
            required: false,
            foreign_key: None,
            validate: None,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub const fn varchar(name: &'static str, size: u32) -> Self {
        Self::new(name, FieldKind::Varchar).with_size(size)
    }

    pub const fn int(name: &'static str) -> Self {
        Self::new(name, FieldKind::Int)
    }

    pub const fn float(name: &'static str) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, FieldKind::Timestamp)
    }

    /// Display label used in validation messages.
    pub const fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub const fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Override the storage type (`BIGINT`, `DATETIME`, ...).
    pub const fn with_sql_type(mut self, sql_type: &'static str) -> Self {
        self.sql_type = sql_type;
        self
    }

    /// Column default for CREATE TABLE.
    ///
    /// Meant for `static` schema definitions, where a misuse fails the build.
    ///
    /// # Panics
    ///
    /// Panics on a TEXT column, which MySQL does not allow a default for.
    pub const fn with_default(mut self, default: DefaultValue) -> Self {
        if matches!(self.kind, FieldKind::Text) {
            panic!("TEXT columns cannot have a default value");
        }
        self.default = Some(default);
        self
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Auto-increment identity column. Always implies primary key.
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self.primary_key = true;
        self
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Skip the secondary index CREATE TABLE would otherwise emit.
    pub const fn no_index(mut self) -> Self {
        self.index = false;
        self
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn references(mut self, property: &'static str, column: &'static str) -> Self {
        self.foreign_key = Some(ForeignKey { property, column });
        self
    }

    pub const fn validate(mut self, pattern: &'static str) -> Self {
        self.validate = Some(pattern);
        self
    }

    pub fn descriptor(&self) -> ColumnDescriptor {
        ColumnDescriptor {
            name: self.name.to_string(),
            sql_type: self.sql_type.to_string(),
            size: self.size,
            nullable: self.nullable,
            default: self.default.map(DefaultValue::to_value),
            auto_increment: self.auto_increment,
            primary_key: self.primary_key || self.auto_increment,
            unique: self.unique,
            index: self.index,
        }
    }
}

/// One named slot of an entity: either a column or a nested entity.
#[derive(Debug)]
pub enum SlotDef {
    Column(ColumnDef),
    Nested {
        name: &'static str,
        schema: &'static Schema,
    },
}

/// Table name plus the ordered slot definitions of its entity.
///
/// Nested schemas must not form a cycle.
#[derive(Debug)]
pub struct Schema {
    pub table: &'static str,
    pub slots: &'static [SlotDef],
}

impl Schema {
    pub const fn new(table: &'static str, slots: &'static [SlotDef]) -> Self {
        Self { table, slots }
    }

    /// Column definitions in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.slots.iter().filter_map(|slot| match slot {
            SlotDef::Column(def) => Some(def),
            SlotDef::Nested { .. } => None,
        })
    }

    /// Nested relations in declaration order.
    pub fn nested(&self) -> impl Iterator<Item = (&'static str, &'static Schema)> {
        self.slots.iter().filter_map(|slot| match slot {
            SlotDef::Nested { name, schema } => Some((*name, *schema)),
            SlotDef::Column(_) => None,
        })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns().find(|c| c.name == name)
    }

    pub fn nested_schema(&self, name: &str) -> Option<&'static Schema> {
        self.nested().find(|(n, _)| *n == name).map(|(_, s)| s)
    }

    /// The column acting as foreign key for the nested slot `property`.
    pub fn foreign_key_for(&self, property: &str) -> Option<&ColumnDef> {
        self.columns()
            .find(|c| c.foreign_key.is_some_and(|fk| fk.property == property))
    }

    /// The auto-increment column, if any.
    pub fn identity_column(&self) -> Option<&ColumnDef> {
        self.columns().find(|c| c.auto_increment)
    }

    pub fn descriptors(&self) -> Vec<ColumnDescriptor> {
        self.columns().map(ColumnDef::descriptor).collect()
    }
}

/// Column-definition record consumed by `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub sql_type: String,
    /// `0` means no size suffix.
    pub size: u32,
    pub nullable: bool,
    pub default: Option<Value>,
    pub auto_increment: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub index: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            size: 0,
            nullable: false,
            default: None,
            auto_increment: false,
            primary_key: false,
            unique: false,
            index: true,
        }
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self.primary_key = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn no_index(mut self) -> Self {
        self.index = false;
        self
    }
}
