//! Typed column values with dirty tracking.

use crate::schema::{ColumnDef, ColumnDescriptor, FieldKind, ForeignKey};
use crate::validation::{ValidationCode, ValidationError, ValidationErrors, regex_is_match};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// One column of an entity.
///
/// Holds the current value next to the last value known to be stored in the
/// database. The field is modified whenever the two differ.
#[derive(Debug, Clone)]
pub struct Field {
    def: &'static ColumnDef,
    value: Value,
    synced: Value,
}

impl Field {
    pub fn new(def: &'static ColumnDef) -> Self {
        Self {
            def,
            value: Value::Null,
            synced: Value::Null,
        }
    }

    pub fn def(&self) -> &'static ColumnDef {
        self.def
    }

    pub fn name(&self) -> &'static str {
        self.def.name
    }

    pub fn label(&self) -> &'static str {
        self.def.label
    }

    pub fn kind(&self) -> FieldKind {
        self.def.kind
    }

    pub fn is_primary_key(&self) -> bool {
        self.def.primary_key || self.def.auto_increment
    }

    pub fn is_auto_key(&self) -> bool {
        self.def.auto_increment
    }

    pub fn foreign_key(&self) -> Option<ForeignKey> {
        self.def.foreign_key
    }

    pub fn get(&self) -> &Value {
        &self.value
    }

    pub fn set(&mut self, value: impl Into<Value>) {
        self.value = value.into();
    }

    pub fn synced_value(&self) -> &Value {
        &self.synced
    }

    pub fn modified(&self) -> bool {
        self.value != self.synced
    }

    /// Record that the current value is now stored.
    pub fn mark_synced(&mut self) {
        self.synced = self.value.clone();
    }

    /// Record what the database currently holds, leaving the current value alone.
    pub fn adopt_database_value(&mut self, value: Value) {
        self.synced = value;
    }

    /// Convert a raw value (form input, driver output) into this field's type.
    ///
    /// Unparseable input becomes [`Value::Null`].
    pub fn coerce(&self, raw: &Value) -> Value {
        coerce(self.def.kind, raw)
    }

    /// Display form of the current value.
    pub fn format(&self) -> String {
        match (self.def.kind, &self.value) {
            (FieldKind::Timestamp, Value::Int(secs)) => DateTime::from_timestamp(*secs, 0)
                .map(|dt| dt.format("%m/%d/%Y").to_string())
                .unwrap_or_default(),
            (_, value) => value.to_string(),
        }
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        let def = self.def;

        if def.required && self.value.is_empty() {
            errors.push(ValidationError::new(
                def.name,
                ValidationCode::Required,
                format!("{} is required.", def.label),
            ));
        }

        if let Some(pattern) = def.validate
            && !self.value.is_null()
        {
            let formatted = self.format();
            match regex_is_match(pattern, &formatted) {
                Ok(true) => {}
                Ok(false) => errors.push(ValidationError::new(
                    def.name,
                    ValidationCode::Pattern,
                    format!("{formatted} is not a valid {}.", def.label),
                )),
                Err(e) => {
                    tracing::warn!(
                        target: "arkorm.validation",
                        field = def.name,
                        pattern,
                        error = %e,
                        "invalid validation rule"
                    );
                    errors.push(ValidationError::new(
                        def.name,
                        ValidationCode::Pattern,
                        format!("{} has an invalid validation rule.", def.label),
                    ));
                }
            }
        }

        errors
    }

    pub fn to_descriptor(&self) -> ColumnDescriptor {
        self.def.descriptor()
    }
}

/// Type coercion shared by fields and the row binder.
pub fn coerce(kind: FieldKind, raw: &Value) -> Value {
    match kind {
        FieldKind::Text | FieldKind::Varchar => match raw {
            Value::Null => Value::Null,
            Value::Text(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        },
        FieldKind::Int => match raw {
            Value::Int(v) => Value::Int(*v),
            Value::Float(v) if v.is_finite() => Value::Int(v.trunc() as i64),
            Value::Text(s) => parse_int(s).map_or(Value::Null, Value::Int),
            _ => Value::Null,
        },
        FieldKind::Float => match raw {
            Value::Float(v) => Value::Float(*v),
            Value::Int(v) => Value::Float(*v as f64),
            Value::Text(s) => parse_numeric(s).map_or(Value::Null, Value::Float),
            _ => Value::Null,
        },
        FieldKind::Bool => match raw {
            Value::Bool(b) => Value::Bool(*b),
            Value::Int(1) => Value::Bool(true),
            Value::Int(0) => Value::Bool(false),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => Value::Bool(true),
                "0" | "false" => Value::Bool(false),
                _ => Value::Null,
            },
            _ => Value::Null,
        },
        FieldKind::Timestamp => match raw {
            Value::Int(v) => Value::Int(*v),
            Value::Float(v) if v.is_finite() => Value::Int(v.trunc() as i64),
            Value::Text(s) => parse_int(s)
                .or_else(|| parse_date(s))
                .map_or(Value::Null, Value::Int),
            _ => Value::Null,
        },
    }
}

fn parse_numeric(s: &str) -> Option<f64> {
    let s = s.trim();
    if !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_int(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| parse_numeric(trimmed).map(|v| v.trunc() as i64))
}

/// Parse a date string into epoch seconds (UTC).
fn parse_date(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp());
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%d %B %Y", "%B %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
        }
    }
    None
}
