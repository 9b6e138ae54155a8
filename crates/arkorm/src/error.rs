//! Error types for arkorm

use thiserror::Error;

/// Result type alias for arkorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for statement building and execution.
///
/// Validation failures are not errors: they are returned as data from
/// `Entity::validate` (see [`crate::validation`]).
#[derive(Debug, Error)]
pub enum OrmError {
    /// The query compiler was asked to build a statement from an invalid state
    #[error("Build error: {0}")]
    Build(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// The backend rejected or failed a statement
    #[error("Query error: {message} (sql: {sql})")]
    Query { sql: String, message: String },

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Accessor used with a property the entity does not own
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(String),
}

impl OrmError {
    /// Create a build error
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a query error for a specific statement
    pub fn query(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            sql: sql.into(),
            message: message.into(),
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an unknown property error
    pub fn unknown_property(name: impl Into<String>) -> Self {
        Self::UnknownProperty(name.into())
    }

    /// Check if this is a build error
    pub fn is_build_error(&self) -> bool {
        matches!(self, Self::Build(_))
    }

    /// Check if this error came from the backend (connection or statement failure)
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Query { .. })
    }
}

impl From<toml::de::Error> for OrmError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
