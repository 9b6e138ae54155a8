//! Runtime configuration.
//!
//! Loaded from TOML or built in code:
//!
//! ```
//! use arkorm::{EscapeMode, OrmConfig};
//!
//! let config = OrmConfig::from_toml_str(
//!     r#"
//!     escape_mode = "verbatim"
//!
//!     [sql_log]
//!     enabled = true
//!     max_sql_length = 120
//!     slow_query_threshold_ms = 250
//!     "#,
//! )?;
//! assert_eq!(config.escape_mode, EscapeMode::Verbatim);
//! assert_eq!(config.sql_log.max_sql_length, Some(120));
//! # Ok::<(), arkorm::OrmError>(())
//! ```

use crate::error::OrmResult;
use crate::statement::EscapeMode;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrmConfig {
    /// How string values are rendered by [`Statement::to_literal_sql`](crate::Statement::to_literal_sql).
    pub escape_mode: EscapeMode,
    pub sql_log: SqlLogConfig,
}

impl OrmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(s: &str) -> OrmResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn with_escape_mode(mut self, mode: EscapeMode) -> Self {
        self.escape_mode = mode;
        self
    }

    pub fn with_sql_log(mut self, sql_log: SqlLogConfig) -> Self {
        self.sql_log = sql_log;
        self
    }
}

/// Settings for [`InstrumentedConnection`](crate::InstrumentedConnection).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SqlLogConfig {
    pub enabled: bool,
    /// Truncate logged SQL to this many bytes. `None` logs it whole.
    pub max_sql_length: Option<usize>,
    /// Statements slower than this are logged at WARN.
    pub slow_query_threshold_ms: Option<u64>,
}

impl Default for SqlLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_sql_length: Some(200),
            slow_query_threshold_ms: None,
        }
    }
}

impl SqlLogConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold_ms = Some(threshold.as_millis() as u64);
        self
    }

    pub fn slow_threshold(&self) -> Option<Duration> {
        self.slow_query_threshold_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_escape_strings() {
        let config = OrmConfig::from_toml_str("").unwrap();
        assert_eq!(config.escape_mode, EscapeMode::Escape);
        assert!(config.sql_log.enabled);
        assert_eq!(config.sql_log.slow_threshold(), None);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = OrmConfig::from_toml_str("escape_mode = \"sometimes\"").unwrap_err();
        assert!(matches!(err, crate::OrmError::Config(_)));

        let err = OrmConfig::from_toml_str("unknown = 1").unwrap_err();
        assert!(matches!(err, crate::OrmError::Config(_)));
    }

    #[test]
    fn builders() {
        let log = SqlLogConfig::default()
            .no_truncate()
            .slow_query_threshold(Duration::from_millis(50));
        let config = OrmConfig::new()
            .with_escape_mode(EscapeMode::Verbatim)
            .with_sql_log(log);
        assert_eq!(config.sql_log.max_sql_length, None);
        assert_eq!(config.sql_log.slow_threshold(), Some(Duration::from_millis(50)));
        assert_eq!(config.escape_mode, EscapeMode::Verbatim);
    }
}
