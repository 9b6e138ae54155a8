//! Compiled statements.

use crate::value::Value;
use serde::Deserialize;
use std::fmt;

/// Which statement a [`Query`](crate::Query) compiles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementKind {
    CreateTable,
    #[default]
    Select,
    Delete,
    Insert,
    Update,
    DropTable,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::CreateTable => "CREATE TABLE",
            StatementKind::Select => "SELECT",
            StatementKind::Delete => "DELETE",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::DropTable => "DROP TABLE",
        }
    }

    /// Whether the statement produces a row set.
    pub fn returns_rows(self) -> bool {
        matches!(self, StatementKind::Select)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How string values are written when a statement is rendered as literal SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapeMode {
    /// Escape quotes, backslashes and control bytes before quoting.
    #[default]
    Escape,
    /// Quote without escaping. Only safe for trusted input.
    Verbatim,
}

/// SQL text with `?` placeholders plus the values bound to them, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub sql: String,
    pub params: Vec<Value>,
    pub escape_mode: EscapeMode,
}

impl Statement {
    pub fn new(kind: StatementKind, sql: impl Into<String>) -> Self {
        Self {
            kind,
            sql: sql.into(),
            params: Vec::new(),
            escape_mode: EscapeMode::default(),
        }
    }

    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    pub fn with_escape_mode(mut self, mode: EscapeMode) -> Self {
        self.escape_mode = mode;
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Render the statement with every placeholder replaced by its value.
    ///
    /// Placeholders inside quoted strings or identifiers are left alone.
    /// Surplus placeholders (more `?` than values) are kept as-is.
    pub fn to_literal_sql(&self) -> String {
        let mut out = String::with_capacity(self.sql.len() + self.params.len() * 8);
        let mut params = self.params.iter();
        let mut quote: Option<char> = None;
        let mut escaped = false;

        for ch in self.sql.chars() {
            match quote {
                Some(q) => {
                    out.push(ch);
                    if escaped {
                        escaped = false;
                    } else if ch == '\\' && q != '`' {
                        escaped = true;
                    } else if ch == q {
                        quote = None;
                    }
                }
                None => match ch {
                    '\'' | '"' | '`' => {
                        quote = Some(ch);
                        out.push(ch);
                    }
                    '?' => match params.next() {
                        Some(value) => self.push_literal(&mut out, value),
                        None => out.push('?'),
                    },
                    _ => out.push(ch),
                },
            }
        }
        out
    }

    fn push_literal(&self, out: &mut String, value: &Value) {
        match value {
            Value::Null => out.push_str("NULL"),
            Value::Bool(b) => out.push_str(if *b { "1" } else { "0" }),
            Value::Int(v) => out.push_str(&v.to_string()),
            Value::Float(v) if v.is_finite() => out.push_str(&v.to_string()),
            Value::Float(_) => out.push_str("NULL"),
            Value::Text(s) => {
                out.push('\'');
                match self.escape_mode {
                    EscapeMode::Escape => escape_string_into(out, s),
                    EscapeMode::Verbatim => out.push_str(s),
                }
                out.push('\'');
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// MySQL string-literal escaping.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    escape_string_into(&mut out, s);
    out
}

fn escape_string_into(out: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x1a' => out.push_str("\\Z"),
            c => out.push(c),
        }
    }
}
