//! SQL identifier handling.
//!
//! All identifier quoting goes through this module. The backend is MySQL, so
//! identifiers are wrapped in backticks and embedded backticks are doubled.
//!
//! - Unquoted parts are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts (`` `like this` ``) allow any characters except NUL
//!
//! # Example
//! ```
//! use arkorm::ident::{Ident, quote_ident};
//!
//! let t = Ident::parse("users.name")?;
//! assert_eq!(t.to_sql(), "`users`.`name`");
//! assert_eq!(quote_ident("address.city"), "`address.city`");
//! # Ok::<(), arkorm::OrmError>(())
//! ```

use crate::error::{OrmError, OrmResult};

/// Quote a single identifier verbatim (dots are kept inside the quotes).
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    push_quoted(&mut out, name);
    out
}

/// Format a field reference for use in a statement.
///
/// Plain names and dotted `table.column` paths are quoted part by part.
/// Names that are already quoted, or that are expressions such as
/// `COUNT(*)` or `users.*`, are passed through untouched.
pub fn format_field_name(name: &str) -> OrmResult<String> {
    if name.starts_with('`') || name.starts_with('\'') || name.contains('(') {
        return Ok(name.to_string());
    }
    if let Some(table) = name.strip_suffix(".*") {
        return Ok(format!("{}.*", Ident::parse(table)?.to_sql()));
    }
    if name == "*" {
        return Ok(name.to_string());
    }
    Ok(Ident::parse(name)?.to_sql())
}

fn push_quoted(out: &mut String, name: &str) {
    out.push('`');
    for ch in name.chars() {
        if ch == '`' {
            out.push_str("``");
        } else {
            out.push(ch);
        }
    }
    out.push('`');
}

/// A SQL identifier (column, table, or `table.column`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<String>,
}

impl Ident {
    /// Parse an identifier string, supporting dotted and backtick-quoted forms.
    ///
    /// - Dotted: `table.column`
    /// - Quoted: `` `odd name`.`col` ``
    pub fn parse(s: &str) -> OrmResult<Self> {
        if s.is_empty() {
            return Err(OrmError::build("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(OrmError::build("Identifier cannot contain NUL character"));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(OrmError::build(format!(
                                "Trailing '.' in identifier '{s}'"
                            )));
                        }
                    }
                    Some(c) => {
                        return Err(OrmError::build(format!(
                            "Expected '.' between identifier parts, got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'`') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('`') => {
                            if chars.peek() == Some(&'`') {
                                chars.next();
                                name.push('`');
                            } else {
                                break;
                            }
                        }
                        Some(c) => name.push(c),
                        None => {
                            return Err(OrmError::build(format!(
                                "Unclosed quoted identifier '{s}'"
                            )));
                        }
                    }
                }
                if name.is_empty() {
                    return Err(OrmError::build("Empty quoted identifier"));
                }
                parts.push(name);
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let valid = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !valid {
                    return Err(OrmError::build(format!(
                        "Invalid character '{c}' in identifier '{s}'"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(OrmError::build(format!("Empty identifier segment in '{s}'")));
            }
            parts.push(name);
        }

        Ok(Self { parts })
    }

    /// Render the identifier as SQL, quoting every part.
    pub fn to_sql(&self) -> String {
        let cap = self.parts.iter().map(|p| p.len() + 3).sum();
        let mut out = String::with_capacity(cap);
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            push_quoted(&mut out, part);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_simple() {
        let ident = Ident::parse("users").unwrap();
        assert_eq!(ident.to_sql(), "`users`");
    }

    #[test]
    fn ident_dotted() {
        let ident = Ident::parse("users.name").unwrap();
        assert_eq!(ident.to_sql(), "`users`.`name`");
    }

    #[test]
    fn ident_quoted_with_escape() {
        let ident = Ident::parse("`has``tick`").unwrap();
        assert_eq!(ident.parts, vec!["has`tick".to_string()]);
        assert_eq!(ident.to_sql(), "`has``tick`");
    }

    #[test]
    fn ident_quoted_part_may_hold_dots() {
        let ident = Ident::parse("`address.country`.`name`").unwrap();
        assert_eq!(ident.to_sql(), "`address.country`.`name`");
    }

    #[test]
    fn ident_rejects_bad_input() {
        assert!(Ident::parse("").is_err());
        assert!(Ident::parse("1table").is_err());
        assert!(Ident::parse("my table").is_err());
        assert!(Ident::parse("users..name").is_err());
        assert!(Ident::parse("users.").is_err());
        assert!(Ident::parse("`unclosed").is_err());
    }

    #[test]
    fn field_names_are_formatted_once() {
        assert_eq!(format_field_name("name").unwrap(), "`name`");
        assert_eq!(format_field_name("`name`").unwrap(), "`name`");
        assert_eq!(format_field_name("COUNT(*)").unwrap(), "COUNT(*)");
        assert_eq!(format_field_name("users.*").unwrap(), "`users`.*");
        assert_eq!(format_field_name("users.id").unwrap(), "`users`.`id`");
    }
}
