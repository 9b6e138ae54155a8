//! CREATE TABLE rendering.

use crate::error::{OrmError, OrmResult};
use crate::ident::{format_field_name, quote_ident};
use crate::schema::ColumnDescriptor;
use crate::statement::escape_string;
use crate::value::Value;

pub(crate) fn render(table: &str, columns: &[ColumnDescriptor]) -> OrmResult<String> {
    if columns.is_empty() {
        return Err(OrmError::build(format!(
            "No columns for CREATE TABLE {table}"
        )));
    }

    let mut clauses = Vec::with_capacity(columns.len() + 2);
    let mut keys = Vec::new();
    let mut indices = Vec::new();

    for column in columns {
        clauses.push(column_clause(column));
        let primary = column.primary_key || column.auto_increment;
        if primary {
            keys.push(column.name.as_str());
        } else if column.unique {
            indices.push((column.name.as_str(), true));
        } else if column.index {
            indices.push((column.name.as_str(), false));
        }
    }

    match keys.as_slice() {
        [] => {}
        [key] => {
            let key = quote_ident(key);
            clauses.push(format!("PRIMARY KEY {key} ({key})"));
        }
        many => {
            let list: Vec<String> = many.iter().map(|k| quote_ident(k)).collect();
            clauses.push(format!("PRIMARY KEY ({})", list.join(", ")));
        }
    }

    for (name, unique) in indices {
        let name = quote_ident(name);
        let prefix = if unique { "UNIQUE " } else { "" };
        clauses.push(format!("{prefix}KEY {name} ({name})"));
    }

    Ok(format!(
        "CREATE TABLE {} (\n{}\n)",
        format_field_name(table)?,
        clauses.join(",\n")
    ))
}

fn column_clause(column: &ColumnDescriptor) -> String {
    let mut clause = format!("{} {}", quote_ident(&column.name), column.sql_type);
    if column.size > 0 {
        clause.push_str(&format!("({})", column.size));
    }
    if !column.nullable {
        clause.push_str(" NOT NULL");
    }
    match &column.default {
        None | Some(Value::Null) => {}
        Some(Value::Text(s)) => clause.push_str(&format!(" DEFAULT '{}'", escape_string(s))),
        Some(other) => clause.push_str(&format!(" DEFAULT {other}")),
    }
    if column.auto_increment {
        clause.push_str(" AUTO_INCREMENT");
    }
    clause
}
