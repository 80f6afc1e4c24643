use lazy_static::lazy_static;
use regex::Regex;

use crate::error::SqlRecordError;

const MAX_IDENTIFIER_LEN: usize = 128;

lazy_static! {
    static ref COLUMN_NAME: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("column pattern compiles");
    static ref TABLE_NAME: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
            .expect("table pattern compiles");
}

/// Validate a column name and return it double-quoted for SQL.
///
/// # Errors
/// `InvalidIdentifier` if the name is empty, too long, or has characters outside `[A-Za-z0-9_]`.
pub fn quote_column(name: &str) -> Result<String, SqlRecordError> {
    check(name, &COLUMN_NAME, "column")?;
    Ok(format!("\"{name}\""))
}

/// Validate a table name (optionally `schema.table`) and return it quoted part by part.
///
/// # Errors
/// `InvalidIdentifier` on any name outside the allow-list.
pub fn quote_table(name: &str) -> Result<String, SqlRecordError> {
    check(name, &TABLE_NAME, "table")?;
    Ok(name
        .split('.')
        .map(|part| format!("\"{part}\""))
        .collect::<Vec<_>>()
        .join("."))
}

fn check(name: &str, pattern: &Regex, what: &str) -> Result<(), SqlRecordError> {
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(SqlRecordError::InvalidIdentifier(format!(
            "{what} name longer than {MAX_IDENTIFIER_LEN} characters"
        )));
    }
    if pattern.is_match(name) {
        Ok(())
    } else {
        Err(SqlRecordError::InvalidIdentifier(format!(
            "{what} name {name:?} is not a plain identifier"
        )))
    }
}
