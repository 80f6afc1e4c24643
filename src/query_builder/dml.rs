use crate::error::SqlRecordError;
use crate::types::{FieldMap, RowValues};

use super::identifier::{quote_column, quote_table};
use super::{QueryState, RenderedQuery};

/// `INSERT INTO <table> (<cols>) VALUES (?, ...)` with columns in map order.
///
/// # Errors
/// `InvalidInsert` for an empty map, `InvalidIdentifier` for a bad table or column name.
pub fn render_insert(table: &str, fields: &FieldMap) -> Result<RenderedQuery, SqlRecordError> {
    if fields.is_empty() {
        return Err(SqlRecordError::InvalidInsert(format!(
            "insert into {table} needs at least one column"
        )));
    }
    let columns = fields
        .columns()
        .map(quote_column)
        .collect::<Result<Vec<_>, _>>()?;
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})",
        quote_table(table)?,
        columns.join(", ")
    );
    Ok(RenderedQuery {
        sql,
        params: fields.values().cloned().collect(),
    })
}

/// `SELECT * FROM <table> WHERE <pk> = ? LIMIT 1`.
///
/// # Errors
/// `InvalidIdentifier` for a bad table or key name.
pub fn render_select_by_key(
    table: &str,
    primary_key: &str,
    id: i64,
) -> Result<RenderedQuery, SqlRecordError> {
    Ok(RenderedQuery {
        sql: format!(
            "SELECT * FROM {} WHERE {} = ? LIMIT 1",
            quote_table(table)?,
            quote_column(primary_key)?
        ),
        params: vec![RowValues::Int(id)],
    })
}

/// `UPDATE <table> SET a = ?, ... WHERE <pk> = ?`.
///
/// # Errors
/// `InvalidInsert` for an empty map, `InvalidIdentifier` for a bad name.
pub fn render_update_by_key(
    table: &str,
    primary_key: &str,
    id: i64,
    fields: &FieldMap,
) -> Result<RenderedQuery, SqlRecordError> {
    let (mut sql, mut params) = update_head(table, fields)?;
    sql.push_str(&format!(" WHERE {} = ?", quote_column(primary_key)?));
    params.push(RowValues::Int(id));
    Ok(RenderedQuery { sql, params })
}

/// `DELETE FROM <table> WHERE <pk> = ?`.
///
/// # Errors
/// `InvalidIdentifier` for a bad table or key name.
pub fn render_delete_by_key(
    table: &str,
    primary_key: &str,
    id: i64,
) -> Result<RenderedQuery, SqlRecordError> {
    Ok(RenderedQuery {
        sql: format!(
            "DELETE FROM {} WHERE {} = ?",
            quote_table(table)?,
            quote_column(primary_key)?
        ),
        params: vec![RowValues::Int(id)],
    })
}

impl QueryState {
    /// `UPDATE` every row the predicates match. SET values bind before predicate values.
    ///
    /// Ordering clauses are ignored.
    ///
    /// # Errors
    /// `InvalidPredicate` when there are no predicates (a table-wide update is refused),
    /// `InvalidInsert` for an empty map.
    pub fn render_update_where(&self, fields: &FieldMap) -> Result<RenderedQuery, SqlRecordError> {
        self.require_predicates("update")?;
        let (mut sql, mut params) = update_head(&self.table, fields)?;
        self.push_where(&mut sql, &mut params)?;
        Ok(RenderedQuery { sql, params })
    }

    /// `DELETE` every row the predicates match.
    ///
    /// # Errors
    /// `InvalidPredicate` when there are no predicates.
    pub fn render_delete_where(&self) -> Result<RenderedQuery, SqlRecordError> {
        self.require_predicates("delete")?;
        let mut sql = format!("DELETE FROM {}", quote_table(&self.table)?);
        let mut params = Vec::with_capacity(self.predicates.len());
        self.push_where(&mut sql, &mut params)?;
        Ok(RenderedQuery { sql, params })
    }

    fn require_predicates(&self, verb: &str) -> Result<(), SqlRecordError> {
        if self.predicates.is_empty() {
            return Err(SqlRecordError::InvalidPredicate(format!(
                "refusing to {verb} every row of {} without a predicate",
                self.table
            )));
        }
        Ok(())
    }
}

fn update_head(
    table: &str,
    fields: &FieldMap,
) -> Result<(String, Vec<RowValues>), SqlRecordError> {
    if fields.is_empty() {
        return Err(SqlRecordError::InvalidInsert(format!(
            "update of {table} needs at least one column"
        )));
    }
    let assignments = fields
        .columns()
        .map(|c| quote_column(c).map(|q| format!("{q} = ?")))
        .collect::<Result<Vec<_>, _>>()?;
    let sql = format!("UPDATE {} SET {}", quote_table(table)?, assignments.join(", "));
    let mut params = Vec::with_capacity(fields.len() + 1);
    params.extend(fields.values().cloned());
    Ok((sql, params))
}
