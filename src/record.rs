use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value as JsonValue;

use crate::error::SqlRecordError;
use crate::gateway::Gateway;
use crate::query_builder::{render_delete_by_key, render_select_by_key, render_update_by_key};
use crate::results::Row;
use crate::types::{FieldMap, RowValues};

/// One row loaded through a [`Table`](crate::Table), addressable by its primary key.
///
/// The field snapshot is taken at load time. [`Record::update`] writes to the row but does not
/// refresh the snapshot; call [`Record::reload`] for that.
///
/// Clones share the destroyed flag, so once any copy deletes the row every copy refuses to
/// write, even if the engine later hands the same key to a new row.
#[derive(Debug, Clone)]
pub struct Record {
    table: String,
    primary_key: String,
    id: i64,
    fields: Row,
    gateway: Gateway,
    destroyed: Arc<AtomicBool>,
}

impl Record {
    /// Wrap a decoded row; the primary-key column must hold an integer.
    pub(crate) fn from_row(
        table: &str,
        primary_key: &str,
        fields: Row,
        gateway: Gateway,
    ) -> Result<Self, SqlRecordError> {
        let id = match fields.get(primary_key) {
            Some(RowValues::Int(id)) => *id,
            Some(other) => {
                return Err(SqlRecordError::DecodeError(format!(
                    "primary key {primary_key} of {table} is {}, expected an integer",
                    other.type_name()
                )));
            }
            None => {
                return Err(SqlRecordError::DecodeError(format!(
                    "rows of {table} have no {primary_key} column"
                )));
            }
        };
        Ok(Self {
            table: table.to_owned(),
            primary_key: primary_key.to_owned(),
            id,
            fields,
            gateway,
            destroyed: Arc::new(AtomicBool::new(false)),
        })
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Value of `column` in the snapshot.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&RowValues> {
        self.fields.get(column)
    }

    #[must_use]
    pub fn fields(&self) -> &Row {
        &self.fields
    }

    /// Snapshot as a JSON object keyed by column name.
    #[must_use]
    pub fn data(&self) -> JsonValue {
        self.fields.to_json()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Write `fields` to the row this record was loaded from.
    ///
    /// # Errors
    /// `InvalidInsert` for an empty map, `RecordNotFound` if the row no longer exists or this
    /// record was destroyed, `EngineError` if the engine rejects the statement.
    pub async fn update(&self, fields: &FieldMap) -> Result<(), SqlRecordError> {
        self.ensure_live()?;
        let rendered = render_update_by_key(&self.table, &self.primary_key, self.id, fields)?;
        let outcome = self.gateway.execute(&rendered).await?;
        if outcome.rows_affected == 0 {
            return Err(SqlRecordError::not_found(&self.table, self.id));
        }
        Ok(())
    }

    /// Delete the row. A second call fails with `RecordNotFound`.
    ///
    /// # Errors
    /// `RecordNotFound` if nothing was deleted, `EngineError` on engine failure.
    pub async fn destroy(&mut self) -> Result<(), SqlRecordError> {
        self.ensure_live()?;
        let rendered = render_delete_by_key(&self.table, &self.primary_key, self.id)?;
        let outcome = self.gateway.execute(&rendered).await?;
        if outcome.rows_affected == 0 {
            return Err(SqlRecordError::not_found(&self.table, self.id));
        }
        self.destroyed.store(true, Ordering::Release);
        Ok(())
    }

    /// Same as [`Record::destroy`].
    ///
    /// # Errors
    /// See [`Record::destroy`].
    pub async fn delete(&mut self) -> Result<(), SqlRecordError> {
        self.destroy().await
    }

    /// Re-read the snapshot by primary key.
    ///
    /// # Errors
    /// `RecordNotFound` if the row is gone.
    pub async fn reload(&mut self) -> Result<(), SqlRecordError> {
        self.ensure_live()?;
        let rendered = render_select_by_key(&self.table, &self.primary_key, self.id)?;
        let mut rows = self.gateway.query(&rendered).await?;
        match rows.results.pop() {
            Some(row) => {
                self.fields = row;
                Ok(())
            }
            None => Err(SqlRecordError::not_found(&self.table, self.id)),
        }
    }

    fn ensure_live(&self) -> Result<(), SqlRecordError> {
        if self.is_destroyed() {
            Err(SqlRecordError::not_found(&self.table, self.id))
        } else {
            Ok(())
        }
    }
}

/// Records in the order the query returned them.
#[derive(Debug, Clone, Default)]
pub struct RecordList {
    records: Vec<Record>,
}

impl RecordList {
    pub(crate) fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Record> {
        self.records.last()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<i64> {
        self.records.iter().map(Record::id).collect()
    }

    /// All snapshots as a JSON array of objects.
    #[must_use]
    pub fn data(&self) -> JsonValue {
        JsonValue::Array(self.records.iter().map(Record::data).collect())
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Record> {
        self.records
    }
}

impl IntoIterator for RecordList {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordList {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
