use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::codec;
use crate::error::SqlRecordError;
use crate::types::{FieldMap, RowValues};

/// A single decoded row.
///
/// Column names and the name-to-index lookup are shared by every row of the same result set.
#[derive(Debug, Clone)]
pub struct Row {
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
    values: Vec<RowValues>,
}

impl Row {
    /// Build a standalone row. Rows produced by a query share their lookup table instead.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<RowValues>) -> Self {
        let column_index = Arc::new(index_columns(&column_names));
        Self {
            column_names,
            column_index,
            values,
        }
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
    }

    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied()
    }

    /// Get a value by column name.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    /// Read a column as structured JSON, whatever its declared type.
    ///
    /// # Errors
    /// `DecodeError` if the column is missing or its text is not valid JSON.
    pub fn get_json(&self, column_name: &str) -> Result<JsonValue, SqlRecordError> {
        let value = self.get(column_name).ok_or_else(|| {
            SqlRecordError::DecodeError(format!("column {column_name} not present in row"))
        })?;
        codec::decode_json(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Render the row as a JSON object keyed by column name.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let object: Map<String, JsonValue> = self
            .iter()
            .map(|(k, v)| (k.to_owned(), codec::to_json(v)))
            .collect();
        JsonValue::Object(object)
    }

    /// Copy the row into a [`FieldMap`].
    #[must_use]
    pub fn to_field_map(&self) -> FieldMap {
        self.iter().map(|(k, v)| (k, v.clone())).collect()
    }
}

/// Rows returned by a query, in the order the engine produced them.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub results: Vec<Row>,
    column_names: Option<Arc<Vec<String>>>,
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            column_names: None,
            column_index: None,
        }
    }

    /// Set the column names shared by all rows added afterwards.
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Some(Arc::new(index_columns(&column_names)));
        self.column_names = Some(column_names);
    }

    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Append a row; ignored if no column names have been set.
    pub fn add_row_values(&mut self, values: Vec<RowValues>) {
        if let (Some(column_names), Some(column_index)) = (&self.column_names, &self.column_index) {
            self.results.push(Row {
                column_names: Arc::clone(column_names),
                column_index: Arc::clone(column_index),
                values,
            });
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Row> {
        self.results.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Row> {
        self.results.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.results.iter()
    }

    /// Render every row as a JSON object inside a JSON array.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.results.iter().map(Row::to_json).collect())
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

fn index_columns(column_names: &[String]) -> HashMap<String, usize> {
    column_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}
