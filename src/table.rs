use serde_json::Value as JsonValue;
use tracing::debug;

use crate::codec;
use crate::error::SqlRecordError;
use crate::gateway::Gateway;
use crate::query_builder::{
    identifier, render_delete_by_key, render_insert, render_select_by_key, render_update_by_key,
    FetchMode, OrderClause, Predicate, PredicateValue, QueryState, RenderedQuery, SortDirection,
};
use crate::record::{Record, RecordList};
use crate::results::ResultSet;
use crate::types::{FieldMap, RowValues};

/// Default primary-key column.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Query and mutation entry point scoped to one table.
///
/// `where_` and `order_by` return a new `Table` carrying the extended state; the receiver is
/// never modified, so a partially built query can be reused:
///
/// ```rust,no_run
/// # async fn demo(db: &sql_record::Database) -> Result<(), sql_record::SqlRecordError> {
/// let users = db.table("users");
/// let adults = users.where_("age", ">=", 18)?;
/// let oldest = adults.order_by("age", "DESC")?.first().await?;
/// let total = adults.count().await?;
/// # let _ = (oldest, total);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    primary_key: String,
    gateway: Gateway,
    state: QueryState,
}

impl Table {
    pub(crate) fn new(name: &str, gateway: Gateway) -> Self {
        Self {
            primary_key: DEFAULT_PRIMARY_KEY.to_owned(),
            gateway,
            state: QueryState::new(name),
        }
    }

    /// Use `column` instead of `id` as the primary key.
    ///
    /// # Errors
    /// `InvalidIdentifier` if `column` is not a plain identifier.
    pub fn with_primary_key(&self, column: &str) -> Result<Self, SqlRecordError> {
        identifier::quote_column(column)?;
        Ok(Self {
            primary_key: column.to_owned(),
            ..self.clone()
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.state.table()
    }

    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    #[must_use]
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Add a predicate; all predicates are AND-ed.
    ///
    /// # Errors
    /// `InvalidPredicate`, `InvalidIdentifier` (see [`QueryState::where_`]).
    pub fn where_(
        &self,
        column: &str,
        operator: &str,
        value: impl Into<PredicateValue>,
    ) -> Result<Self, SqlRecordError> {
        Ok(self.with_state(self.state.where_(column, operator, value)?))
    }

    /// Shorthand for `where_(column, "=", value)`.
    ///
    /// # Errors
    /// See [`Table::where_`].
    pub fn where_eq(
        &self,
        column: &str,
        value: impl Into<PredicateValue>,
    ) -> Result<Self, SqlRecordError> {
        self.where_(column, "=", value)
    }

    #[must_use]
    pub fn where_predicate(&self, predicate: Predicate) -> Self {
        self.with_state(self.state.and(predicate))
    }

    /// Append a sort clause; clauses apply in call order.
    ///
    /// # Errors
    /// `InvalidOrder` for a direction other than ASC/DESC, `InvalidIdentifier` for a bad column.
    pub fn order_by(&self, column: &str, direction: &str) -> Result<Self, SqlRecordError> {
        Ok(self.with_state(self.state.order_by(column, direction)?))
    }

    /// Typed variant of [`Table::order_by`].
    ///
    /// # Errors
    /// `InvalidIdentifier` for a bad column.
    pub fn order_by_dir(
        &self,
        column: &str,
        direction: SortDirection,
    ) -> Result<Self, SqlRecordError> {
        Ok(self.with_state(self.state.then_order(OrderClause::new(column, direction)?)))
    }

    /// The SELECT this table would run for `rows()`.
    ///
    /// # Errors
    /// `InvalidIdentifier` for a bad table name.
    pub fn render(&self) -> Result<RenderedQuery, SqlRecordError> {
        self.state.render()
    }

    /// Look up one row by primary key. Predicates and ordering on this table are not applied.
    ///
    /// # Errors
    /// `EngineError` if the table does not exist, `DecodeError` if the key is not an integer.
    pub async fn find(&self, id: i64) -> Result<Option<Record>, SqlRecordError> {
        let rendered = render_select_by_key(self.name(), &self.primary_key, id)?;
        let mut rows = self.gateway.query(&rendered).await?;
        rows.results
            .pop()
            .map(|row| Record::from_row(self.name(), &self.primary_key, row, self.gateway.clone()))
            .transpose()
    }

    /// All matching rows as records, in the requested order.
    ///
    /// # Errors
    /// `EngineError` from the engine, `DecodeError` if a row lacks an integer primary key.
    pub async fn get(&self) -> Result<RecordList, SqlRecordError> {
        let rendered = self.state.render_fetch(&self.primary_key, FetchMode::All)?;
        let rows = self.gateway.query(&rendered).await?;
        let records = rows
            .into_iter()
            .map(|row| Record::from_row(self.name(), &self.primary_key, row, self.gateway.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RecordList::new(records))
    }

    /// Same as [`Table::get`].
    ///
    /// # Errors
    /// See [`Table::get`].
    pub async fn all(&self) -> Result<RecordList, SqlRecordError> {
        self.get().await
    }

    /// Matching rows as plain rows; works on tables without an integer key.
    ///
    /// # Errors
    /// `EngineError` from the engine.
    pub async fn rows(&self) -> Result<ResultSet, SqlRecordError> {
        self.gateway.query(&self.state.render()?).await
    }

    /// Number of matching rows.
    ///
    /// # Errors
    /// `EngineError` from the engine.
    pub async fn count(&self) -> Result<i64, SqlRecordError> {
        let rows = self.gateway.query(&self.state.render_count()?).await?;
        match rows.first().and_then(|row| row.get("count")) {
            Some(RowValues::Int(n)) => Ok(*n),
            other => Err(SqlRecordError::DecodeError(format!(
                "COUNT(*) on {} returned {other:?}",
                self.name()
            ))),
        }
    }

    /// First matching row under the current order, or by ascending primary key.
    ///
    /// # Errors
    /// See [`Table::get`].
    pub async fn first(&self) -> Result<Option<Record>, SqlRecordError> {
        self.fetch_one(FetchMode::First).await
    }

    /// Last matching row under the current order, or the highest primary key when unordered.
    ///
    /// # Errors
    /// See [`Table::get`].
    pub async fn last(&self) -> Result<Option<Record>, SqlRecordError> {
        self.fetch_one(FetchMode::Last).await
    }

    /// Insert one row and return its primary key.
    ///
    /// # Errors
    /// `InvalidInsert` for an empty map, `EngineError` on constraint violations.
    pub async fn insert(&self, fields: &FieldMap) -> Result<i64, SqlRecordError> {
        let rendered = render_insert(self.name(), fields)?;
        let outcome = self.gateway.execute(&rendered).await?;
        Ok(outcome.last_insert_id)
    }

    /// Same as [`Table::insert`].
    ///
    /// # Errors
    /// See [`Table::insert`].
    pub async fn create(&self, fields: &FieldMap) -> Result<i64, SqlRecordError> {
        self.insert(fields).await
    }

    /// Insert several rows in one transaction; either every row lands or none does.
    ///
    /// # Errors
    /// `InvalidInsert` if any map is empty (nothing is sent), `EngineError` from the first failing
    /// row.
    pub async fn insert_many(&self, rows: &[FieldMap]) -> Result<Vec<i64>, SqlRecordError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let statements = rows
            .iter()
            .map(|fields| render_insert(self.name(), fields))
            .collect::<Result<Vec<_>, _>>()?;
        let outcomes = self.gateway.execute_many(&statements).await?;
        debug!(table = %self.name(), rows = outcomes.len(), "bulk insert committed");
        Ok(outcomes.iter().map(|o| o.last_insert_id).collect())
    }

    /// Insert a host object, or every object of an array in one transaction.
    ///
    /// # Errors
    /// `InvalidInsert` if the value is not an object or an array of objects.
    pub async fn insert_json(&self, value: &JsonValue) -> Result<Vec<i64>, SqlRecordError> {
        match value {
            JsonValue::Array(items) => {
                let rows = items
                    .iter()
                    .map(codec::field_map_from_json)
                    .collect::<Result<Vec<_>, _>>()?;
                self.insert_many(&rows).await
            }
            other => {
                let fields = codec::field_map_from_json(other)?;
                Ok(vec![self.insert(&fields).await?])
            }
        }
    }

    /// Update the row with primary key `id`.
    ///
    /// # Errors
    /// `InvalidInsert` for an empty map, `RecordNotFound` if no row has that key.
    pub async fn update(&self, id: i64, fields: &FieldMap) -> Result<(), SqlRecordError> {
        let rendered = render_update_by_key(self.name(), &self.primary_key, id, fields)?;
        let outcome = self.gateway.execute(&rendered).await?;
        if outcome.rows_affected == 0 {
            return Err(SqlRecordError::not_found(self.name(), id));
        }
        Ok(())
    }

    /// Delete the row with primary key `id`.
    ///
    /// # Errors
    /// `RecordNotFound` if no row has that key.
    pub async fn destroy(&self, id: i64) -> Result<(), SqlRecordError> {
        let rendered = render_delete_by_key(self.name(), &self.primary_key, id)?;
        let outcome = self.gateway.execute(&rendered).await?;
        if outcome.rows_affected == 0 {
            return Err(SqlRecordError::not_found(self.name(), id));
        }
        Ok(())
    }

    /// Update every row matching the current predicates; returns the number of rows changed.
    ///
    /// # Errors
    /// `InvalidPredicate` if no predicate has been added, `InvalidInsert` for an empty map.
    pub async fn update_where(&self, fields: &FieldMap) -> Result<usize, SqlRecordError> {
        let rendered = self.state.render_update_where(fields)?;
        Ok(self.gateway.execute(&rendered).await?.rows_affected)
    }

    /// Delete every row matching the current predicates; returns the number of rows removed.
    ///
    /// # Errors
    /// `InvalidPredicate` if no predicate has been added.
    pub async fn destroy_where(&self) -> Result<usize, SqlRecordError> {
        let rendered = self.state.render_delete_where()?;
        Ok(self.gateway.execute(&rendered).await?.rows_affected)
    }

    async fn fetch_one(&self, mode: FetchMode) -> Result<Option<Record>, SqlRecordError> {
        let rendered = self.state.render_fetch(&self.primary_key, mode)?;
        let mut rows = self.gateway.query(&rendered).await?;
        rows.results
            .pop()
            .map(|row| Record::from_row(self.name(), &self.primary_key, row, self.gateway.clone()))
            .transpose()
    }

    fn with_state(&self, state: QueryState) -> Self {
        Self {
            primary_key: self.primary_key.clone(),
            gateway: self.gateway.clone(),
            state,
        }
    }
}
