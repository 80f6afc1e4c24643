//! Rendering of builder state into one parameterized statement.
//!
//! Identifiers are never bound (SQL has no placeholder for them); they are checked against an
//! allow-list and emitted quoted. Values are always bound as `?` placeholders, in the order the
//! predicates were declared.

mod dml;
pub mod identifier;
mod order;
mod predicate;

use crate::error::SqlRecordError;
use crate::types::RowValues;

pub use dml::{render_delete_by_key, render_insert, render_select_by_key, render_update_by_key};
pub use order::{OrderClause, SortDirection};
pub use predicate::{Operator, Predicate, PredicateValue};

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<RowValues>,
}

/// Which slice of the matching rows a fetch wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    All,
    First,
    Last,
}

/// Immutable builder state: a table, AND-ed predicates and sort clauses.
///
/// Extending returns a new state and leaves the receiver untouched, so one partial query can be
/// branched several ways.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    table: String,
    predicates: Vec<Predicate>,
    order: Vec<OrderClause>,
}

impl QueryState {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            predicates: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Build a state holding `predicates` in the given order.
    #[must_use]
    pub fn with_predicates(
        table: impl Into<String>,
        predicates: impl IntoIterator<Item = Predicate>,
    ) -> Self {
        Self {
            table: table.into(),
            predicates: predicates.into_iter().collect(),
            order: Vec::new(),
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    #[must_use]
    pub fn order(&self) -> &[OrderClause] {
        &self.order
    }

    #[must_use]
    pub fn and(&self, predicate: Predicate) -> Self {
        let mut next = self.clone();
        next.predicates.push(predicate);
        next
    }

    #[must_use]
    pub fn then_order(&self, clause: OrderClause) -> Self {
        let mut next = self.clone();
        next.order.push(clause);
        next
    }

    /// Parse `operator` and append a predicate.
    ///
    /// # Errors
    /// `InvalidPredicate` for an unknown operator or a value shape that does not fit it;
    /// `InvalidIdentifier` for a bad column name.
    pub fn where_(
        &self,
        column: &str,
        operator: &str,
        value: impl Into<PredicateValue>,
    ) -> Result<Self, SqlRecordError> {
        let operator: Operator = operator.parse()?;
        Ok(self.and(Predicate::new(column, operator, value.into())?))
    }

    /// Parse `direction` and append a sort clause.
    ///
    /// # Errors
    /// `InvalidOrder` for a direction other than ASC/DESC; `InvalidIdentifier` for a bad column.
    pub fn order_by(&self, column: &str, direction: &str) -> Result<Self, SqlRecordError> {
        let direction: SortDirection = direction.parse()?;
        Ok(self.then_order(OrderClause::new(column, direction)?))
    }

    /// `SELECT * FROM <table> [WHERE ...] [ORDER BY ...]`.
    ///
    /// # Errors
    /// `InvalidIdentifier` if the table name is not allowed.
    pub fn render(&self) -> Result<RenderedQuery, SqlRecordError> {
        self.render_select(&self.order, None)
    }

    /// Render for materialization with a deterministic tie-break on `primary_key`.
    ///
    /// With an explicit order the key is appended as a last ascending clause (unless already
    /// present) so equal sort keys cannot swap between `get`, `first` and `last`. `First` falls
    /// back to ascending key order when none was given; `Last` inverts every clause.
    ///
    /// # Errors
    /// `InvalidIdentifier` for a bad table or key name.
    pub fn render_fetch(
        &self,
        primary_key: &str,
        mode: FetchMode,
    ) -> Result<RenderedQuery, SqlRecordError> {
        let mut order = self.order.clone();
        let mentions_key = order.iter().any(|c| c.column() == primary_key);
        if !mentions_key && (!order.is_empty() || mode != FetchMode::All) {
            order.push(OrderClause::new(primary_key, SortDirection::Asc)?);
        }
        match mode {
            FetchMode::All => self.render_select(&order, None),
            FetchMode::First => self.render_select(&order, Some(1)),
            FetchMode::Last => {
                let reversed: Vec<OrderClause> = order.iter().map(OrderClause::reversed).collect();
                self.render_select(&reversed, Some(1))
            }
        }
    }

    /// `SELECT COUNT(*) AS count FROM <table> [WHERE ...]`.
    ///
    /// # Errors
    /// `InvalidIdentifier` if the table name is not allowed.
    pub fn render_count(&self) -> Result<RenderedQuery, SqlRecordError> {
        let mut sql = format!(
            "SELECT COUNT(*) AS count FROM {}",
            identifier::quote_table(&self.table)?
        );
        let mut params = Vec::new();
        self.push_where(&mut sql, &mut params)?;
        Ok(RenderedQuery { sql, params })
    }

    fn render_select(
        &self,
        order: &[OrderClause],
        limit: Option<u32>,
    ) -> Result<RenderedQuery, SqlRecordError> {
        let mut sql = format!("SELECT * FROM {}", identifier::quote_table(&self.table)?);
        let mut params = Vec::with_capacity(self.predicates.len());
        self.push_where(&mut sql, &mut params)?;
        if !order.is_empty() {
            let clauses = order
                .iter()
                .map(OrderClause::render)
                .collect::<Result<Vec<_>, _>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&clauses.join(", "));
        }
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        Ok(RenderedQuery { sql, params })
    }

    pub(crate) fn push_where(
        &self,
        sql: &mut String,
        params: &mut Vec<RowValues>,
    ) -> Result<(), SqlRecordError> {
        for (idx, predicate) in self.predicates.iter().enumerate() {
            sql.push_str(if idx == 0 { " WHERE " } else { " AND " });
            predicate.render_into(sql, params)?;
        }
        Ok(())
    }
}
