use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::SqlRecordError;

use super::identifier::quote_column;

/// Sort direction for an `ORDER BY` clause.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for SortDirection {
    type Err = SqlRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if trimmed.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(SqlRecordError::InvalidOrder(format!(
                "direction must be ASC or DESC, got {s:?}"
            )))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    column: String,
    direction: SortDirection,
}

impl OrderClause {
    /// # Errors
    /// `InvalidIdentifier` if `column` is not a plain identifier.
    pub fn new(column: &str, direction: SortDirection) -> Result<Self, SqlRecordError> {
        quote_column(column)?;
        Ok(Self {
            column: column.to_owned(),
            direction,
        })
    }

    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            column: self.column.clone(),
            direction: self.direction.reversed(),
        }
    }

    pub(crate) fn render(&self) -> Result<String, SqlRecordError> {
        Ok(format!("{} {}", quote_column(&self.column)?, self.direction))
    }
}
