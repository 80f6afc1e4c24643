use std::fmt;
use std::str::FromStr;

use crate::error::SqlRecordError;
use crate::types::RowValues;

use super::identifier::quote_column;

/// Comparison operators accepted in a `WHERE` predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    In,
    IsNull,
    IsNotNull,
}

impl Operator {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Operator {
    type Err = SqlRecordError;

    /// Case-insensitive; runs of whitespace inside `IS NOT NULL` are collapsed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        match normalized.as_str() {
            "=" | "==" => Ok(Operator::Eq),
            "!=" | "<>" => Ok(Operator::NotEq),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            "LIKE" => Ok(Operator::Like),
            "IN" => Ok(Operator::In),
            "IS NULL" => Ok(Operator::IsNull),
            "IS NOT NULL" => Ok(Operator::IsNotNull),
            _ => Err(SqlRecordError::InvalidPredicate(format!(
                "unsupported operator {s:?}"
            ))),
        }
    }
}

/// Right-hand side of a predicate as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateValue {
    /// No value, for `IS NULL` / `IS NOT NULL`.
    Nothing,
    Scalar(RowValues),
    List(Vec<RowValues>),
}

impl From<RowValues> for PredicateValue {
    fn from(value: RowValues) -> Self {
        PredicateValue::Scalar(value)
    }
}

impl From<()> for PredicateValue {
    fn from((): ()) -> Self {
        PredicateValue::Nothing
    }
}

macro_rules! scalar_predicate_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for PredicateValue {
                fn from(value: $ty) -> Self {
                    PredicateValue::Scalar(RowValues::from(value))
                }
            }
        )*
    };
}

scalar_predicate_value!(i64, i32, f64, bool, &str, String, chrono::NaiveDateTime);

impl<T: Into<RowValues>> From<Vec<T>> for PredicateValue {
    fn from(values: Vec<T>) -> Self {
        PredicateValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<RowValues>, const N: usize> From<[T; N]> for PredicateValue {
    fn from(values: [T; N]) -> Self {
        PredicateValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// One validated `WHERE` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    column: String,
    operator: Operator,
    value: PredicateValue,
}

impl Predicate {
    /// Validate column and value shape against the operator.
    ///
    /// `= NULL` and `!= NULL` are rewritten to `IS NULL` / `IS NOT NULL`.
    ///
    /// # Errors
    /// `InvalidIdentifier` for a bad column name; `InvalidPredicate` for an empty or null-bearing
    /// `IN` list, a list given to a scalar operator, a scalar given to `IN`, or `NULL` compared
    /// with an ordering or `LIKE` operator.
    pub fn new(
        column: &str,
        operator: Operator,
        value: PredicateValue,
    ) -> Result<Self, SqlRecordError> {
        quote_column(column)?;
        let (operator, value) = normalize(column, operator, value)?;
        Ok(Self {
            column: column.to_owned(),
            operator,
            value,
        })
    }

    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    #[must_use]
    pub fn value(&self) -> &PredicateValue {
        &self.value
    }

    /// Append `"col" OP ...` to `sql` and its bound values to `params`.
    pub(crate) fn render_into(
        &self,
        sql: &mut String,
        params: &mut Vec<RowValues>,
    ) -> Result<(), SqlRecordError> {
        let column = quote_column(&self.column)?;
        sql.push_str(&column);
        sql.push(' ');
        sql.push_str(self.operator.as_sql());
        match &self.value {
            PredicateValue::Nothing => {}
            PredicateValue::Scalar(v) => {
                sql.push_str(" ?");
                params.push(v.clone());
            }
            PredicateValue::List(values) => {
                let placeholders = vec!["?"; values.len()].join(", ");
                sql.push_str(" (");
                sql.push_str(&placeholders);
                sql.push(')');
                params.extend(values.iter().cloned());
            }
        }
        Ok(())
    }
}

fn normalize(
    column: &str,
    operator: Operator,
    value: PredicateValue,
) -> Result<(Operator, PredicateValue), SqlRecordError> {
    let invalid = |msg: String| Err(SqlRecordError::InvalidPredicate(msg));
    match (operator, value) {
        (Operator::IsNull | Operator::IsNotNull, _) => Ok((operator, PredicateValue::Nothing)),
        (Operator::In, PredicateValue::List(values)) => {
            if values.is_empty() {
                return invalid(format!("IN list for {column} is empty"));
            }
            if values.iter().any(RowValues::is_null) {
                return invalid(format!(
                    "IN list for {column} contains NULL, which never matches; use IS NULL"
                ));
            }
            Ok((Operator::In, PredicateValue::List(values)))
        }
        (Operator::In, _) => invalid(format!("IN on {column} requires a list of values")),
        (op, PredicateValue::List(_)) => invalid(format!("{op} on {column} takes a single value")),
        (Operator::Eq, PredicateValue::Nothing | PredicateValue::Scalar(RowValues::Null)) => {
            Ok((Operator::IsNull, PredicateValue::Nothing))
        }
        (Operator::NotEq, PredicateValue::Nothing | PredicateValue::Scalar(RowValues::Null)) => {
            Ok((Operator::IsNotNull, PredicateValue::Nothing))
        }
        (op, PredicateValue::Nothing | PredicateValue::Scalar(RowValues::Null)) => {
            invalid(format!("{op} on {column} cannot compare against NULL"))
        }
        (op, PredicateValue::Scalar(v)) => Ok((op, PredicateValue::Scalar(v))),
    }
}
