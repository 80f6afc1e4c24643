//! Convenient imports for common functionality.
//!
//! ```rust
//! use sql_record::prelude::*;
//! ```

pub use crate::config::{DatabaseOptions, DatabaseOptionsBuilder};
pub use crate::database::Database;
pub use crate::error::{ErrorKind, SqlRecordError};
pub use crate::query_builder::{Operator, PredicateValue, SortDirection};
pub use crate::record::{Record, RecordList};
pub use crate::results::{ResultSet, Row};
pub use crate::table::Table;
pub use crate::types::{FieldMap, RowValues};
