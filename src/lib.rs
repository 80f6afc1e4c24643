//! Fluent table, record and query-builder layer over one SQLite connection.
//!
//! ```rust,no_run
//! use sql_record::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlRecordError> {
//! let db = Database::open("app.db").await?;
//! db.execute("CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)")
//!     .await?;
//!
//! let users = db.table("users");
//! let id = users.insert(&FieldMap::new().set("name", "alice").set("age", 30)).await?;
//!
//! let adults = users.where_("age", ">=", 18)?.order_by("name", "ASC")?;
//! for user in &adults.get().await? {
//!     println!("{} {:?}", user.id(), user.get("name"));
//! }
//!
//! if let Some(mut alice) = users.find(id).await? {
//!     alice.update(&FieldMap::new().set("age", 31)).await?;
//!     alice.reload().await?;
//!     alice.destroy().await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Every statement goes through a single worker thread that owns the connection, so concurrent
//! callers are served one statement at a time in arrival order.

pub mod codec;
pub mod config;
pub mod database;
pub mod error;
pub mod gateway;
pub mod prelude;
pub mod query_builder;
pub mod record;
pub mod results;
pub mod table;
pub mod types;

pub use config::{DatabaseOptions, DatabaseOptionsBuilder};
pub use database::Database;
pub use error::{ErrorKind, ErrorPayload, SqlRecordError};
pub use gateway::{ExecOutcome, Gateway};
pub use query_builder::{
    FetchMode, Operator, OrderClause, Predicate, PredicateValue, QueryState, RenderedQuery,
    SortDirection,
};
pub use record::{Record, RecordList};
pub use results::{ResultSet, Row};
pub use table::Table;
pub use types::{FieldMap, RowValues};
