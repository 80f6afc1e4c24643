use std::sync::Arc;
use std::sync::mpsc::Receiver;

use rusqlite::types::Value;
use rusqlite::config::DbConfig;
use rusqlite::{Connection, Statement, params_from_iter};
use tracing::{debug, info, warn};

use crate::codec::{self, DecodeHint};
use crate::config::DatabaseOptions;
use crate::error::SqlRecordError;
use crate::results::ResultSet;

use super::ExecOutcome;
use super::channel::{Command, QueuedStatement};

pub(super) fn open_connection(options: &DatabaseOptions) -> Result<Connection, SqlRecordError> {
    let conn = Connection::open(&options.db_path)?;
    // Quoted identifiers that name no column must fail, not degrade to string literals.
    conn.set_db_config(DbConfig::SQLITE_DBCONFIG_DQS_DML, false)?;
    conn.set_db_config(DbConfig::SQLITE_DBCONFIG_DQS_DDL, false)?;
    conn.busy_timeout(options.busy_timeout)?;
    if options.journal_mode_wal {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    }
    if options.foreign_keys {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    }
    info!(path = %options.db_path, wal = options.journal_mode_wal, "opened database");
    Ok(conn)
}

/// Process commands strictly in arrival order until shutdown or close.
pub(super) fn run_worker(conn: Connection, receiver: &Receiver<Command>) {
    let mut conn = conn;
    while let Ok(command) = receiver.recv() {
        match command {
            Command::Shutdown => break,
            Command::ExecuteBatch { query, respond_to } => {
                let _ = respond_to.send(execute_batch(&conn, &query));
            }
            Command::ExecuteSelect {
                query,
                params,
                respond_to,
            } => {
                let _ = respond_to.send(execute_select(&conn, &query, &params));
            }
            Command::ExecuteDml {
                query,
                params,
                respond_to,
            } => {
                let _ = respond_to.send(execute_dml(&conn, &query, &params));
            }
            Command::ExecuteMany {
                statements,
                respond_to,
            } => {
                let _ = respond_to.send(execute_many(&mut conn, &statements));
            }
            Command::Close { respond_to } => match conn.close() {
                Ok(()) => {
                    info!("closed database");
                    let _ = respond_to.send(Ok(()));
                    return;
                }
                Err((still_open, err)) => {
                    warn!(error = %err, "close failed; connection stays open");
                    conn = still_open;
                    let _ = respond_to.send(Err(err.into()));
                }
            },
        }
    }
    debug!("connection worker stopped");
}

fn execute_batch(conn: &Connection, query: &str) -> Result<(), SqlRecordError> {
    debug!(sql = %query, "execute batch");
    conn.execute_batch(query)?;
    Ok(())
}

fn execute_select(
    conn: &Connection,
    query: &str,
    params: &[Value],
) -> Result<ResultSet, SqlRecordError> {
    debug!(sql = %query, params = params.len(), "select");
    let mut stmt = conn.prepare_cached(query)?;
    build_result_set(&mut stmt, params)
}

fn execute_dml(
    conn: &Connection,
    query: &str,
    params: &[Value],
) -> Result<ExecOutcome, SqlRecordError> {
    debug!(sql = %query, params = params.len(), "dml");
    let mut stmt = conn.prepare_cached(query)?;
    let rows_affected = stmt.execute(params_from_iter(params.iter()))?;
    Ok(ExecOutcome {
        rows_affected,
        last_insert_id: conn.last_insert_rowid(),
    })
}

fn execute_many(
    conn: &mut Connection,
    statements: &[QueuedStatement],
) -> Result<Vec<ExecOutcome>, SqlRecordError> {
    debug!(statements = statements.len(), "statement group");
    let tx = conn.transaction()?;
    let mut outcomes = Vec::with_capacity(statements.len());
    for (query, params) in statements {
        let rows_affected = {
            let mut stmt = tx.prepare_cached(query)?;
            stmt.execute(params_from_iter(params.iter()))?
        };
        outcomes.push(ExecOutcome {
            rows_affected,
            last_insert_id: tx.last_insert_rowid(),
        });
    }
    tx.commit()?;
    Ok(outcomes)
}

/// Run a prepared SELECT and decode every row, using declared column types as decode hints.
fn build_result_set(
    stmt: &mut Statement<'_>,
    params: &[Value],
) -> Result<ResultSet, SqlRecordError> {
    let (column_names, hints): (Vec<String>, Vec<DecodeHint>) = stmt
        .columns()
        .iter()
        .map(|col| {
            (
                col.name().to_owned(),
                DecodeHint::from_decl_type(col.decl_type()),
            )
        })
        .unzip();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(hints.len());
        for (idx, hint) in hints.iter().enumerate() {
            values.push(codec::decode(row.get_ref(idx)?, *hint)?);
        }
        result_set.add_row_values(values);
    }

    Ok(result_set)
}
