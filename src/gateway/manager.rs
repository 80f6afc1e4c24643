use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread;

use rusqlite::types::Value;
use tokio::sync::oneshot;

use crate::config::DatabaseOptions;
use crate::error::SqlRecordError;
use crate::results::ResultSet;

use super::ExecOutcome;
use super::channel::{Command, QueuedStatement};
use super::dispatcher::{open_connection, run_worker};

static NEXT_WORKER_ID: AtomicU64 = AtomicU64::new(1);

pub(super) struct Worker {
    sender: Sender<Command>,
    worker_id: u64,
}

impl Worker {
    /// Spawn the worker thread, open the connection on it and wait until it is usable.
    pub(super) async fn spawn(options: DatabaseOptions) -> Result<Self, SqlRecordError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let (ready_tx, ready_rx) = oneshot::channel();
        let worker_id = NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed);

        thread::Builder::new()
            .name(format!("sql-record-worker-{worker_id}"))
            .spawn(move || match open_connection(&options) {
                Ok(conn) => {
                    if ready_tx.send(Ok(())).is_ok() {
                        run_worker(conn, &receiver);
                    }
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            })
            .map_err(|err| {
                SqlRecordError::ConnectionError(format!("failed to spawn worker thread: {err}"))
            })?;

        ready_rx
            .await
            .map_err(|_| connection_error("worker exited before the connection opened"))??;

        Ok(Self { sender, worker_id })
    }

    pub(super) fn worker_id(&self) -> u64 {
        self.worker_id
    }

    fn send_command(&self, command: Command) -> Result<(), SqlRecordError> {
        self.sender
            .send(command)
            .map_err(|_| connection_error("connection worker closed"))
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, SqlRecordError>>) -> Command,
        drop_message: &'static str,
    ) -> Result<T, SqlRecordError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(build(tx))?;
        rx.await.map_err(|_| connection_error(drop_message))?
    }

    pub(super) async fn execute_batch(&self, query: String) -> Result<(), SqlRecordError> {
        self.request(
            |respond_to| Command::ExecuteBatch { query, respond_to },
            "connection worker dropped while executing batch",
        )
        .await
    }

    pub(super) async fn execute_select(
        &self,
        query: String,
        params: Vec<Value>,
    ) -> Result<ResultSet, SqlRecordError> {
        self.request(
            |respond_to| Command::ExecuteSelect {
                query,
                params,
                respond_to,
            },
            "connection worker dropped while executing select",
        )
        .await
    }

    pub(super) async fn execute_dml(
        &self,
        query: String,
        params: Vec<Value>,
    ) -> Result<ExecOutcome, SqlRecordError> {
        self.request(
            |respond_to| Command::ExecuteDml {
                query,
                params,
                respond_to,
            },
            "connection worker dropped while executing dml",
        )
        .await
    }

    pub(super) async fn execute_many(
        &self,
        statements: Vec<QueuedStatement>,
    ) -> Result<Vec<ExecOutcome>, SqlRecordError> {
        self.request(
            |respond_to| Command::ExecuteMany {
                statements,
                respond_to,
            },
            "connection worker dropped while executing statement group",
        )
        .await
    }

    pub(super) async fn close(&self) -> Result<(), SqlRecordError> {
        self.request(
            |respond_to| Command::Close { respond_to },
            "connection worker dropped while closing",
        )
        .await
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

fn connection_error(message: &str) -> SqlRecordError {
    SqlRecordError::ConnectionError(message.into())
}
