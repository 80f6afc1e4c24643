use rusqlite::types::Value;
use tokio::sync::oneshot;

use crate::error::SqlRecordError;
use crate::results::ResultSet;

use super::ExecOutcome;

pub(super) type Reply<T> = oneshot::Sender<Result<T, SqlRecordError>>;

/// One parameterized statement queued as part of an atomic group.
pub(super) type QueuedStatement = (String, Vec<Value>);

pub(super) enum Command {
    ExecuteBatch {
        query: String,
        respond_to: Reply<()>,
    },
    ExecuteSelect {
        query: String,
        params: Vec<Value>,
        respond_to: Reply<ResultSet>,
    },
    ExecuteDml {
        query: String,
        params: Vec<Value>,
        respond_to: Reply<ExecOutcome>,
    },
    ExecuteMany {
        statements: Vec<QueuedStatement>,
        respond_to: Reply<Vec<ExecOutcome>>,
    },
    Close {
        respond_to: Reply<()>,
    },
    Shutdown,
}
