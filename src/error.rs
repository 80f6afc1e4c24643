use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlRecordError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Invalid insert: {0}")]
    InvalidInsert(String),

    #[error("Record not found: {table} with primary key {id}")]
    RecordNotFound { table: String, id: i64 },

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Engine error: {message}")]
    EngineError { message: String, code: Option<i32> },

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Stable tag for each error class, safe to hand across a host boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidIdentifier,
    InvalidPredicate,
    InvalidOrder,
    InvalidInsert,
    RecordNotFound,
    DecodeError,
    EngineError,
    ConnectionError,
    ConfigError,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidIdentifier => "InvalidIdentifier",
            ErrorKind::InvalidPredicate => "InvalidPredicate",
            ErrorKind::InvalidOrder => "InvalidOrder",
            ErrorKind::InvalidInsert => "InvalidInsert",
            ErrorKind::RecordNotFound => "RecordNotFound",
            ErrorKind::DecodeError => "DecodeError",
            ErrorKind::EngineError => "EngineError",
            ErrorKind::ConnectionError => "ConnectionError",
            ErrorKind::ConfigError => "ConfigError",
        }
    }

    /// Validation kinds are raised before a statement is handed to the engine.
    #[must_use]
    pub fn is_validation(self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidIdentifier
                | ErrorKind::InvalidPredicate
                | ErrorKind::InvalidOrder
                | ErrorKind::InvalidInsert
        )
    }
}

/// Structured form of an error: kind tag, message and the engine code if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
}

impl SqlRecordError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SqlRecordError::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            SqlRecordError::InvalidPredicate(_) => ErrorKind::InvalidPredicate,
            SqlRecordError::InvalidOrder(_) => ErrorKind::InvalidOrder,
            SqlRecordError::InvalidInsert(_) => ErrorKind::InvalidInsert,
            SqlRecordError::RecordNotFound { .. } => ErrorKind::RecordNotFound,
            SqlRecordError::DecodeError(_) => ErrorKind::DecodeError,
            SqlRecordError::EngineError { .. } => ErrorKind::EngineError,
            SqlRecordError::ConnectionError(_) => ErrorKind::ConnectionError,
            SqlRecordError::ConfigError(_) => ErrorKind::ConfigError,
        }
    }

    #[must_use]
    pub fn to_payload(&self) -> ErrorPayload {
        let code = match self {
            SqlRecordError::EngineError { code, .. } => *code,
            _ => None,
        };
        ErrorPayload {
            kind: self.kind(),
            message: self.to_string(),
            code,
        }
    }

    pub(crate) fn not_found(table: &str, id: i64) -> Self {
        SqlRecordError::RecordNotFound {
            table: table.to_owned(),
            id,
        }
    }
}

impl From<rusqlite::Error> for SqlRecordError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(ffi_err, _) => Some(ffi_err.extended_code),
            _ => None,
        };
        SqlRecordError::EngineError {
            message: err.to_string(),
            code,
        }
    }
}

impl From<serde_json::Error> for SqlRecordError {
    fn from(err: serde_json::Error) -> Self {
        SqlRecordError::DecodeError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_kind_and_code() {
        let err = SqlRecordError::EngineError {
            message: "no such table: ghosts".into(),
            code: Some(1),
        };
        let payload = err.to_payload();
        assert_eq!(payload.kind, ErrorKind::EngineError);
        assert_eq!(payload.code, Some(1));
        assert!(payload.message.contains("no such table"));

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "EngineError");
    }

    #[test]
    fn validation_kinds() {
        assert!(SqlRecordError::InvalidOrder("sideways".into()).kind().is_validation());
        assert!(!SqlRecordError::not_found("users", 3).kind().is_validation());
        assert_eq!(SqlRecordError::not_found("users", 3).kind().as_str(), "RecordNotFound");
    }
}
