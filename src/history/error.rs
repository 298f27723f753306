use std::fmt;

use crate::annotation::AnnotationError;
use crate::session::SessionError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOperation {
    Commit,
    Undo,
    Redo,
    UndoAll,
}

impl fmt::Display for HistoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Commit => "commit",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::UndoAll => "undo all",
        };
        f.write_str(name)
    }
}

pub type HistoryResult<T> = std::result::Result<T, HistoryError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Rejected before any state changed.
    #[error("invalid {operation}: {reason}")]
    InvalidOperation {
        operation: HistoryOperation,
        reason: &'static str,
    },
    #[error("{what} not found")]
    NotFound { what: String },
    /// Session fields disagree with the stores; the transition was aborted.
    #[error("edit history is inconsistent: {detail}")]
    Inconsistent { detail: String },
}

impl HistoryError {
    pub(crate) const fn invalid(operation: HistoryOperation, reason: &'static str) -> Self {
        Self::InvalidOperation { operation, reason }
    }

    pub(crate) fn inconsistent(detail: impl Into<String>) -> Self {
        Self::Inconsistent {
            detail: detail.into(),
        }
    }

    /// Whether the caller may keep using the history after this error.
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Inconsistent { .. })
    }
}

impl From<AnnotationError> for HistoryError {
    fn from(err: AnnotationError) -> Self {
        Self::NotFound {
            what: err.to_string(),
        }
    }
}

impl From<SessionError> for HistoryError {
    fn from(err: SessionError) -> Self {
        Self::inconsistent(err.to_string())
    }
}
