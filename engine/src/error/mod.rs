use rust_decimal::Decimal;

use crate::types::LeaveRequestId;

/// Engine-level error taxonomy.
///
/// Input validation errors are rejected before any read, business-rule
/// conflicts after a read but before any write. Storage failures propagate
/// unmodified; the engine performs no implicit retry.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid leave type: {0}")]
    InvalidLeaveType(String),

    #[error("end date must not be before start date")]
    InvalidDateRange,

    #[error("overlapping leave request exists ({conflicting_id})")]
    OverlappingRequest { conflicting_id: LeaveRequestId },

    #[error("insufficient leave balance: available {available}, requested {requested}")]
    InsufficientBalance {
        available: Decimal,
        requested: Decimal,
    },

    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Database(sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => EngineError::NotFound("resource".to_string()),
            _ => EngineError::Database(err),
        }
    }
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let code = e.code.as_ref();
                    format!("{}: {}", field, code)
                })
            })
            .collect();
        EngineError::Validation(messages)
    }
}
