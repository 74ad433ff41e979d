//! Error types and HTTP error response handling.
//!
//! Two layers of errors live here:
//!
//! - [`LedgerError`]: failures of the ledger engine and its store. These are
//!   what `change_balance`, `transfer` and the read paths return.
//! - [`AppError`]: everything an HTTP handler can fail with. It wraps
//!   `LedgerError` and adds request validation and currency lookup failures,
//!   and knows how to turn itself into a JSON response.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for `check_violation`.
const CHECK_VIOLATION: &str = "23514";

/// Ledger engine and store errors.
///
/// Every failure inside an atomic unit is reported through one of these after
/// the unit has been rolled back.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Requested account has no row (read paths).
    #[error("Account {0} not found")]
    NotFound(i64),

    /// One side of a transfer affected zero rows.
    #[error("Account {0} does not exist")]
    AccountNotFound(i64),

    /// Implicit account creation was attempted with a non-positive amount.
    #[error("Can not set a non-positive balance for a new account")]
    NegativeInitialBalance,

    /// Account insert hit an existing row or a table constraint.
    #[error("Account {0} already exists or violates a constraint")]
    DuplicateOrConstraintViolation(i64),

    /// A history append did not affect exactly one row.
    #[error("History write for account {account_id} affected {rows} rows")]
    WriteFailure { account_id: i64, rows: u64 },

    /// Transfer called with the same account on both sides or a non-positive amount.
    #[error("Invalid transfer: {0}")]
    InvalidTransfer(&'static str),

    /// Connection, transport or driver failure. Never retried here.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),
}

impl LedgerError {
    /// Map a failed account insert, keeping constraint violations distinct
    /// from transport failures.
    pub fn from_insert(account_id: i64, err: sqlx::Error) -> Self {
        let is_constraint = err
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == UNIQUE_VIOLATION || code == CHECK_VIOLATION);

        if is_constraint {
            LedgerError::DuplicateOrConstraintViolation(account_id)
        } else {
            LedgerError::StoreUnavailable(err)
        }
    }

    /// Map a failed single-row read, turning "no rows" into [`LedgerError::NotFound`].
    pub fn from_read(account_id: i64, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => LedgerError::NotFound(account_id),
            other => LedgerError::StoreUnavailable(other),
        }
    }
}

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Ledger engine failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Currency conversion is not configured (no API key).
    #[error("Currency conversion is not configured")]
    ExchangeUnavailable,

    /// Exchange rate API answered with a non-success status.
    #[error("Exchange rate API returned {status}: {body}")]
    ExchangeRejected { status: u16, body: String },

    /// Exchange rate API could not be reached or returned an unreadable body.
    #[error("Exchange rate request failed: {0}")]
    ExchangeRequest(#[from] reqwest::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Store failures are logged and hidden from the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Ledger(LedgerError::NotFound(_))
            | AppError::Ledger(LedgerError::AccountNotFound(_)) => {
                (StatusCode::NOT_FOUND, "account_not_found", self.to_string())
            }
            AppError::Ledger(LedgerError::NegativeInitialBalance) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "negative_initial_balance",
                self.to_string(),
            ),
            AppError::Ledger(LedgerError::DuplicateOrConstraintViolation(_)) => {
                (StatusCode::CONFLICT, "conflict", self.to_string())
            }
            AppError::Ledger(LedgerError::InvalidTransfer(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_request", self.to_string())
            }
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Ledger(LedgerError::WriteFailure { .. })
            | AppError::Ledger(LedgerError::StoreUnavailable(_)) => {
                tracing::error!(error = %self, "ledger store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::ExchangeUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "exchange_unavailable",
                self.to_string(),
            ),
            AppError::ExchangeRejected { .. } | AppError::ExchangeRequest(_) => {
                tracing::error!(error = %self, "currency conversion failed");
                (StatusCode::BAD_GATEWAY, "exchange_error", self.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
