//! Transaction HTTP handlers.
//!
//! This module implements transaction-related API endpoints:
//! - POST /api/v1/transactions/transfer - Move money between accounts
//! - GET /api/v1/accounts/{id}/transactions - Transaction history of an account

use axum::{Json, extract::State};

use crate::{
    app::AppState,
    error::AppError,
    extract::{JsonBody, PathParams, QueryParams},
    models::transaction::{HistoryEntry, HistoryParams, MessageResponse, TransferRequest},
    store::LedgerStore,
};

/// Transfer money between accounts.
///
/// # Request Body
///
/// ```json
/// {
///   "sender_id": 1,
///   "receiver_id": 2,
///   "amount": 250,
///   "comment": "payment for services"
/// }
/// ```
///
/// # Atomicity
///
/// Both balances and both history rows are written in a single database
/// transaction. Either everything succeeds or nothing persists.
///
/// # Validation
///
/// - Accounts must be different and both must already exist
/// - Amount must be at least 1
/// - Comment must be 5 to 50 characters long
pub async fn create_transfer<S: LedgerStore>(
    State(state): State<AppState<S>>,
    JsonBody(request): JsonBody<TransferRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    request.validate()?;

    state
        .ledger
        .transfer(
            request.sender_id,
            request.receiver_id,
            request.amount,
            &request.comment,
        )
        .await?;

    Ok(Json(MessageResponse::new("Transaction was successful")))
}

/// List an account's transaction history.
///
/// # Query Parameters
///
/// - `order_by`: `date_time` or `amount`, optionally followed by `ASC`/`DESC`
/// - `limit`: page size, `0` (default) returns everything
/// - `offset`: rows to skip, only used with a non-zero `limit`
///
/// # Response (200 OK)
///
/// ```json
/// [
///   {
///     "transaction_id": 3,
///     "account_id": 1,
///     "amount": "-250",
///     "date": "2026-03-11T10:00:00Z",
///     "comment": "payment for services"
///   }
/// ]
/// ```
///
/// An account without history (or without a row at all) yields `[]`.
pub async fn list_transactions<S: LedgerStore>(
    State(state): State<AppState<S>>,
    PathParams(account_id): PathParams<i64>,
    QueryParams(params): QueryParams<HistoryParams>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let query = params.into_query(account_id)?;
    let entries = state.ledger.history(&query).await?;
    Ok(Json(entries))
}
