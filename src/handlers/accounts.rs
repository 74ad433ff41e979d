//! Account HTTP handlers.
//!
//! This module implements the account-related API endpoints:
//! - GET /api/v1/accounts - List all accounts
//! - GET /api/v1/accounts/{id} - Get account balance
//! - GET /api/v1/accounts/{id}/balance/{currency} - Balance in another currency
//! - POST /api/v1/accounts/balance - Credit or debit one account

use axum::{Json, extract::State};

use crate::{
    app::AppState,
    error::AppError,
    extract::{JsonBody, PathParams},
    models::account::{Account, ChangeBalanceRequest, ConversionResponse, parse_currency},
    models::transaction::MessageResponse,
    models::validate_account_id,
    store::LedgerStore,
};

/// List all accounts.
///
/// # Response (200 OK)
///
/// ```json
/// [
///   { "account_id": 1, "balance": "150.25" },
///   { "account_id": 2, "balance": "-10" }
/// ]
/// ```
///
/// Accounts come back in storage order, which is not guaranteed to be sorted.
pub async fn list_accounts<S: LedgerStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Account>>, AppError> {
    let accounts = state.ledger.list_accounts().await?;
    Ok(Json(accounts))
}

/// Get a specific account by ID.
///
/// # Response
///
/// - **Success (200 OK)**: `{ "account_id": 1, "balance": "150.25" }`
/// - **Error (400)**: `id` is not an integer of at least 1
/// - **Error (404)**: Account not found
pub async fn get_account<S: LedgerStore>(
    State(state): State<AppState<S>>,
    PathParams(account_id): PathParams<i64>,
) -> Result<Json<Account>, AppError> {
    validate_account_id(account_id)?;
    let account = state.ledger.read_balance(account_id).await?;
    Ok(Json(account))
}

/// Credit or debit an account.
///
/// # Request Body
///
/// ```json
/// {
///   "account_id": 1,
///   "amount": -25,
///   "comment": "card payment"
/// }
/// ```
///
/// A positive amount on an unknown account opens it with that balance.
///
/// # Response
///
/// - **Success (200 OK)**: `{ "message": "Balance successfully changed" }`
/// - **Error (400)**: Validation failed
/// - **Error (422)**: Debit of an account that does not exist
pub async fn change_balance<S: LedgerStore>(
    State(state): State<AppState<S>>,
    JsonBody(request): JsonBody<ChangeBalanceRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    request.validate()?;

    state
        .ledger
        .change_balance(request.account_id, request.amount, &request.comment)
        .await?;

    Ok(Json(MessageResponse::new("Balance successfully changed")))
}

/// Get an account's balance converted into another currency.
///
/// # Response
///
/// - **Success (200 OK)**:
///   `{ "account_id": 1, "currency": "USD", "balance": "150", "result": "2.01" }`
/// - **Error (404)**: Account not found
/// - **Error (502)**: Exchange rate API failed
/// - **Error (503)**: No currency API key configured
pub async fn get_converted_balance<S: LedgerStore>(
    State(state): State<AppState<S>>,
    PathParams((account_id, currency)): PathParams<(i64, String)>,
) -> Result<Json<ConversionResponse>, AppError> {
    validate_account_id(account_id)?;
    let currency = parse_currency(&currency)?;
    let exchange = state
        .exchange
        .as_ref()
        .ok_or(AppError::ExchangeUnavailable)?;

    let account = state.ledger.read_balance(account_id).await?;
    let result = exchange.convert(&currency, account.balance).await?;

    Ok(Json(ConversionResponse {
        account_id: account.id,
        currency,
        balance: account.balance,
        result,
    }))
}
