//! Shared application state and HTTP router.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::handlers;
use crate::services::exchange_service::ExchangeClient;
use crate::services::ledger_service::LedgerService;
use crate::store::LedgerStore;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// State handed to every handler.
///
/// Built once in `main` and cloned per request; the service handles are
/// reference counted.
pub struct AppState<S> {
    pub ledger: Arc<LedgerService<S>>,
    /// `None` when no currency API key is configured.
    pub exchange: Option<Arc<ExchangeClient>>,
    /// Upper bound on a whole request, ten seconds unless overridden.
    pub request_timeout: Duration,
}

impl<S> AppState<S> {
    pub fn new(ledger: LedgerService<S>, exchange: Option<ExchangeClient>) -> Self {
        Self {
            ledger: Arc::new(ledger),
            exchange: exchange.map(Arc::new),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            exchange: self.exchange.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

/// Build the HTTP router.
///
/// # Routes
///
/// - `GET  /health`
/// - `GET  /api/v1/accounts`
/// - `GET  /api/v1/accounts/{id}`
/// - `GET  /api/v1/accounts/{id}/balance/{currency}`
/// - `GET  /api/v1/accounts/{id}/transactions`
/// - `POST /api/v1/accounts/balance`
/// - `POST /api/v1/transactions/transfer`
///
/// A request still running after `state.request_timeout` is answered with
/// 408 and its handler future is dropped. An open store unit goes with it
/// and is rolled back.
pub fn router<S: LedgerStore>(state: AppState<S>) -> Router {
    let timeout = state.request_timeout;

    Router::new()
        .route("/health", get(handlers::health::health_check::<S>))
        .route("/api/v1/accounts", get(handlers::accounts::list_accounts::<S>))
        .route(
            "/api/v1/accounts/balance",
            post(handlers::accounts::change_balance::<S>),
        )
        .route(
            "/api/v1/accounts/{id}",
            get(handlers::accounts::get_account::<S>),
        )
        .route(
            "/api/v1/accounts/{id}/balance/{currency}",
            get(handlers::accounts::get_converted_balance::<S>),
        )
        .route(
            "/api/v1/accounts/{id}/transactions",
            get(handlers::transactions::list_transactions::<S>),
        )
        .route(
            "/api/v1/transactions/transfer",
            post(handlers::transactions::create_transfer::<S>),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
