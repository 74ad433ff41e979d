//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, query string)
//! 2. Validates it and calls the ledger service
//! 3. Returns HTTP response (JSON, status code)
//!
//! Handlers are generic over the ledger store so the same router runs on
//! PostgreSQL in production and on an in-memory store in tests.

/// Account endpoints
pub mod accounts;
/// Service health endpoint
pub mod health;
/// Transfer and history endpoints
pub mod transactions;
