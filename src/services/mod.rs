//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They own atomic units, history recording and external lookups.

pub mod exchange_service;
pub mod history;
pub mod ledger_service;
