//! Ledger storage capabilities.
//!
//! The engine never talks to a database directly. It works against two traits:
//!
//! - [`LedgerStore`]: read paths plus the ability to open an atomic unit.
//! - [`AtomicUnit`]: the writes that must commit or roll back together.
//!
//! [`PgStore`] is the production implementation on top of a PostgreSQL pool.
//! Test builds also get `MemoryStore`, an in-memory fake with the same
//! semantics.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::models::account::Account;
use crate::models::transaction::{HistoryEntry, HistoryQuery, NewHistoryEntry};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// Durable accounts table plus append-only history log.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    type Unit: AtomicUnit;

    /// Open a new atomic unit (a database transaction).
    async fn begin(&self) -> Result<Self::Unit, LedgerError>;

    /// Fails with [`LedgerError::NotFound`] when the account has no row.
    async fn read_balance(&self, account_id: i64) -> Result<Account, LedgerError>;

    /// All accounts in storage order.
    async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError>;

    /// History rows of one account; an unknown account simply has none.
    async fn list_by_account(&self, query: &HistoryQuery)
    -> Result<Vec<HistoryEntry>, LedgerError>;

    /// Cheap round trip used by the health check.
    async fn ping(&self) -> Result<(), LedgerError>;
}

/// Writes performed inside one atomic unit.
///
/// Nothing written through a unit is visible to anyone else until
/// [`AtomicUnit::commit`] succeeds. Dropping a unit without committing
/// discards its writes.
#[async_trait]
pub trait AtomicUnit: Send {
    /// Add `delta` to the account's balance and return the number of rows
    /// affected. Zero means the account does not exist; the caller decides
    /// whether that is an error or a reason to create it.
    async fn apply_delta(&mut self, account_id: i64, delta: Decimal) -> Result<u64, LedgerError>;

    /// Insert a new account. Fails with
    /// [`LedgerError::DuplicateOrConstraintViolation`] if the row exists or
    /// `initial_balance` is not positive.
    async fn insert_account(
        &mut self,
        account_id: i64,
        initial_balance: Decimal,
    ) -> Result<(), LedgerError>;

    /// Append one history row. Fails with [`LedgerError::WriteFailure`] unless
    /// exactly one row was written.
    async fn append_history(&mut self, entry: &NewHistoryEntry) -> Result<(), LedgerError>;

    async fn commit(self) -> Result<(), LedgerError>;

    async fn rollback(self) -> Result<(), LedgerError>;
}
