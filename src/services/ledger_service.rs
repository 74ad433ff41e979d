//! Ledger service - balance mutation engine.
//!
//! This service handles:
//! - Single-account credits and debits, opening an account on first credit
//! - Atomic two-account transfers
//! - Read paths over balances and history
//!
//! # Atomicity Guarantees
//!
//! Each mutation runs inside one atomic unit and finishes through
//! [`settle`]: success commits, any failure rolls the unit back explicitly
//! before the error is returned. Balance changes and their history rows are
//! therefore durable together or not at all.
//!
//! Nothing is retried here. Serialization conflicts, deadlocks and pool
//! exhaustion surface as [`LedgerError::StoreUnavailable`].

use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::models::account::Account;
use crate::models::transaction::{HistoryEntry, HistoryQuery};
use crate::services::history;
use crate::store::{AtomicUnit, LedgerStore};

/// Ledger engine over any [`LedgerStore`].
///
/// Holds no mutable state of its own; the store is the only synchronization
/// point, so one instance is shared by every request.
#[derive(Debug, Clone)]
pub struct LedgerService<S> {
    store: S,
}

/// Outcome of applying a delta to an account that may not exist.
enum Change {
    Applied,
    AccountMissing,
}

impl<S: LedgerStore> LedgerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[tracing::instrument(skip(self))]
    pub async fn read_balance(&self, account_id: i64) -> Result<Account, LedgerError> {
        self.store.read_balance(account_id).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.store.list_accounts().await
    }

    #[tracing::instrument(skip(self))]
    pub async fn history(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>, LedgerError> {
        self.store.list_by_account(query).await
    }

    /// Credit (positive `amount`) or debit (negative `amount`) one account.
    ///
    /// # Process
    ///
    /// 1. Open an atomic unit and apply the delta
    /// 2. If the account exists, record history and commit
    /// 3. If it does not, release the unit and open the account with
    ///    `amount` as its balance, in a unit of its own
    ///
    /// # Errors
    ///
    /// - `NegativeInitialBalance`: the account is missing and `amount <= 0`;
    ///   debits never create accounts
    /// - `DuplicateOrConstraintViolation`: the account appeared concurrently
    /// - `WriteFailure` / `StoreUnavailable`: the unit was rolled back
    #[tracing::instrument(skip(self, comment))]
    pub async fn change_balance(
        &self,
        account_id: i64,
        amount: Decimal,
        comment: &str,
    ) -> Result<(), LedgerError> {
        let mut unit = self.store.begin().await?;
        let outcome = apply_change(&mut unit, account_id, amount, comment).await;

        match outcome {
            Ok(Change::AccountMissing) => {
                // Nothing was written; release the unit before opening the account.
                unit.rollback().await?;
                self.open_account(account_id, amount, comment).await
            }
            other => settle(unit, other.map(|_| ())).await,
        }
    }

    /// Open `account_id` with `amount` as its balance and record it in history.
    async fn open_account(
        &self,
        account_id: i64,
        amount: Decimal,
        comment: &str,
    ) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            tracing::warn!(%amount, "refusing to open account with non-positive balance");
            return Err(LedgerError::NegativeInitialBalance);
        }

        let mut unit = self.store.begin().await?;
        let outcome = create_account(&mut unit, account_id, amount, comment).await;
        settle(unit, outcome).await?;

        tracing::info!(account_id, %amount, "account opened");
        Ok(())
    }

    /// Move `amount` from `sender_id` to `receiver_id` in one atomic unit.
    ///
    /// # Process
    ///
    /// 1. Debit the sender and record `-amount` for it
    /// 2. Credit the receiver and record `+amount` for it
    /// 3. Commit
    ///
    /// Unlike [`change_balance`](Self::change_balance), neither side is ever
    /// created: both accounts must already exist. The debit always runs
    /// first, so when both ids are unknown the sender is the one reported.
    ///
    /// # Errors
    ///
    /// - `InvalidTransfer`: same account on both sides, or `amount <= 0`
    /// - `AccountNotFound`: either side affected no rows; nothing persists
    /// - `WriteFailure` / `StoreUnavailable`: the unit was rolled back
    #[tracing::instrument(skip(self, comment))]
    pub async fn transfer(
        &self,
        sender_id: i64,
        receiver_id: i64,
        amount: Decimal,
        comment: &str,
    ) -> Result<(), LedgerError> {
        if sender_id == receiver_id {
            return Err(LedgerError::InvalidTransfer(
                "sender and receiver are the same account",
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidTransfer("amount must be positive"));
        }

        let mut unit = self.store.begin().await?;
        let outcome = move_funds(&mut unit, sender_id, receiver_id, amount, comment).await;
        settle(unit, outcome).await?;

        tracing::info!(sender_id, receiver_id, %amount, "transfer committed");
        Ok(())
    }
}

async fn apply_change<U: AtomicUnit>(
    unit: &mut U,
    account_id: i64,
    amount: Decimal,
    comment: &str,
) -> Result<Change, LedgerError> {
    if unit.apply_delta(account_id, amount).await? == 0 {
        return Ok(Change::AccountMissing);
    }
    history::record(unit, account_id, amount, comment).await?;
    Ok(Change::Applied)
}

async fn create_account<U: AtomicUnit>(
    unit: &mut U,
    account_id: i64,
    amount: Decimal,
    comment: &str,
) -> Result<(), LedgerError> {
    unit.insert_account(account_id, amount).await?;
    history::record(unit, account_id, amount, comment).await
}

async fn move_funds<U: AtomicUnit>(
    unit: &mut U,
    sender_id: i64,
    receiver_id: i64,
    amount: Decimal,
    comment: &str,
) -> Result<(), LedgerError> {
    if unit.apply_delta(sender_id, -amount).await? != 1 {
        return Err(LedgerError::AccountNotFound(sender_id));
    }
    history::record(unit, sender_id, -amount, comment).await?;

    if unit.apply_delta(receiver_id, amount).await? != 1 {
        return Err(LedgerError::AccountNotFound(receiver_id));
    }
    history::record(unit, receiver_id, amount, comment).await
}

/// Finish a unit: commit on success, roll back explicitly on failure.
///
/// A failed rollback is logged; the caller still gets the original error.
async fn settle<U: AtomicUnit, T>(
    unit: U,
    outcome: Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    match outcome {
        Ok(value) => {
            unit.commit().await?;
            Ok(value)
        }
        Err(err) => {
            tracing::warn!(error = %err, "rolling back atomic unit");
            if let Err(rollback_err) = unit.rollback().await {
                tracing::error!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
