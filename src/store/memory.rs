//! In-memory ledger store used as a test double.
//!
//! A unit holds the store lock for its whole lifetime and works on a staged
//! copy of the tables. `commit` swaps the copy in; `rollback` or drop throws
//! it away. That gives the same all-or-nothing behavior as a database
//! transaction, with every unit fully serialized.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::LedgerError;
use crate::models::account::Account;
use crate::models::transaction::{
    Direction, HistoryEntry, HistoryQuery, NewHistoryEntry, OrderColumn,
};
use crate::store::{AtomicUnit, LedgerStore};

#[derive(Debug, Clone, Default)]
struct Tables {
    accounts: Vec<Account>,
    history: Vec<HistoryEntry>,
    next_transaction_id: i64,
    /// History appends for these accounts report zero rows written.
    broken_history: HashSet<i64>,
    /// Account inserts for these ids fail as if another writer got there first.
    broken_insert: HashSet<i64>,
    commits: usize,
    rollbacks: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

pub struct MemoryUnit {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with accounts, without any history.
    pub async fn with_accounts(accounts: &[(i64, Decimal)]) -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.lock().await;
            tables.accounts = accounts
                .iter()
                .map(|&(id, balance)| Account { id, balance })
                .collect();
        }
        store
    }

    /// Make every later history append for `account_id` write zero rows.
    pub async fn break_history_for(&self, account_id: i64) {
        self.tables.lock().await.broken_history.insert(account_id);
    }

    /// Make every later insert of `account_id` hit a duplicate key.
    pub async fn break_insert_for(&self, account_id: i64) {
        self.tables.lock().await.broken_insert.insert(account_id);
    }

    /// Every history row, in insertion order.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.tables.lock().await.history.clone()
    }

    pub async fn commits(&self) -> usize {
        self.tables.lock().await.commits
    }

    pub async fn rollbacks(&self) -> usize {
        self.tables.lock().await.rollbacks
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    type Unit = MemoryUnit;

    async fn begin(&self) -> Result<MemoryUnit, LedgerError> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryUnit { guard, staged })
    }

    async fn read_balance(&self, account_id: i64) -> Result<Account, LedgerError> {
        self.tables
            .lock()
            .await
            .accounts
            .iter()
            .find(|account| account.id == account_id)
            .cloned()
            .ok_or(LedgerError::NotFound(account_id))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        Ok(self.tables.lock().await.accounts.clone())
    }

    async fn list_by_account(
        &self,
        query: &HistoryQuery,
    ) -> Result<Vec<HistoryEntry>, LedgerError> {
        let mut entries: Vec<HistoryEntry> = self
            .tables
            .lock()
            .await
            .history
            .iter()
            .filter(|entry| entry.account_id == query.account_id)
            .cloned()
            .collect();

        if let Some(order) = query.order_by {
            entries.sort_by(|a, b| {
                let ordering = match order.column {
                    OrderColumn::DateTime => a.date_time.cmp(&b.date_time),
                    OrderColumn::Amount => a.amount.cmp(&b.amount),
                };
                // Matches SQL, where a bare column sorts ascending.
                match order.direction.unwrap_or(Direction::Asc) {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        if query.limit != 0 {
            entries = entries
                .into_iter()
                .skip(query.offset as usize)
                .take(query.limit as usize)
                .collect();
        }

        Ok(entries)
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[async_trait]
impl AtomicUnit for MemoryUnit {
    async fn apply_delta(&mut self, account_id: i64, delta: Decimal) -> Result<u64, LedgerError> {
        match self
            .staged
            .accounts
            .iter_mut()
            .find(|account| account.id == account_id)
        {
            Some(account) => {
                account.balance += delta;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn insert_account(
        &mut self,
        account_id: i64,
        initial_balance: Decimal,
    ) -> Result<(), LedgerError> {
        let exists = self
            .staged
            .accounts
            .iter()
            .any(|account| account.id == account_id);
        let conflicting = self.staged.broken_insert.contains(&account_id);
        if exists || conflicting || initial_balance <= Decimal::ZERO || account_id < 1 {
            return Err(LedgerError::DuplicateOrConstraintViolation(account_id));
        }

        self.staged.accounts.push(Account {
            id: account_id,
            balance: initial_balance,
        });
        Ok(())
    }

    async fn append_history(&mut self, entry: &NewHistoryEntry) -> Result<(), LedgerError> {
        if self.staged.broken_history.contains(&entry.account_id) {
            return Err(LedgerError::WriteFailure {
                account_id: entry.account_id,
                rows: 0,
            });
        }

        self.staged.next_transaction_id += 1;
        self.staged.history.push(HistoryEntry {
            transaction_id: self.staged.next_transaction_id,
            account_id: entry.account_id,
            amount: entry.amount,
            date_time: entry.date_time,
            comment: entry.comment.clone(),
        });
        Ok(())
    }

    async fn commit(mut self) -> Result<(), LedgerError> {
        self.staged.commits += 1;
        *self.guard = self.staged;
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), LedgerError> {
        self.guard.rollbacks += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn insert_of_existing_account_is_a_conflict() {
        let store = MemoryStore::with_accounts(&[(1, dec!(5))]).await;
        let mut unit = store.begin().await.unwrap();

        let err = unit.insert_account(1, dec!(3)).await.unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateOrConstraintViolation(1)));

        unit.rollback().await.unwrap();
        assert_eq!(store.read_balance(1).await.unwrap().balance, dec!(5));
    }

    #[tokio::test]
    async fn insert_with_non_positive_balance_is_a_conflict() {
        let store = MemoryStore::new();
        let mut unit = store.begin().await.unwrap();

        for balance in [dec!(0), dec!(-1)] {
            let err = unit.insert_account(2, balance).await.unwrap_err();
            assert!(matches!(err, LedgerError::DuplicateOrConstraintViolation(2)));
        }
        let err = unit.insert_account(0, dec!(1)).await.unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateOrConstraintViolation(0)));

        unit.commit().await.unwrap();
        assert!(store.list_accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_is_visible_only_after_commit() {
        let store = MemoryStore::new();
        let mut unit = store.begin().await.unwrap();
        unit.insert_account(3, dec!(7)).await.unwrap();
        unit.rollback().await.unwrap();
        assert!(store.read_balance(3).await.is_err());

        let mut unit = store.begin().await.unwrap();
        unit.insert_account(3, dec!(7)).await.unwrap();
        unit.commit().await.unwrap();
        assert_eq!(store.read_balance(3).await.unwrap().balance, dec!(7));
        assert_eq!(store.rollbacks().await, 1);
        assert_eq!(store.commits().await, 1);
    }

    #[tokio::test]
    async fn broken_insert_reports_a_duplicate() {
        let store = MemoryStore::new();
        store.break_insert_for(4).await;
        let mut unit = store.begin().await.unwrap();

        let err = unit.insert_account(4, dec!(10)).await.unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateOrConstraintViolation(4)));
    }
}
