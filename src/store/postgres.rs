//! PostgreSQL-backed ledger store.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};

use crate::db::DbPool;
use crate::error::LedgerError;
use crate::models::account::Account;
use crate::models::transaction::{HistoryEntry, HistoryQuery, NewHistoryEntry};
use crate::store::{AtomicUnit, LedgerStore};

/// Ledger store over a shared connection pool.
///
/// Cloning is cheap; every clone uses the same pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// One open PostgreSQL transaction.
///
/// If the unit is dropped without `commit` or `rollback` (for example because
/// the request future was cancelled), sqlx rolls the transaction back when the
/// connection returns to the pool.
pub struct PgUnit {
    tx: Transaction<'static, Postgres>,
}

/// Build the history listing query.
///
/// The ORDER BY clause comes from the typed [`HistoryOrder`](crate::models::transaction::HistoryOrder),
/// never from raw client input.
fn history_sql(query: &HistoryQuery) -> String {
    let mut sql = String::from(
        "SELECT transaction_id, account_id, amount, date_time, comment \
         FROM transactions \
         WHERE account_id = $1",
    );

    match query.order_by {
        Some(order) => sql.push_str(&format!(" ORDER BY {order}, transaction_id")),
        None => sql.push_str(" ORDER BY transaction_id"),
    }

    if query.limit != 0 {
        sql.push_str(&format!(" LIMIT {} OFFSET {}", query.limit, query.offset));
    }

    sql
}

#[async_trait]
impl LedgerStore for PgStore {
    type Unit = PgUnit;

    async fn begin(&self) -> Result<PgUnit, LedgerError> {
        let tx = self.pool.begin().await?;
        Ok(PgUnit { tx })
    }

    async fn read_balance(&self, account_id: i64) -> Result<Account, LedgerError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT account_id, balance
            FROM accounts
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            let err = LedgerError::from_read(account_id, err);
            if let LedgerError::StoreUnavailable(ref cause) = err {
                tracing::error!(account_id, error = %cause, "failed to read account balance");
            }
            err
        })
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        let accounts = sqlx::query_as::<_, Account>("SELECT account_id, balance FROM accounts")
            .fetch_all(&self.pool)
            .await
            .inspect_err(|err| tracing::error!(error = %err, "failed to list accounts"))?;

        Ok(accounts)
    }

    async fn list_by_account(
        &self,
        query: &HistoryQuery,
    ) -> Result<Vec<HistoryEntry>, LedgerError> {
        let sql = history_sql(query);
        let entries = sqlx::query_as::<_, HistoryEntry>(&sql)
            .bind(query.account_id)
            .fetch_all(&self.pool)
            .await
            .inspect_err(|err| {
                tracing::error!(
                    account_id = query.account_id,
                    error = %err,
                    "failed to list transaction history"
                )
            })?;

        Ok(entries)
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl AtomicUnit for PgUnit {
    async fn apply_delta(&mut self, account_id: i64, delta: Decimal) -> Result<u64, LedgerError> {
        // The UPDATE takes the row lock; concurrent mutations of the same
        // account queue behind it until this transaction finishes.
        let rows = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = balance + $2
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .bind(delta)
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        Ok(rows)
    }

    async fn insert_account(
        &mut self,
        account_id: i64,
        initial_balance: Decimal,
    ) -> Result<(), LedgerError> {
        if initial_balance <= Decimal::ZERO {
            return Err(LedgerError::DuplicateOrConstraintViolation(account_id));
        }

        let rows = sqlx::query(
            r#"
            INSERT INTO accounts (account_id, balance)
            VALUES ($1, $2)
            "#,
        )
        .bind(account_id)
        .bind(initial_balance)
        .execute(&mut *self.tx)
        .await
        .map_err(|err| LedgerError::from_insert(account_id, err))?
        .rows_affected();

        if rows != 1 {
            return Err(LedgerError::DuplicateOrConstraintViolation(account_id));
        }
        Ok(())
    }

    async fn append_history(&mut self, entry: &NewHistoryEntry) -> Result<(), LedgerError> {
        let rows = sqlx::query(
            r#"
            INSERT INTO transactions (account_id, amount, date_time, comment)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.account_id)
        .bind(entry.amount)
        .bind(entry.date_time)
        .bind(&entry.comment)
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        if rows != 1 {
            return Err(LedgerError::WriteFailure {
                account_id: entry.account_id,
                rows,
            });
        }
        Ok(())
    }

    async fn commit(self) -> Result<(), LedgerError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), LedgerError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
