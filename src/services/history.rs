//! History recorder.
//!
//! Every balance mutation appends exactly one row to the `transactions`
//! table, inside the same atomic unit as the balance change itself.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::models::transaction::NewHistoryEntry;
use crate::store::AtomicUnit;

/// Append the history row for a mutation of `amount` (signed) on `account_id`,
/// stamped with the current time.
///
/// An error here must abort the enclosing unit.
pub async fn record<U: AtomicUnit>(
    unit: &mut U,
    account_id: i64,
    amount: Decimal,
    comment: &str,
) -> Result<(), LedgerError> {
    let entry = NewHistoryEntry {
        account_id,
        amount,
        date_time: Utc::now(),
        comment: comment.to_string(),
    };
    unit.append_history(&entry).await
}
