//! Account data models and API request/response types.
//!
//! This module defines:
//! - `Account`: Database entity representing an account
//! - `ChangeBalanceRequest`: Request body for crediting or debiting one account
//! - `ConversionResponse`: Balance converted into another currency

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{validate_account_id, validate_comment};

/// Represents an account record from the database.
///
/// # Database Table
///
/// Maps to the `accounts` table. Ids are assigned by the caller, never by the
/// store. The balance is an exact decimal and may be negative after a debit.
///
/// # JSON Example
///
/// ```json
/// { "account_id": 1, "balance": "150.25" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Account {
    #[serde(rename = "account_id")]
    #[sqlx(rename = "account_id")]
    pub id: i64,

    pub balance: Decimal,
}

/// Request to credit or debit a single account.
///
/// A positive `amount` credits, a negative one debits. Crediting an unknown
/// account opens it with `amount` as its balance.
///
/// # JSON Example
///
/// ```json
/// {
///   "account_id": 1,
///   "amount": 100.5,
///   "comment": "salary"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct ChangeBalanceRequest {
    pub account_id: i64,
    pub amount: Decimal,
    pub comment: String,
}

impl ChangeBalanceRequest {
    /// # Validation
    ///
    /// - `account_id` must be at least 1
    /// - `amount` must not be zero
    /// - `comment` must be 5 to 50 characters long
    pub fn validate(&self) -> Result<(), AppError> {
        validate_account_id(self.account_id)?;
        if self.amount.is_zero() {
            return Err(AppError::InvalidRequest(
                "amount must not be zero".to_string(),
            ));
        }
        validate_comment(&self.comment)
    }
}

/// Account balance expressed in another currency.
#[derive(Debug, Serialize)]
pub struct ConversionResponse {
    pub account_id: i64,
    pub currency: String,
    pub balance: Decimal,
    pub result: Decimal,
}

/// Normalize and check an ISO 4217 style currency code.
pub fn parse_currency(code: &str) -> Result<String, AppError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(AppError::InvalidRequest(format!(
            "'{code}' is not a three-letter currency code"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(account_id: i64, amount: Decimal, comment: &str) -> ChangeBalanceRequest {
        ChangeBalanceRequest {
            account_id,
            amount,
            comment: comment.to_string(),
        }
    }

    #[test]
    fn accepts_credits_and_debits() {
        assert!(request(1, dec!(10), "salary").validate().is_ok());
        assert!(request(1, dec!(-0.01), "coffee").validate().is_ok());
    }

    #[test]
    fn rejects_zero_amount_and_bad_ids() {
        assert!(request(1, dec!(0), "nothing").validate().is_err());
        assert!(request(0, dec!(5), "salary").validate().is_err());
        assert!(request(-3, dec!(5), "salary").validate().is_err());
    }

    #[test]
    fn rejects_comments_outside_length_bounds() {
        assert!(request(1, dec!(5), "abcd").validate().is_err());
        assert!(request(1, dec!(5), &"x".repeat(51)).validate().is_err());
        assert!(request(1, dec!(5), &"x".repeat(50)).validate().is_ok());
    }

    #[test]
    fn account_serializes_with_account_id_key() {
        let json = serde_json::to_value(Account {
            id: 4,
            balance: dec!(12.5),
        })
        .unwrap();
        assert_eq!(json["account_id"], 4);
        assert_eq!(json["balance"], "12.5");
    }

    #[test]
    fn currency_codes_are_normalized() {
        assert_eq!(parse_currency("usd").unwrap(), "USD");
        assert!(parse_currency("US").is_err());
        assert!(parse_currency("U5D").is_err());
    }
}
