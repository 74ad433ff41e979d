//! Transaction history models and API request/response types.
//!
//! This module defines:
//! - `HistoryEntry`: one immutable row of the `transactions` table
//! - `NewHistoryEntry`: a row about to be appended
//! - `HistoryOrder` / `HistoryQuery`: the read path over an account's history
//! - Request types for transfers and history listing

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{validate_account_id, validate_comment};

/// Represents a transaction history record from the database.
///
/// # Database Table
///
/// Maps to the `transactions` table. Rows are append-only: nothing in the
/// service updates or deletes them. `amount` is signed, negative for debits.
///
/// # JSON Example
///
/// ```json
/// {
///   "transaction_id": 12,
///   "account_id": 1,
///   "amount": "-25",
///   "date": "2026-03-11T10:00:00Z",
///   "comment": "rent payment"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct HistoryEntry {
    pub transaction_id: i64,
    pub account_id: i64,
    pub amount: Decimal,
    #[serde(rename = "date")]
    pub date_time: DateTime<Utc>,
    pub comment: String,
}

/// A history row before the store has assigned its `transaction_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
    pub account_id: i64,
    pub amount: Decimal,
    pub date_time: DateTime<Utc>,
    pub comment: String,
}

/// Column a history listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderColumn {
    DateTime,
    Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Sort key for history listings.
///
/// Only `date_time` and `amount` are accepted, optionally followed by a
/// single space and `ASC`/`DESC` in upper or lower case. Anything else fails
/// to parse, so the SQL rendered from this type can only ever be one of a
/// fixed set of clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryOrder {
    pub column: OrderColumn,
    pub direction: Option<Direction>,
}

impl FromStr for HistoryOrder {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (column, rest) = if let Some(rest) = value.strip_prefix("date_time") {
            (OrderColumn::DateTime, rest)
        } else if let Some(rest) = value.strip_prefix("amount") {
            (OrderColumn::Amount, rest)
        } else {
            return Err(invalid_order(value));
        };

        let direction = match rest {
            "" => None,
            " ASC" | " asc" => Some(Direction::Asc),
            " DESC" | " desc" => Some(Direction::Desc),
            _ => return Err(invalid_order(value)),
        };

        Ok(Self { column, direction })
    }
}

fn invalid_order(value: &str) -> AppError {
    AppError::InvalidRequest(format!(
        "order_by must be date_time or amount, optionally followed by ASC or DESC, got '{value}'"
    ))
}

impl fmt::Display for HistoryOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let column = match self.column {
            OrderColumn::DateTime => "date_time",
            OrderColumn::Amount => "amount",
        };
        match self.direction {
            None => write!(f, "{column}"),
            Some(Direction::Asc) => write!(f, "{column} ASC"),
            Some(Direction::Desc) => write!(f, "{column} DESC"),
        }
    }
}

/// Parameters of the history read path.
///
/// `limit == 0` means no pagination at all; `offset` is only applied together
/// with a non-zero `limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub account_id: i64,
    pub order_by: Option<HistoryOrder>,
    pub limit: u32,
    pub offset: u32,
}

impl HistoryQuery {
    pub fn all(account_id: i64) -> Self {
        Self {
            account_id,
            order_by: None,
            limit: 0,
            offset: 0,
        }
    }

    pub fn ordered(mut self, order: HistoryOrder) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

/// Query string of `GET /api/v1/accounts/{id}/transactions`.
///
/// ```text
/// ?order_by=amount%20DESC&limit=10&offset=20
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl HistoryParams {
    /// Validate the parameters and build the store query for `account_id`.
    pub fn into_query(self, account_id: i64) -> Result<HistoryQuery, AppError> {
        validate_account_id(account_id)?;

        let order_by = match self.order_by.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<HistoryOrder>()?),
        };

        let limit = non_negative("limit", self.limit)?;
        let offset = non_negative("offset", self.offset)?;
        let query = HistoryQuery::all(account_id).page(limit, offset);

        Ok(match order_by {
            Some(order) => query.ordered(order),
            None => query,
        })
    }
}

fn non_negative(name: &str, value: Option<i64>) -> Result<u32, AppError> {
    let value = value.unwrap_or(0);
    u32::try_from(value)
        .map_err(|_| AppError::InvalidRequest(format!("{name} must be between 0 and {}", u32::MAX)))
}

/// Request to transfer money between two existing accounts.
///
/// # JSON Example
///
/// ```json
/// {
///   "sender_id": 1,
///   "receiver_id": 2,
///   "amount": 250,
///   "comment": "payment for services"
/// }
/// ```
///
/// # Atomicity Guarantee
///
/// Both balances and both history rows are written in one database
/// transaction. If the credit fails, the debit is rolled back.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub amount: Decimal,
    pub comment: String,
}

impl TransferRequest {
    /// # Validation
    ///
    /// - both ids must be at least 1 and different
    /// - `amount` must be at least 1
    /// - `comment` must be 5 to 50 characters long
    pub fn validate(&self) -> Result<(), AppError> {
        if self.sender_id < 1 || self.receiver_id < 1 {
            return Err(AppError::InvalidRequest(
                "sender_id and receiver_id must be at least 1".to_string(),
            ));
        }
        if self.sender_id == self.receiver_id {
            return Err(AppError::InvalidRequest(
                "Cannot transfer to same account".to_string(),
            ));
        }
        if self.amount < Decimal::ONE {
            return Err(AppError::InvalidRequest(
                "amount must be at least 1".to_string(),
            ));
        }
        validate_comment(&self.comment)
    }
}

/// Plain success body for mutations that return no resource.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_every_accepted_order_key() {
        let accepted = [
            ("date_time", OrderColumn::DateTime, None),
            ("amount", OrderColumn::Amount, None),
            ("date_time ASC", OrderColumn::DateTime, Some(Direction::Asc)),
            ("amount asc", OrderColumn::Amount, Some(Direction::Asc)),
            ("date_time desc", OrderColumn::DateTime, Some(Direction::Desc)),
            ("amount DESC", OrderColumn::Amount, Some(Direction::Desc)),
        ];
        for (raw, column, direction) in accepted {
            let order: HistoryOrder = raw.parse().unwrap();
            assert_eq!(order, HistoryOrder { column, direction }, "{raw}");
        }
    }

    #[test]
    fn rejects_anything_outside_the_order_set() {
        for raw in [
            "comment",
            "amount  DESC",
            "amount Desc",
            "amount DESC; DROP TABLE accounts",
            "AMOUNT",
            "date_time,amount",
        ] {
            assert!(raw.parse::<HistoryOrder>().is_err(), "{raw}");
        }
    }

    #[test]
    fn order_displays_canonical_form() {
        let order: HistoryOrder = "amount desc".parse().unwrap();
        assert_eq!(order.to_string(), "amount DESC");
        let order: HistoryOrder = "date_time".parse().unwrap();
        assert_eq!(order.to_string(), "date_time");
    }

    #[test]
    fn params_build_query() {
        let params = HistoryParams {
            order_by: Some("amount DESC".into()),
            limit: Some(10),
            offset: Some(5),
        };
        let query = params.into_query(3).unwrap();
        assert_eq!(
            query,
            HistoryQuery::all(3)
                .ordered(HistoryOrder {
                    column: OrderColumn::Amount,
                    direction: Some(Direction::Desc),
                })
                .page(10, 5)
        );
    }

    #[test]
    fn params_default_to_unpaginated_storage_order() {
        let query = HistoryParams::default().into_query(1).unwrap();
        assert_eq!(query, HistoryQuery::all(1));

        let empty_order = HistoryParams {
            order_by: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(empty_order.into_query(1).unwrap().order_by, None);
    }

    #[test]
    fn params_reject_negative_paging_and_bad_account() {
        let negative = HistoryParams {
            limit: Some(-1),
            ..Default::default()
        };
        assert!(negative.into_query(1).is_err());
        assert!(HistoryParams::default().into_query(0).is_err());
    }

    #[test]
    fn transfer_validation() {
        let ok = TransferRequest {
            sender_id: 1,
            receiver_id: 2,
            amount: dec!(1),
            comment: "rent payment".into(),
        };
        assert!(ok.validate().is_ok());

        let same = TransferRequest {
            receiver_id: 1,
            ..ok.clone()
        };
        assert!(same.validate().is_err());

        let small = TransferRequest {
            amount: dec!(0.5),
            ..ok.clone()
        };
        assert!(small.validate().is_err());

        let short = TransferRequest {
            comment: "rent".into(),
            ..ok.clone()
        };
        assert!(short.validate().is_err());
    }
}
