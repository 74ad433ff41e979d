//! Data models representing database entities and API bodies.

use crate::error::AppError;

/// Account model
pub mod account;
/// Transaction history model
pub mod transaction;

const COMMENT_MIN_CHARS: usize = 5;
const COMMENT_MAX_CHARS: usize = 50;

/// Account ids start at 1 on every path that names one.
pub(crate) fn validate_account_id(account_id: i64) -> Result<(), AppError> {
    if account_id < 1 {
        return Err(AppError::InvalidRequest(
            "account_id must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Comments on every mutation must be 5 to 50 characters long.
pub(crate) fn validate_comment(comment: &str) -> Result<(), AppError> {
    let len = comment.chars().count();
    if (COMMENT_MIN_CHARS..=COMMENT_MAX_CHARS).contains(&len) {
        Ok(())
    } else {
        Err(AppError::InvalidRequest(format!(
            "comment must be between {COMMENT_MIN_CHARS} and {COMMENT_MAX_CHARS} characters"
        )))
    }
}
