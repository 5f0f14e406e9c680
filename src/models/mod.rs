pub mod email;
pub mod user;

pub use email::Email;
pub use user::{AuthUser, User};

use crate::errors::{Result, ERR_INVALID_ID};

/// Parse a positive row ID
pub fn parse_id(raw: &str) -> Result<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ERR_INVALID_ID.clone()),
    }
}
