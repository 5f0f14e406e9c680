//! Coded errors, fault classification and call stack attribution

pub mod classify;
pub mod codes;
pub mod error;
pub mod stack;

pub use classify::{classify, Classification, Fault};
pub use codes::{
    ERR_ALREADY_EXISTS, ERR_BAD_REQUEST, ERR_INVALID_EMAIL_ADDRESS, ERR_INVALID_ID,
    ERR_INVALID_LIMIT, ERR_INVALID_NAME, ERR_INVALID_PASSWORD, ERR_INVALID_PAYLOAD,
    ERR_NOT_FOUND,
};
pub use error::{add_code, add_code_with_message, is, unwrap, CodedError, Error};
pub use stack::caller;

pub type Result<T, E = Error> = std::result::Result<T, E>;
