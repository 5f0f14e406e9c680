use lazy_static::lazy_static;

use super::error::{add_code_with_message, Error};

pub const BAD_REQUEST: &str = "BAD_REQUEST";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
pub const INVALID_ID: &str = "INVALID_ID";
pub const INVALID_PASSWORD: &str = "INVALID_PASSWORD";
pub const INVALID_EMAIL_ADDRESS: &str = "INVALID_EMAIL_ADDRESS";
pub const INVALID_PAYLOAD: &str = "INVALID_PAYLOAD";
pub const INVALID_NAME: &str = "INVALID_NAME";
pub const INVALID_LIMIT: &str = "INVALID_LIMIT";

/// Synthesized for server faults that carry no code of their own.
pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";

lazy_static! {
    /// Root of every client fault.
    pub static ref ERR_BAD_REQUEST: Error =
        add_code_with_message(None, BAD_REQUEST, "bad request");

    pub static ref ERR_NOT_FOUND: Error = bad_request(NOT_FOUND, "not found");
    pub static ref ERR_ALREADY_EXISTS: Error = bad_request(ALREADY_EXISTS, "already exists");
    pub static ref ERR_INVALID_ID: Error = bad_request(INVALID_ID, "invalid ID");
    pub static ref ERR_INVALID_PASSWORD: Error = bad_request(INVALID_PASSWORD, "invalid password");
    pub static ref ERR_INVALID_EMAIL_ADDRESS: Error =
        bad_request(INVALID_EMAIL_ADDRESS, "invalid email address");
    pub static ref ERR_INVALID_PAYLOAD: Error = bad_request(INVALID_PAYLOAD, "invalid payload");
    pub static ref ERR_INVALID_NAME: Error = bad_request(INVALID_NAME, "invalid name");
    pub static ref ERR_INVALID_LIMIT: Error = bad_request(INVALID_LIMIT, "invalid limit");
}

fn bad_request(code: &'static str, message: &str) -> Error {
    add_code_with_message(Some(ERR_BAD_REQUEST.clone()), code, message)
}

/// Force construction of the well-known errors (called on startup).
pub fn init_well_known() {
    lazy_static::initialize(&ERR_BAD_REQUEST);
    lazy_static::initialize(&ERR_NOT_FOUND);
    lazy_static::initialize(&ERR_ALREADY_EXISTS);
    lazy_static::initialize(&ERR_INVALID_ID);
    lazy_static::initialize(&ERR_INVALID_PASSWORD);
    lazy_static::initialize(&ERR_INVALID_EMAIL_ADDRESS);
    lazy_static::initialize(&ERR_INVALID_PAYLOAD);
    lazy_static::initialize(&ERR_INVALID_NAME);
    lazy_static::initialize(&ERR_INVALID_LIMIT);
}
