use super::codes::{BAD_REQUEST, ERR_BAD_REQUEST, INTERNAL_SERVER_ERROR};
use super::error::Error;

/// Top-level error class driving status codes and message redaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Chain rooted at the bad-request family; safe to show to the caller.
    Client,
    /// Anything else; logged and redacted outside debug mode.
    Server,
}

impl Fault {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Client => 400,
            Self::Server => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub fault: Fault,
    /// Codes in wrap order: the root-most code first.
    pub codes: Vec<String>,
}

/// True when the chain holds `ERR_BAD_REQUEST`, or ends in a parentless
/// `BAD_REQUEST` node built in its place.
pub fn is_bad_request(err: &Error) -> bool {
    if err.is(&ERR_BAD_REQUEST) {
        return true;
    }
    err.chain()
        .last()
        .and_then(Error::as_coded)
        .map_or(false, |root| root.code() == BAD_REQUEST)
}

/// Codes attached along the chain of `err`, root-most first.
///
/// Non-coded links (wrapped messages, library errors) are skipped but do not
/// stop the walk.
pub fn codes(err: &Error) -> Vec<String> {
    let mut codes: Vec<String> = err
        .chain()
        .filter_map(Error::as_coded)
        .map(|coded| coded.code().to_string())
        .collect();
    codes.reverse();
    codes
}

pub fn classify(err: &Error) -> Classification {
    let fault = if is_bad_request(err) {
        Fault::Client
    } else {
        Fault::Server
    };

    let mut codes = codes(err);
    if codes.is_empty() && fault == Fault::Server {
        codes.push(INTERNAL_SERVER_ERROR.to_string());
    }

    Classification { fault, codes }
}
