//! JSON success and error responses for the REST transport

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::CONTENT_TYPE, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::convert::Infallible;
use std::fmt;
use tracing::error;
use utoipa::ToSchema;

use super::middleware::RequestFlags;
use crate::errors::{caller, classify, Classification, Error, Fault};
use crate::metrics::registry::ERRORS_PRESENTED_TOTAL;

/// Message shown for server faults outside debug mode
pub const GENERIC_SERVER_MESSAGE: &str = "Internal Server Error";

/// Written when the error envelope itself cannot be encoded
const FALLBACK_BODY: &[u8] =
    br#"{"error":{"codes":["INTERNAL_SERVER_ERROR"],"msg":"Internal Server Error"}}"#;

/// Error envelope
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Error codes, root-most first
    #[schema(example = json!(["BAD_REQUEST", "INVALID_ID"]))]
    pub codes: Vec<String>,
    /// Human-readable message
    #[schema(example = "invalid ID")]
    pub msg: String,
}

/// Response writer bound to the current request's flags
#[derive(Debug, Clone, Copy, Default)]
pub struct Resp {
    flags: RequestFlags,
}

#[async_trait]
impl<S> FromRequestParts<S> for Resp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let flags = parts
            .extensions
            .get::<RequestFlags>()
            .copied()
            .unwrap_or_else(|| RequestFlags::from_uri(&parts.uri));
        Ok(Self { flags })
    }
}

impl Resp {
    pub fn new(flags: RequestFlags) -> Self {
        Self { flags }
    }

    pub fn flags(&self) -> RequestFlags {
        self.flags
    }

    /// Write `err` as an error envelope; `None` yields an empty 200.
    pub fn fail(&self, err: impl Into<Option<Error>>) -> Response {
        let Some(err) = err.into() else {
            return Response::default();
        };

        let Classification { fault, codes } = classify(&err);
        let msg = match fault {
            Fault::Client => err.to_string(),
            Fault::Server => {
                // the panic hook has already reported panics with their own caller
                if !err.is_panic() {
                    error!(error = %err, file = %caller(), "Request failed");
                }
                if self.flags.debug {
                    err.to_string()
                } else {
                    GENERIC_SERVER_MESSAGE.to_string()
                }
            }
        };
        ERRORS_PRESENTED_TOTAL
            .with_label_values(&["rest", fault.as_str()])
            .inc();

        let envelope = ErrorResponse {
            error: ErrorDetail { codes, msg },
        };
        // never goes back through `json`
        let body = self
            .encode(&envelope)
            .unwrap_or_else(|_| FALLBACK_BODY.to_vec());

        let status =
            StatusCode::from_u16(fault.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(CONTENT_TYPE, "application/json")], body).into_response()
    }

    /// Fail with a formatted message
    pub fn failf(&self, args: fmt::Arguments<'_>) -> Response {
        self.fail(Error::msg(args.to_string()))
    }

    /// Fail with a formatted message wrapping `parent`
    pub fn failf_wrap(&self, parent: Error, args: fmt::Arguments<'_>) -> Response {
        self.fail(Error::wrap(parent, args.to_string()))
    }

    /// Write `data` as a 200 JSON body
    pub fn json<T: Serialize + ?Sized>(&self, data: &T) -> Response {
        match self.encode(data) {
            Ok(body) => (StatusCode::OK, [(CONTENT_TYPE, "application/json")], body).into_response(),
            Err(err) => self.fail(Error::wrap(err.into(), "could not write json response")),
        }
    }

    fn encode<T: Serialize + ?Sized>(&self, data: &T) -> serde_json::Result<Vec<u8>> {
        if !self.flags.pretty {
            return serde_json::to_vec(data);
        }

        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
        data.serialize(&mut ser)?;
        Ok(buf)
    }
}

/// Build an error from a format string and write it with [`Resp::fail`].
///
/// `failf!(resp, "no user {}", id)` or, wrapping a cause,
/// `failf!(resp, err => "could not load user {}", id)`.
#[macro_export]
macro_rules! failf {
    ($resp:expr, $parent:expr => $($arg:tt)+) => {
        $resp.failf_wrap($parent, format_args!($($arg)+))
    };
    ($resp:expr, $($arg:tt)+) => {
        $resp.failf(format_args!($($arg)+))
    };
}
