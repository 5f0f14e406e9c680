//! Turns domain errors and panics into GraphQL errors with `extensions.codes`

use async_graphql::{
    Context, ErrorExtensionValues, ObjectType, Request, Response, Schema, ServerError,
    SubscriptionType, Value,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::error;

use crate::api::middleware::RequestFlags;
use crate::errors::classify::codes;
use crate::errors::codes::INTERNAL_SERVER_ERROR;
use crate::errors::{caller, classify, Error, Fault};
use crate::metrics::registry::{ERRORS_PRESENTED_TOTAL, PANICS_RECOVERED_TOTAL};

/// Message for server faults outside debug mode
pub const SERVICE_UNAVAILABLE: &str = "service unavailable";

fn codes_extension<I: IntoIterator<Item = String>>(codes: I) -> ErrorExtensionValues {
    let mut extensions = ErrorExtensionValues::default();
    extensions.set(
        "codes",
        Value::List(codes.into_iter().map(Value::String).collect()),
    );
    extensions
}

fn unavailable() -> (String, Vec<String>) {
    (
        SERVICE_UNAVAILABLE.to_string(),
        vec![INTERNAL_SERVER_ERROR.to_string()],
    )
}

fn message_and_codes(err: &Error, debug: bool) -> (String, Vec<String>) {
    let fault = classify(err).fault;
    ERRORS_PRESENTED_TOTAL
        .with_label_values(&["graphql", fault.as_str()])
        .inc();

    if fault == Fault::Server {
        error!(error = %err, file = %caller(), "GraphQL request failed");
    }

    let codes = codes(err);
    if codes.is_empty() {
        return unavailable();
    }

    let message = if fault == Fault::Server && !debug {
        SERVICE_UNAVAILABLE.to_string()
    } else {
        err.to_string()
    };
    (message, codes)
}

/// Convert a domain error into a resolver error
pub fn present(err: &Error, debug: bool) -> async_graphql::Error {
    let (message, codes) = message_and_codes(err, debug);
    let mut gql = async_graphql::Error::new(message);
    gql.extensions = Some(codes_extension(codes));
    gql
}

/// Whether the current request asked for unredacted errors
pub fn debug_enabled(ctx: &Context<'_>) -> bool {
    ctx.data_opt::<RequestFlags>()
        .map_or(false, |flags| flags.debug)
}

/// `.present(ctx)` on domain results inside resolvers
pub trait PresentExt<T> {
    fn present(self, ctx: &Context<'_>) -> async_graphql::Result<T>;
}

impl<T> PresentExt<T> for crate::errors::Result<T> {
    fn present(self, ctx: &Context<'_>) -> async_graphql::Result<T> {
        self.map_err(|err| present(&err, debug_enabled(ctx)))
    }
}

/// A whole-request failure, before or outside execution
pub fn error_response(err: &Error, debug: bool) -> Response {
    let (message, codes) = message_and_codes(err, debug);
    let mut server_error = ServerError::new(message, None);
    server_error.extensions = Some(codes_extension(codes));
    Response::from_errors(vec![server_error])
}

/// Execute `request`, recovering panics raised by resolvers.
///
/// A panic never leaks its payload: the response carries a single
/// `service unavailable` error.
pub async fn execute<Q, M, S>(schema: &Schema<Q, M, S>, request: Request) -> Response
where
    Q: ObjectType + 'static,
    M: ObjectType + 'static,
    S: SubscriptionType + 'static,
{
    match AssertUnwindSafe(schema.execute(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            PANICS_RECOVERED_TOTAL.with_label_values(&["graphql"]).inc();
            ERRORS_PRESENTED_TOTAL
                .with_label_values(&["graphql", Fault::Server.as_str()])
                .inc();

            let err = Error::from_panic(&*payload);
            error!(error = %err, file = %caller(), "GraphQL execution panicked");

            let (message, codes) = unavailable();
            let mut server_error = ServerError::new(message, None);
            server_error.extensions = Some(codes_extension(codes));
            Response::from_errors(vec![server_error])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{add_code, ERR_NOT_FOUND};
    use serde_json::json;

    fn to_json(err: async_graphql::Error) -> serde_json::Value {
        let mut server_error = ServerError::new(err.message, None);
        server_error.extensions = err.extensions;
        serde_json::to_value(server_error).unwrap()
    }

    #[test]
    fn test_client_fault_keeps_message_and_codes() {
        let value = to_json(present(&ERR_NOT_FOUND, false));
        assert_eq!(value["message"], "not found");
        assert_eq!(value["extensions"]["codes"], json!(["BAD_REQUEST", "NOT_FOUND"]));
    }

    #[test]
    fn test_uncoded_error_is_service_unavailable() {
        for debug in [false, true] {
            let value = to_json(present(&Error::msg("db timeout"), debug));
            assert_eq!(value["message"], SERVICE_UNAVAILABLE);
            assert_eq!(value["extensions"]["codes"], json!(["INTERNAL_SERVER_ERROR"]));
        }
    }

    #[test]
    fn test_coded_server_fault_redacted_unless_debug() {
        let err = add_code(Some(Error::msg("disk full")), "STORAGE");

        let value = to_json(present(&err, false));
        assert_eq!(value["message"], SERVICE_UNAVAILABLE);
        assert_eq!(value["extensions"]["codes"], json!(["STORAGE"]));

        let value = to_json(present(&err, true));
        assert_eq!(value["message"], "disk full");
    }

    struct PanickingQuery;

    #[async_graphql::Object]
    impl PanickingQuery {
        async fn boom(&self) -> i32 {
            panic!("secret state")
        }
    }

    #[tokio::test]
    async fn test_execute_recovers_panics() {
        let schema = Schema::new(
            PanickingQuery,
            async_graphql::EmptyMutation,
            async_graphql::EmptySubscription,
        );

        let response = execute(&schema, Request::new("{ boom }")).await;
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["errors"].as_array().unwrap().len(), 1);
        assert_eq!(value["errors"][0]["message"], SERVICE_UNAVAILABLE);
        assert_eq!(
            value["errors"][0]["extensions"]["codes"],
            json!(["INTERNAL_SERVER_ERROR"])
        );
        assert!(!value.to_string().contains("secret state"));
    }

    #[test]
    fn test_error_response_shape() {
        let response = error_response(&ERR_NOT_FOUND, false);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["errors"][0]["message"], "not found");
        assert_eq!(
            value["errors"][0]["extensions"]["codes"],
            json!(["BAD_REQUEST", "NOT_FOUND"])
        );
    }
}
