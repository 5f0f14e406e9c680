use axum::response::Response;
use std::any::Any;

use crate::api::response::Resp;
use crate::errors::Error;
use crate::metrics::registry::PANICS_RECOVERED_TOTAL;

/// `CatchPanicLayer` handler turning a panic into a generic 500 envelope.
///
/// The stack is written by the panic hook, not here.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    PANICS_RECOVERED_TOTAL.with_label_values(&["rest"]).inc();
    Resp::default().fail(Error::from_panic(&*payload))
}
