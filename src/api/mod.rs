pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod response;
pub mod routes;

pub use handlers::{AppState, AppStateInner};
pub use response::Resp;
pub use routes::create_router;
