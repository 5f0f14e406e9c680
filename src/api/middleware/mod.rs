pub mod auth;
pub mod flags;
pub mod logging;
pub mod panic;

pub use auth::auth_middleware;
pub use flags::{flags_middleware, RequestFlags};
pub use logging::logging_middleware;
pub use panic::handle_panic;
