use axum::{
    extract::{Query, Request},
    http::Uri,
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;

/// Per-request presentation switches taken from the query string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFlags {
    /// Show server fault messages instead of the generic text
    pub debug: bool,
    /// Indent JSON bodies
    pub pretty: bool,
}

impl RequestFlags {
    /// A flag is set when its decoded key is present, whatever the value
    /// (`?debug`, `?debug=1`, `?%64ebug`)
    pub fn from_uri(uri: &Uri) -> Self {
        let Ok(Query(params)) = Query::<HashMap<String, String>>::try_from_uri(uri) else {
            return Self::default();
        };

        Self {
            debug: params.contains_key("debug"),
            pretty: params.contains_key("pretty"),
        }
    }
}

/// Store the request flags in the request extensions
pub async fn flags_middleware(mut request: Request, next: Next) -> Response {
    let flags = RequestFlags::from_uri(request.uri());
    request.extensions_mut().insert(flags);
    next.run(request).await
}
