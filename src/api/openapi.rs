use utoipa::OpenApi;

use crate::api::handlers::{
    AddEmailRequest, AddUserRequest, EmailIdResponse, EmailsResponse, LoginRequest,
    LoginResponse, UserIdResponse, UserResponse, UsersResponse,
};
use crate::api::response::{ErrorDetail, ErrorResponse};
use crate::models::{Email, User};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Boiler",
        version = "0.1.0",
        description = "Users and email addresses over REST and GraphQL. Client errors carry stable codes in `error.codes`; add `?debug` to see server error messages and `?pretty` to indent responses.",
    ),
    paths(
        crate::api::handlers::health,
        crate::api::handlers::list_users,
        crate::api::handlers::add_user,
        crate::api::handlers::get_user,
        crate::api::handlers::delete_user,
        crate::api::handlers::login,
        crate::api::handlers::list_emails,
        crate::api::handlers::add_email,
        crate::api::handlers::delete_email,
    ),
    components(
        schemas(
            User,
            Email,
            AddUserRequest,
            UserIdResponse,
            UserResponse,
            UsersResponse,
            LoginRequest,
            LoginResponse,
            AddEmailRequest,
            EmailIdResponse,
            EmailsResponse,
            ErrorResponse,
            ErrorDetail,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "User management and authentication"),
        (name = "emails", description = "Email addresses owned by users"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_rest_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for path in ["/health", "/rest/users", "/rest/users/{id}", "/rest/users/login", "/rest/emails", "/rest/emails/{id}"] {
            assert!(paths.iter().any(|p| p.as_str() == path), "missing {}", path);
        }
    }
}
