//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] aggregates every HTTP endpoint and the schemas their request
//! and response bodies reference. The generated document backs Swagger UI in
//! debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, FieldViolation, User, VoteDirection, VoteReceipt};
use crate::inbound::http::posts::{FeedPost, FeedResponse, PostInput, PostResponse};
use crate::inbound::http::users::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RegisterRequest,
};
use crate::inbound::http::votes::VoteRequest;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login or /api/v1/register.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Neoreddit backend API",
        description = "HTTP interface for accounts, posts, votes, and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::me,
        crate::inbound::http::users::forgot_password,
        crate::inbound::http::users::change_password,
        crate::inbound::http::posts::feed,
        crate::inbound::http::posts::get_post,
        crate::inbound::http::posts::create_post,
        crate::inbound::http::posts::update_post,
        crate::inbound::http::posts::delete_post,
        crate::inbound::http::votes::cast_vote,
        crate::inbound::http::votes::retract_vote,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        User,
        Error,
        ErrorCode,
        FieldViolation,
        RegisterRequest,
        LoginRequest,
        ForgotPasswordRequest,
        ChangePasswordRequest,
        PostInput,
        PostResponse,
        FeedPost,
        FeedResponse,
        VoteRequest,
        VoteDirection,
        VoteReceipt,
    )),
    tags(
        (name = "users", description = "Account registration, sessions, and password resets"),
        (name = "posts", description = "Text posts and the paginated feed"),
        (name = "votes", description = "Up and down votes on posts"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn error_schema_has_envelope_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
    }

    #[test]
    fn user_schema_has_account_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let user_schema = schemas.get("User").expect("User schema");

        assert_object_schema_has_field(user_schema, "id");
        assert_object_schema_has_field(user_schema, "username");
        assert_object_schema_has_field(user_schema, "email");
    }

    #[test]
    fn every_endpoint_is_registered() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/register",
            "/api/v1/login",
            "/api/v1/logout",
            "/api/v1/me",
            "/api/v1/forgot-password",
            "/api/v1/change-password",
            "/api/v1/posts",
            "/api/v1/posts/{id}",
            "/api/v1/posts/{id}/vote",
            "/health/ready",
            "/health/live",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "document should describe {path}"
            );
        }
    }
}
