//! OpenAPI documentation configuration.
//!
//! Generates the specification served by Swagger UI in debug builds:
//! every REST endpoint, the request/response schemas, and the session
//! cookie security scheme.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::skills::{SkillBody, SkillPatchRequest, SkillRequest};
use crate::inbound::http::users::{
    CredentialsRequest, LoginResponse, UpdateUserRequest, UserBody, UserDeletionBody,
};

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
                "Session cookie issued by POST /login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Skill tracker API",
        description = "Session-authenticated CRUD over users and their skills."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::skills::add_skill,
        crate::inbound::http::skills::list_skills,
        crate::inbound::http::skills::update_skill,
        crate::inbound::http::skills::remove_skill,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        CredentialsRequest,
        LoginResponse,
        UserBody,
        UpdateUserRequest,
        UserDeletionBody,
        SkillBody,
        SkillRequest,
        SkillPatchRequest,
    ))
)]
pub struct ApiDoc;
