//! User API handlers.
//!
//! ```text
//! POST   /users          registration (no session required)
//! POST   /login          credential login, establishes the session
//! GET    /users/{id}
//! PUT    /users/{id}
//! DELETE /users/{id}     cascades deletion of owned skills
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::ports::UserDeletion;
use crate::domain::{
    CredentialsValidationError, Error, LoginCredentials, ProfilePatch, User, UserValidationError,
    Username,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::skills::SkillBody;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{non_empty, parse_identity};

/// Request body for registration and login.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

impl TryFrom<CredentialsRequest> for LoginCredentials {
    type Error = CredentialsValidationError;

    fn try_from(value: CredentialsRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

fn map_credentials_validation_error(err: CredentialsValidationError) -> Error {
    match err {
        CredentialsValidationError::EmptyUsername => {
            Error::invalid_request("username must not be empty")
                .with_details(json!({ "field": "username", "code": "empty_username" }))
        }
        CredentialsValidationError::EmptyPassword => {
            Error::invalid_request("password must not be empty")
                .with_details(json!({ "field": "password", "code": "empty_password" }))
        }
    }
}

fn map_username_validation_error(err: UserValidationError) -> Error {
    Error::invalid_request(err.to_string())
        .with_details(json!({ "field": "username", "code": "invalid_username" }))
}

/// Response body for `POST /login`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Authenticated caller's identity in hex.
    pub id: String,
}

/// User payload returned by the API. The password hash never leaves the
/// service.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    pub id: String,
    pub username: String,
    pub roles: Vec<String>,
    /// Embedded skill snapshots in insertion order.
    pub skills: Vec<SkillBody>,
    pub revision: u32,
}

impl From<User> for UserBody {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_hex(),
            username: user.username.into(),
            roles: user.roles,
            skills: user.skills.into_iter().map(SkillBody::from).collect(),
            revision: user.revision,
        }
    }
}

/// Request body for `PUT /users/{id}`; empty fields are left unchanged.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUserRequest {
    pub username: String,
    pub password: String,
}

/// Response body for `DELETE /users/{id}`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDeletionBody {
    /// Skill records the cascade failed to delete; empty on a clean delete.
    pub failed_skill_deletes: Vec<String>,
}

impl From<UserDeletion> for UserDeletionBody {
    fn from(outcome: UserDeletion) -> Self {
        Self {
            failed_skill_deletes: outcome
                .failed_skill_deletes
                .into_iter()
                .map(|id| id.to_hex())
                .collect(),
        }
    }
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/users",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Account created", body = UserBody),
        (status = 400, description = "Empty or invalid username/password, or duplicate username", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/users")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<HttpResponse> {
    let credentials = LoginCredentials::try_from(payload.into_inner())
        .map_err(map_credentials_validation_error)?;
    let user = state.accounts.register(&credentials).await?;
    Ok(HttpResponse::Created().json(UserBody::from(user)))
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let credentials = LoginCredentials::try_from(payload.into_inner())
        .map_err(map_credentials_validation_error)?;
    let id = state.accounts.authenticate(&credentials).await?;
    session.persist_identity(&id)?;
    Ok(web::Json(LoginResponse { id: id.to_hex() }))
}

/// Fetch a user with embedded skills.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User identity (hex)")),
    responses(
        (status = 200, description = "User found", body = UserBody),
        (status = 400, description = "Malformed identity", body = Error),
        (status = 401, description = "Unauthenticated", body = Error),
        (status = 403, description = "Not the account owner", body = Error),
        (status = 404, description = "User not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserBody>> {
    let caller = session.require_identity()?;
    let target = parse_identity(&path)?;
    state.accounts.authorize(&caller, &target)?;

    let user = state.accounts.get_user(&target).await?;
    Ok(web::Json(UserBody::from(user)))
}

/// Partially update a profile; empty fields keep their current values.
#[utoipa::path(
    put,
    path = "/users/{id}",
    request_body = UpdateUserRequest,
    params(("id" = String, Path, description = "User identity (hex)")),
    responses(
        (status = 200, description = "Profile updated", body = UserBody),
        (status = 400, description = "Malformed identity or invalid username", body = Error),
        (status = 401, description = "Unauthenticated", body = Error),
        (status = 403, description = "Not the account owner", body = Error),
        (status = 404, description = "User not found", body = Error),
        (status = 409, description = "Stale write", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<UserBody>> {
    let caller = session.require_identity()?;
    let target = parse_identity(&path)?;
    state.accounts.authorize(&caller, &target)?;

    let UpdateUserRequest { username, password } = payload.into_inner();
    let patch = ProfilePatch {
        username: match non_empty(username) {
            Some(raw) => Some(Username::new(&raw).map_err(map_username_validation_error)?),
            None => None,
        },
        password: non_empty(password),
    };
    let user = state.accounts.update_profile(&target, &patch).await?;
    Ok(web::Json(UserBody::from(user)))
}

/// Delete an account and cascade-delete its owned skills.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User identity (hex)")),
    responses(
        (status = 200, description = "User deleted; body lists any skills the cascade missed",
            body = UserDeletionBody),
        (status = 400, description = "Malformed identity", body = Error),
        (status = 401, description = "Unauthenticated", body = Error),
        (status = 403, description = "Not the account owner", body = Error),
        (status = 404, description = "User not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserDeletionBody>> {
    let caller = session.require_identity()?;
    let target = parse_identity(&path)?;
    state.accounts.authorize(&caller, &target)?;

    let outcome = state.skills.delete_user(&target).await?;
    Ok(web::Json(UserDeletionBody::from(outcome)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;

    use crate::inbound::http::test_utils::{
        login_cookie, memory_http_state, register_user, test_session_middleware,
    };

    fn test_app(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(state))
            .wrap(test_session_middleware())
            .service(register)
            .service(login)
            .service(get_user)
            .service(update_user)
            .service(delete_user)
    }

    #[actix_web::test]
    async fn register_returns_the_created_user_without_the_hash() {
        let app = actix_test::init_service(test_app(memory_http_state())).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/users")
                .set_json(serde_json::json!({ "username": "alice", "password": "secret" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["username"], "alice");
        assert_eq!(body["roles"], serde_json::json!(["standard"]));
        assert_eq!(body["skills"], serde_json::json!([]));
        assert!(body.get("passwordHash").is_none());
        assert!(body.get("password").is_none());
    }

    #[rstest]
    #[case("", "secret", "empty_username")]
    #[case("alice", "", "empty_password")]
    #[actix_web::test]
    async fn register_rejects_blank_fields(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected_code: &str,
    ) {
        let app = actix_test::init_service(test_app(memory_http_state())).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/users")
                .set_json(serde_json::json!({ "username": username, "password": password }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["code"], expected_code);
    }

    #[actix_web::test]
    async fn register_rejects_duplicate_usernames() {
        let app = actix_test::init_service(test_app(memory_http_state())).await;
        let _ = register_user(&app, "alice", "secret").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/users")
                .set_json(serde_json::json!({ "username": "alice", "password": "other" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["code"], "duplicate_username");
    }

    #[actix_web::test]
    async fn login_rejects_wrong_credentials() {
        let app = actix_test::init_service(test_app(memory_http_state())).await;
        let _ = register_user(&app, "alice", "secret").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/login")
                .set_json(serde_json::json!({ "username": "alice", "password": "wrong" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["code"], "unauthorized");
        assert_eq!(body["message"], "invalid credentials");
    }

    #[actix_web::test]
    async fn get_user_requires_a_session() {
        let app = actix_test::init_service(test_app(memory_http_state())).await;
        let id = register_user(&app, "alice", "secret").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/users/{id}"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn get_user_denies_other_accounts() {
        let app = actix_test::init_service(test_app(memory_http_state())).await;
        let alice = register_user(&app, "alice", "secret").await;
        let _bob = register_user(&app, "bob", "hunter2").await;
        let bob_cookie = login_cookie(&app, "bob", "hunter2").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/users/{alice}"))
                .cookie(bob_cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn update_user_ignores_empty_fields() {
        let app = actix_test::init_service(test_app(memory_http_state())).await;
        let id = register_user(&app, "alice", "secret").await;
        let cookie = login_cookie(&app, "alice", "secret").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/users/{id}"))
                .cookie(cookie.clone())
                .set_json(serde_json::json!({ "username": "", "password": "" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["username"], "alice");
        assert_eq!(body["revision"], 1);

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/users/{id}"))
                .cookie(cookie)
                .set_json(serde_json::json!({ "username": "alice2" }))
                .to_request(),
        )
        .await;
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["username"], "alice2");
        assert_eq!(body["revision"], 2);
    }

    #[actix_web::test]
    async fn delete_user_reports_a_clean_cascade() {
        let app = actix_test::init_service(test_app(memory_http_state())).await;
        let id = register_user(&app, "alice", "secret").await;
        let cookie = login_cookie(&app, "alice", "secret").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/users/{id}"))
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["failedSkillDeletes"], serde_json::json!([]));

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/users/{id}"))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
