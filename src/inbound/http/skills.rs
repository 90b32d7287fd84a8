//! Skill API handlers.
//!
//! ```text
//! POST   /users/{id}/skills
//! GET    /users/{id}/skills
//! PUT    /users/{id}/skills/{skillId}
//! DELETE /users/{id}/skills/{skillId}
//! ```
//!
//! Every route requires an authenticated session whose identity equals the
//! `{id}` segment; all mutations go through the coordinating skill service.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{Error, Skill, SkillDraft, SkillPatch, SkillValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{non_empty, parse_identity};

/// Skill payload returned by the API; also embedded in user bodies.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkillBody {
    #[schema(example = "64ddf3a1c2b4a50001a3b001")]
    pub id: String,
    #[schema(example = "Go")]
    pub name: String,
    #[schema(example = "expert")]
    pub proficiency: String,
}

impl From<Skill> for SkillBody {
    fn from(skill: Skill) -> Self {
        Self {
            id: skill.id.to_hex(),
            name: skill.name,
            proficiency: skill.proficiency,
        }
    }
}

/// Request body for `POST /users/{id}/skills`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequest {
    pub name: String,
    #[serde(default)]
    pub proficiency: String,
}

/// Request body for `PUT /users/{id}/skills/{skillId}`; empty fields are
/// left unchanged.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillPatchRequest {
    pub name: String,
    pub proficiency: String,
}

fn map_skill_validation_error(err: SkillValidationError) -> Error {
    match err {
        SkillValidationError::EmptyName => Error::invalid_request("skill name must not be empty")
            .with_details(json!({ "field": "name", "code": "empty_name" })),
    }
}

/// Create a skill owned by the authenticated user.
#[utoipa::path(
    post,
    path = "/users/{id}/skills",
    request_body = SkillRequest,
    params(("id" = String, Path, description = "Owning user identity (hex)")),
    responses(
        (status = 201, description = "Skill created", body = SkillBody),
        (status = 400, description = "Invalid user id, blank name, or duplicate skill name", body = Error),
        (status = 401, description = "Unauthenticated", body = Error),
        (status = 403, description = "Not the account owner", body = Error),
        (status = 404, description = "User not found", body = Error),
        (status = 500, description = "Partial write or internal error", body = Error)
    ),
    tags = ["skills"],
    operation_id = "addSkill"
)]
#[post("/users/{id}/skills")]
pub async fn add_skill(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<SkillRequest>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_identity()?;
    let target = parse_identity(&path)?;
    state.accounts.authorize(&caller, &target)?;

    let SkillRequest { name, proficiency } = payload.into_inner();
    let draft = SkillDraft::try_new(name, proficiency).map_err(map_skill_validation_error)?;
    let created = state.skills.add_skill(&target, &draft).await?;
    Ok(HttpResponse::Created().json(SkillBody::from(created)))
}

/// List the authenticated user's skills in insertion order.
#[utoipa::path(
    get,
    path = "/users/{id}/skills",
    params(("id" = String, Path, description = "Owning user identity (hex)")),
    responses(
        (status = 200, description = "Ordered embedded skills", body = [SkillBody]),
        (status = 400, description = "Malformed identity", body = Error),
        (status = 401, description = "Unauthenticated", body = Error),
        (status = 403, description = "Not the account owner", body = Error),
        (status = 404, description = "User not found", body = Error)
    ),
    tags = ["skills"],
    operation_id = "listSkills"
)]
#[get("/users/{id}/skills")]
pub async fn list_skills(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<SkillBody>>> {
    let caller = session.require_identity()?;
    let target = parse_identity(&path)?;
    state.accounts.authorize(&caller, &target)?;

    let skills = state.skills.skills_for_user(&target).await?;
    Ok(web::Json(skills.into_iter().map(SkillBody::from).collect()))
}

/// Patch a skill; empty fields keep their current values.
#[utoipa::path(
    put,
    path = "/users/{id}/skills/{skillId}",
    request_body = SkillPatchRequest,
    params(
        ("id" = String, Path, description = "Owning user identity (hex)"),
        ("skillId" = String, Path, description = "Skill identity (hex)")
    ),
    responses(
        (status = 200, description = "Skill updated", body = SkillBody),
        (status = 400, description = "Malformed identity", body = Error),
        (status = 401, description = "Unauthenticated", body = Error),
        (status = 403, description = "Not the account owner", body = Error),
        (status = 404, description = "Skill not owned by this user", body = Error),
        (status = 409, description = "Duplicate name or stale write", body = Error),
        (status = 500, description = "Partial write or internal error", body = Error)
    ),
    tags = ["skills"],
    operation_id = "updateSkill"
)]
#[put("/users/{id}/skills/{skill_id}")]
pub async fn update_skill(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
    payload: web::Json<SkillPatchRequest>,
) -> ApiResult<web::Json<SkillBody>> {
    let caller = session.require_identity()?;
    let (user_raw, skill_raw) = path.into_inner();
    let target = parse_identity(&user_raw)?;
    let skill_id = parse_identity(&skill_raw)?;
    state.accounts.authorize(&caller, &target)?;

    let SkillPatchRequest { name, proficiency } = payload.into_inner();
    let patch = SkillPatch {
        name: non_empty(name),
        proficiency: non_empty(proficiency),
    };
    let updated = state.skills.update_skill(&target, &skill_id, &patch).await?;
    Ok(web::Json(SkillBody::from(updated)))
}

/// Delete a skill from both representations.
#[utoipa::path(
    delete,
    path = "/users/{id}/skills/{skillId}",
    params(
        ("id" = String, Path, description = "Owning user identity (hex)"),
        ("skillId" = String, Path, description = "Skill identity (hex)")
    ),
    responses(
        (status = 200, description = "Skill deleted"),
        (status = 400, description = "Malformed identity", body = Error),
        (status = 401, description = "Unauthenticated", body = Error),
        (status = 403, description = "Not the account owner", body = Error),
        (status = 404, description = "Skill not owned by this user", body = Error),
        (status = 500, description = "Partial write or internal error", body = Error)
    ),
    tags = ["skills"],
    operation_id = "removeSkill"
)]
#[delete("/users/{id}/skills/{skill_id}")]
pub async fn remove_skill(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_identity()?;
    let (user_raw, skill_raw) = path.into_inner();
    let target = parse_identity(&user_raw)?;
    let skill_id = parse_identity(&skill_raw)?;
    state.accounts.authorize(&caller, &target)?;

    state.skills.remove_skill(&target, &skill_id).await?;
    Ok(HttpResponse::Ok().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use serde_json::Value;

    use crate::inbound::http::test_utils::{
        login_cookie, memory_http_state, register_user, test_session_middleware,
    };
    use crate::inbound::http::users;

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
            .service(users::register)
            .service(users::login)
            .service(add_skill)
            .service(list_skills)
            .service(update_skill)
            .service(remove_skill)
    }

    #[actix_web::test]
    async fn skills_round_trip_through_the_api() {
        let app = actix_test::init_service(test_app(memory_http_state())).await;
        let user_id = register_user(&app, "alice", "secret").await;
        let cookie = login_cookie(&app, "alice", "secret").await;

        let create = actix_test::TestRequest::post()
            .uri(&format!("/users/{user_id}/skills"))
            .cookie(cookie.clone())
            .set_json(serde_json::json!({ "name": "Go", "proficiency": "expert" }))
            .to_request();
        let created = actix_test::call_service(&app, create).await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let created: Value = actix_test::read_body_json(created).await;
        let skill_id = created["id"].as_str().expect("skill id").to_owned();

        let listed: Value = actix_test::read_body_json(
            actix_test::call_service(
                &app,
                actix_test::TestRequest::get()
                    .uri(&format!("/users/{user_id}/skills"))
                    .cookie(cookie.clone())
                    .to_request(),
            )
            .await,
        )
        .await;
        assert_eq!(listed[0]["name"], "Go");
        assert_eq!(listed[0]["id"], skill_id.as_str());

        let patch = actix_test::TestRequest::put()
            .uri(&format!("/users/{user_id}/skills/{skill_id}"))
            .cookie(cookie.clone())
            .set_json(serde_json::json!({ "name": "", "proficiency": "intermediate" }))
            .to_request();
        let patched: Value =
            actix_test::read_body_json(actix_test::call_service(&app, patch).await).await;
        assert_eq!(patched["name"], "Go");
        assert_eq!(patched["proficiency"], "intermediate");

        let removed = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/users/{user_id}/skills/{skill_id}"))
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(removed.status(), StatusCode::OK);

        let empty: Value = actix_test::read_body_json(
            actix_test::call_service(
                &app,
                actix_test::TestRequest::get()
                    .uri(&format!("/users/{user_id}/skills"))
                    .cookie(cookie)
                    .to_request(),
            )
            .await,
        )
        .await;
        assert_eq!(empty.as_array().expect("array").len(), 0);
    }

    #[actix_web::test]
    async fn cross_user_skill_access_is_forbidden() {
        let app = actix_test::init_service(test_app(memory_http_state())).await;
        let alice = register_user(&app, "alice", "secret").await;
        let _bob = register_user(&app, "bob", "hunter2").await;
        let bob_cookie = login_cookie(&app, "bob", "hunter2").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/users/{alice}/skills"))
                .cookie(bob_cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn duplicate_skill_names_are_rejected_with_400() {
        let app = actix_test::init_service(test_app(memory_http_state())).await;
        let user_id = register_user(&app, "alice", "secret").await;
        let cookie = login_cookie(&app, "alice", "secret").await;

        for expected in [StatusCode::CREATED, StatusCode::BAD_REQUEST] {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri(&format!("/users/{user_id}/skills"))
                    .cookie(cookie.clone())
                    .set_json(serde_json::json!({ "name": "Go", "proficiency": "expert" }))
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), expected);
        }
    }

    #[actix_web::test]
    async fn malformed_identities_fail_with_400() {
        let app = actix_test::init_service(test_app(memory_http_state())).await;
        let _ = register_user(&app, "alice", "secret").await;
        let cookie = login_cookie(&app, "alice", "secret").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/users/not-an-id/skills")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["code"], "invalid_identity");
    }

    #[actix_web::test]
    async fn unauthenticated_requests_are_rejected() {
        let app = actix_test::init_service(test_app(memory_http_state())).await;
        let user_id = register_user(&app, "alice", "secret").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/users/{user_id}/skills"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
