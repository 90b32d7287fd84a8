//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test;

use crate::domain::{AccountServiceImpl, SkillServiceImpl};
use crate::inbound::http::state::HttpState;
use crate::outbound::persistence::{MemorySkillStore, MemoryUserStore};
use crate::outbound::security::BcryptPasswordHasher;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Handler state over in-memory stores. Hashing uses the minimum bcrypt cost
/// to keep tests fast.
pub fn memory_http_state() -> HttpState {
    let users = Arc::new(MemoryUserStore::default());
    let skills = Arc::new(MemorySkillStore::default());
    let hasher = Arc::new(BcryptPasswordHasher::with_cost(4));
    HttpState::new(
        Arc::new(AccountServiceImpl::new(users.clone(), hasher)),
        Arc::new(SkillServiceImpl::new(users, skills)),
    )
}

/// Register an account through the API and return its identity in hex.
pub async fn register_user<S, B>(app: &S, username: &str, password: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/users")
            .set_json(serde_json::json!({ "username": username, "password": password }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(res).await;
    body["id"].as_str().expect("user id").to_owned()
}

/// Log in through the API and return the session cookie.
pub async fn login_cookie<S, B>(app: &S, username: &str, password: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/login")
            .set_json(serde_json::json!({ "username": username, "password": password }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}
