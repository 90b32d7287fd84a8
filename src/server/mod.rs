//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::warn;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::ports::{SkillStore, UserStore};
use crate::domain::{AccountServiceImpl, SkillServiceImpl};
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{skills, users};
use crate::middleware::Trace;
use crate::outbound::persistence::{
    DieselSkillStore, DieselUserStore, MemorySkillStore, MemoryUserStore,
};
use crate::outbound::security::BcryptPasswordHasher;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Wire the two domain services over a pair of store adapters.
fn wire_state<U, S>(user_store: Arc<U>, skill_store: Arc<S>) -> HttpState
where
    U: UserStore + 'static,
    S: SkillStore + 'static,
{
    let hasher = Arc::new(BcryptPasswordHasher::default());
    HttpState::new(
        Arc::new(AccountServiceImpl::new(user_store.clone(), hasher)),
        Arc::new(SkillServiceImpl::new(user_store, skill_store)),
    )
}

/// Build the handler state: Diesel-backed when a pool is configured,
/// in-memory otherwise.
fn build_http_state(config: &ServerConfig) -> HttpState {
    match &config.db_pool {
        Some(pool) => wire_state(
            Arc::new(DieselUserStore::new(pool.clone())),
            Arc::new(DieselSkillStore::new(pool.clone())),
        ),
        None => {
            warn!("no database configured; records will not survive a restart");
            wire_state(
                Arc::new(MemoryUserStore::default()),
                Arc::new(MemorySkillStore::default()),
            )
        }
    }
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(session)
        .wrap(Trace)
        .service(users::register)
        .service(users::login)
        .service(users::get_user)
        .service(users::update_user)
        .service(users::delete_user)
        .service(skills::add_skill)
        .service(skills::list_skills)
        .service(skills::update_skill)
        .service(skills::remove_skill)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server from the provided configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let http_state = web::Data::new(build_http_state(&config));
    let server_health_state = health_state.clone();
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        db_pool: _,
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
