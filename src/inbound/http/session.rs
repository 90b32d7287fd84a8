//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Wraps the Actix session so handlers deal only in domain identities: the
//! authenticated caller's identity is stored in the cookie as hex text.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, Identity};

pub(crate) const IDENTITY_KEY: &str = "identity";

/// Newtype wrapper exposing higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated caller's identity in the session cookie.
    pub fn persist_identity(&self, id: &Identity) -> Result<(), Error> {
        self.0
            .insert(IDENTITY_KEY, id.to_hex())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the caller's identity from the session, if present.
    pub fn identity(&self) -> Result<Option<Identity>, Error> {
        let raw = self
            .0
            .get::<String>(IDENTITY_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        match raw {
            Some(text) => match Identity::parse(&text) {
                Ok(id) => Ok(Some(id)),
                Err(error) => {
                    tracing::warn!("invalid identity in session cookie: {error}");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Require an authenticated caller or return `401 Unauthorized`.
    pub fn require_identity(&self) -> Result<Identity, Error> {
        self.identity()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
