//! Driving port for account use-cases.
//!
//! Inbound adapters authenticate, authorize, and manage profiles through
//! this trait without knowing the backing stores, which keeps handler tests
//! free of persistence wiring.

use async_trait::async_trait;

use crate::domain::auth::LoginCredentials;
use crate::domain::error::Error;
use crate::domain::identity::Identity;
use crate::domain::user::{ProfilePatch, User};

/// Domain use-case port for registration, authentication, and profiles.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create an account: hash the password, assign the default role set,
    /// and persist. Fails with `invalid_request` on a duplicate username.
    async fn register(&self, credentials: &LoginCredentials) -> Result<User, Error>;

    /// Validate credentials and return the authenticated identity. Unknown
    /// usernames and wrong passwords fail identically with `unauthorized`.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<Identity, Error>;

    /// Owner-only access check: fails with `forbidden` unless the caller is
    /// the target. There is no elevated role.
    fn authorize(&self, caller: &Identity, target: &Identity) -> Result<(), Error>;

    /// Fetch a user with its embedded skill cache.
    async fn get_user(&self, id: &Identity) -> Result<User, Error>;

    /// Apply a partial profile update; a new password is re-hashed before
    /// storage. The write is revision-checked.
    async fn update_profile(&self, id: &Identity, patch: &ProfilePatch) -> Result<User, Error>;
}
