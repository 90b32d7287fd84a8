//! Account domain service: registration, credential authentication,
//! owner-only authorization, and profile maintenance.
//!
//! Password hashing is a capability injected at construction; verification
//! happens here during authentication and nowhere else.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::auth::LoginCredentials;
use crate::domain::error::Error;
use crate::domain::identity::Identity;
use crate::domain::ports::{
    AccountService, PasswordHashError, PasswordHasher, UserStore, UserStoreError,
};
use crate::domain::user::{NewUser, ProfilePatch, User, UserValidationError, Username};

/// Account service implementing the driving port.
#[derive(Clone)]
pub struct AccountServiceImpl<U, H> {
    users: Arc<U>,
    hasher: Arc<H>,
}

impl<U, H> AccountServiceImpl<U, H> {
    /// Create a new service over a user store and a hashing capability.
    pub fn new(users: Arc<U>, hasher: Arc<H>) -> Self {
        Self { users, hasher }
    }
}

impl<U, H> AccountServiceImpl<U, H>
where
    U: UserStore,
    H: PasswordHasher,
{
    fn map_store_error(error: UserStoreError) -> Error {
        match error {
            UserStoreError::Connection { message } => {
                Error::service_unavailable(format!("user store unavailable: {message}"))
            }
            UserStoreError::Query { message } => {
                Error::internal(format!("user store error: {message}"))
            }
            UserStoreError::NotFound => Error::not_found("user not found"),
            UserStoreError::DuplicateUsername => {
                Error::invalid_request("username already registered")
                    .with_details(json!({ "field": "username", "code": "duplicate_username" }))
            }
            UserStoreError::StaleRevision { expected, actual } => {
                stale_write(expected, actual)
            }
        }
    }

    fn map_hash_error(error: PasswordHashError) -> Error {
        Error::internal(error.to_string())
    }

    fn map_username_error(error: UserValidationError) -> Error {
        Error::invalid_request(error.to_string())
            .with_details(json!({ "field": "username", "code": "invalid_username" }))
    }
}

fn stale_write(expected: u32, actual: u32) -> Error {
    Error::conflict("stale write").with_details(json!({
        "expectedRevision": expected,
        "actualRevision": actual,
        "code": "stale_write",
    }))
}

#[async_trait]
impl<U, H> AccountService for AccountServiceImpl<U, H>
where
    U: UserStore,
    H: PasswordHasher,
{
    async fn register(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let username =
            Username::new(credentials.username()).map_err(Self::map_username_error)?;
        let password_hash = self
            .hasher
            .hash(credentials.password())
            .map_err(Self::map_hash_error)?;

        let new_user = NewUser::with_default_roles(username, password_hash);
        let id = self
            .users
            .insert(&new_user)
            .await
            .map_err(Self::map_store_error)?;
        Ok(new_user.into_user(id))
    }

    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<Identity, Error> {
        // Unknown usernames and wrong passwords must be indistinguishable.
        let user = match self.users.find_by_username(credentials.username()).await {
            Ok(user) => user,
            Err(UserStoreError::NotFound) => {
                return Err(Error::unauthorized("invalid credentials"));
            }
            Err(other) => return Err(Self::map_store_error(other)),
        };

        let matches = self
            .hasher
            .verify(credentials.password(), &user.password_hash)
            .map_err(Self::map_hash_error)?;
        if matches {
            Ok(user.id)
        } else {
            Err(Error::unauthorized("invalid credentials"))
        }
    }

    fn authorize(&self, caller: &Identity, target: &Identity) -> Result<(), Error> {
        if caller == target {
            Ok(())
        } else {
            Err(Error::forbidden("callers may only access their own account"))
        }
    }

    async fn get_user(&self, id: &Identity) -> Result<User, Error> {
        self.users.get(id).await.map_err(Self::map_store_error)
    }

    async fn update_profile(&self, id: &Identity, patch: &ProfilePatch) -> Result<User, Error> {
        let mut user = self.users.get(id).await.map_err(Self::map_store_error)?;
        if patch.is_empty() {
            return Ok(user);
        }

        if let Some(username) = &patch.username {
            user.username = username.clone();
        }
        if let Some(password) = &patch.password {
            // The stored value is always a hash, including on this path.
            user.password_hash = self.hasher.hash(password).map_err(Self::map_hash_error)?;
        }

        let expected = user.revision;
        user.revision += 1;
        self.users
            .update(&user, expected)
            .await
            .map_err(Self::map_store_error)?;
        Ok(user)
    }
}
