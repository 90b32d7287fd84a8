//! Driven port for user persistence adapters and their errors.
//!
//! The store operates purely on its own keyed record space; it never reads
//! or writes skill records. The embedded skill cache travels inside the
//! [`User`] value it is handed.

use async_trait::async_trait;

use crate::domain::identity::Identity;
use crate::domain::user::{NewUser, User};

/// Persistence errors raised by user store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserStoreError {
    /// Store connection could not be established.
    #[error("user store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user store query failed: {message}")]
    Query { message: String },
    /// No record exists for the requested key.
    #[error("user not found")]
    NotFound,
    /// Another record already holds the requested username.
    #[error("username already registered")]
    DuplicateUsername,
    /// Optimistic concurrency check failed.
    #[error("revision mismatch: expected {expected}, found {actual}")]
    StaleRevision { expected: u32, actual: u32 },
}

impl UserStoreError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Keyed CRUD over user records.
///
/// # Revision semantics
///
/// - A freshly inserted record has revision 1.
/// - `update` persists the record it is handed and fails with
///   [`UserStoreError::StaleRevision`] when the stored revision no longer
///   equals `expected_revision`; callers bump the record's own revision
///   before calling.
/// - Deletes are not idempotent: deleting an absent record is `NotFound`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Assign an identity, persist the record, and return the identity.
    async fn insert(&self, user: &NewUser) -> Result<Identity, UserStoreError>;

    /// Fetch a record by identity.
    async fn get(&self, id: &Identity) -> Result<User, UserStoreError>;

    /// Persist an updated record, enforcing the revision check.
    async fn update(&self, user: &User, expected_revision: u32) -> Result<(), UserStoreError>;

    /// Remove a record by identity.
    async fn delete(&self, id: &Identity) -> Result<(), UserStoreError>;

    /// Fetch the record holding the unique username.
    async fn find_by_username(&self, username: &str) -> Result<User, UserStoreError>;
}
