//! Driven port for skill persistence adapters and their errors.

use async_trait::async_trait;

use crate::domain::identity::Identity;
use crate::domain::skill::{Skill, SkillDraft};

/// Persistence errors raised by skill store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkillStoreError {
    /// Store connection could not be established.
    #[error("skill store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("skill store query failed: {message}")]
    Query { message: String },
    /// No record exists for the requested key.
    #[error("skill not found")]
    NotFound,
    /// Another record already holds the requested name. Skill names are
    /// unique across the whole store, not per user.
    #[error("skill name already exists")]
    DuplicateName,
}

impl SkillStoreError {
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

/// Keyed CRUD over the authoritative skill records. No cross-entity logic;
/// ownership lives only in the embedded cache of the owning user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SkillStore: Send + Sync {
    /// Assign an identity, persist the record, and return the identity.
    async fn insert(&self, draft: &SkillDraft) -> Result<Identity, SkillStoreError>;

    /// Fetch a record by identity.
    async fn get(&self, id: &Identity) -> Result<Skill, SkillStoreError>;

    /// Overwrite an existing record in place; the identity is immutable.
    async fn update(&self, skill: &Skill) -> Result<(), SkillStoreError>;

    /// Remove a record by identity. Not idempotent: absent is `NotFound`.
    async fn delete(&self, id: &Identity) -> Result<(), SkillStoreError>;
}
