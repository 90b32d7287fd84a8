//! Domain primitives, aggregates, and services.
//!
//! Purpose: define the strongly typed entities and the two domain services:
//! the account service (authentication, authorization, profiles) and the
//! skill service (the coordinator keeping the skill store and the embedded
//! skill cache coherent). Types stay transport agnostic; inbound adapters
//! map [`Error`] to their own envelopes.

pub mod account_service;
pub mod auth;
pub mod error;
pub mod identity;
pub mod ports;
pub mod skill;
pub mod skill_service;
pub mod user;

pub use self::account_service::AccountServiceImpl;
pub use self::auth::{CredentialsValidationError, LoginCredentials};
pub use self::error::{Error, ErrorCode};
pub use self::identity::{Identity, IdentityParseError};
pub use self::skill::{Skill, SkillDraft, SkillPatch, SkillValidationError};
pub use self::skill_service::SkillServiceImpl;
pub use self::user::{NewUser, ProfilePatch, STANDARD_ROLE, User, UserValidationError, Username};

/// Convenient result alias for domain operations.
pub type ApiResult<T> = Result<T, Error>;
