//! Domain ports for the hexagonal boundary.
//!
//! Driving ports ([`AccountService`], [`SkillService`]) are what inbound
//! adapters call; driven ports ([`UserStore`], [`SkillStore`],
//! [`PasswordHasher`]) are what the domain services call out through.

mod accounts;
mod password_hasher;
mod skill_store;
mod skills;
mod user_store;

pub use accounts::AccountService;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use skill_store::MockSkillStore;
pub use skill_store::{SkillStore, SkillStoreError};
pub use skills::{SkillService, UserDeletion};
#[cfg(test)]
pub use user_store::MockUserStore;
pub use user_store::{UserStore, UserStoreError};
