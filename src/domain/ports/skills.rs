//! Driving port for the coordinated skill use-cases.

use async_trait::async_trait;

use crate::domain::error::Error;
use crate::domain::identity::Identity;
use crate::domain::skill::{Skill, SkillDraft, SkillPatch};

/// Outcome of a cascading user deletion. The user record is gone; any
/// identities listed here are skill records the cascade failed to delete and
/// which need operational follow-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDeletion {
    pub failed_skill_deletes: Vec<Identity>,
}

/// Domain use-case port for every mutation that touches both the skill
/// store and the embedded cache inside the owning user record.
#[async_trait]
pub trait SkillService: Send + Sync {
    /// Create a skill owned by `user_id` and append it to the user's
    /// embedded sequence.
    async fn add_skill(&self, user_id: &Identity, draft: &SkillDraft) -> Result<Skill, Error>;

    /// Patch a skill owned by `user_id` in both representations. A skill
    /// not embedded under this user is `not_found`, whatever the skill
    /// store says.
    async fn update_skill(
        &self,
        user_id: &Identity,
        skill_id: &Identity,
        patch: &SkillPatch,
    ) -> Result<Skill, Error>;

    /// Delete a skill owned by `user_id` from both representations.
    async fn remove_skill(&self, user_id: &Identity, skill_id: &Identity) -> Result<(), Error>;

    /// The user's embedded skill sequence, in insertion order. Reads only
    /// the user record; the skill store is not consulted.
    async fn skills_for_user(&self, user_id: &Identity) -> Result<Vec<Skill>, Error>;

    /// Delete a user and cascade-delete its owned skills (best effort).
    async fn delete_user(&self, user_id: &Identity) -> Result<UserDeletion, Error>;
}
