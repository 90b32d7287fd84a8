//! The consistency coordinator for the dual representation of skills.
//!
//! Every skill is stored twice: authoritatively in the skill store, and as a
//! denormalized snapshot embedded in the owning user record. This service is
//! the only writer allowed to touch both. Each mutation runs the same
//! two-phase sequence (authoritative store first, embedded cache second)
//! without a cross-record transaction. When the second phase fails the two
//! representations have diverged; the operation reports a `partial_write`
//! error naming the records involved and logs it as a priority event, never
//! pretending success.
//!
//! Concurrent mutations of the same user race on the user record's
//! read-modify-write. The race is closed by the store's revision check: the
//! losing writer gets a stale-revision failure instead of silently
//! overwriting the winner's embedded sequence.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, warn};

use crate::domain::error::Error;
use crate::domain::identity::Identity;
use crate::domain::ports::{
    SkillService, SkillStore, SkillStoreError, UserDeletion, UserStore, UserStoreError,
};
use crate::domain::skill::{Skill, SkillDraft, SkillPatch};
use crate::domain::user::User;

/// Skill service implementing the driving port.
#[derive(Clone)]
pub struct SkillServiceImpl<U, S> {
    users: Arc<U>,
    skills: Arc<S>,
}

impl<U, S> SkillServiceImpl<U, S> {
    /// Create a new service over the two stores.
    pub fn new(users: Arc<U>, skills: Arc<S>) -> Self {
        Self { users, skills }
    }
}

impl<U, S> SkillServiceImpl<U, S>
where
    U: UserStore,
    S: SkillStore,
{
    fn map_user_store_error(error: UserStoreError) -> Error {
        match error {
            UserStoreError::Connection { message } => {
                Error::service_unavailable(format!("user store unavailable: {message}"))
            }
            UserStoreError::Query { message } => {
                Error::internal(format!("user store error: {message}"))
            }
            UserStoreError::NotFound => Error::not_found("user not found"),
            UserStoreError::DuplicateUsername => {
                Error::internal("unexpected username conflict during skill mutation")
            }
            UserStoreError::StaleRevision { expected, actual } => Error::conflict("stale write")
                .with_details(json!({
                    "expectedRevision": expected,
                    "actualRevision": actual,
                    "code": "stale_write",
                })),
        }
    }

    fn map_skill_store_error(error: SkillStoreError) -> Error {
        match error {
            SkillStoreError::Connection { message } => {
                Error::service_unavailable(format!("skill store unavailable: {message}"))
            }
            SkillStoreError::Query { message } => {
                Error::internal(format!("skill store error: {message}"))
            }
            SkillStoreError::NotFound => Error::not_found("skill not found"),
            SkillStoreError::DuplicateName => Error::conflict("skill name already exists")
                .with_details(json!({ "field": "name", "code": "duplicate_skill_name" })),
        }
    }

    async fn load_user(&self, user_id: &Identity) -> Result<User, Error> {
        self.users
            .get(user_id)
            .await
            .map_err(Self::map_user_store_error)
    }

    /// Index of the skill inside the user's embedded sequence. This is the
    /// ownership check: an identity that exists in the skill store but is
    /// not embedded under this user is not found.
    fn owned_position(user: &User, skill_id: &Identity) -> Result<usize, Error> {
        user.skills
            .iter()
            .position(|skill| skill.id == *skill_id)
            .ok_or_else(|| Error::not_found("skill not found for this user"))
    }

    /// Persist the user after a successful authoritative-store write. A
    /// failure here means the two representations have diverged.
    async fn persist_parent_cache(
        &self,
        mut user: User,
        operation: &'static str,
        skill_id: Identity,
        skill_id_key: &'static str,
    ) -> Result<(), Error> {
        let expected = user.revision;
        user.revision += 1;
        if let Err(store_error) = self.users.update(&user, expected).await {
            error!(
                user_id = %user.id,
                skill_id = %skill_id,
                operation,
                error = %store_error,
                "parent cache write failed after the authoritative store was changed",
            );
            let mut details = serde_json::Map::new();
            details.insert("phase".into(), "parent-cache".into());
            details.insert("userId".into(), user.id.to_hex().into());
            details.insert(skill_id_key.into(), skill_id.to_hex().into());
            details.insert("cause".into(), store_error.to_string().into());
            return Err(Error::partial_write(format!(
                "{operation} changed the skill store but the owner record was not updated"
            ))
            .with_details(serde_json::Value::Object(details)));
        }
        Ok(())
    }
}

#[async_trait]
impl<U, S> SkillService for SkillServiceImpl<U, S>
where
    U: UserStore,
    S: SkillStore,
{
    async fn add_skill(&self, user_id: &Identity, draft: &SkillDraft) -> Result<Skill, Error> {
        let mut user = self.load_user(user_id).await?;

        let skill_id = match self.skills.insert(draft).await {
            Ok(id) => id,
            Err(SkillStoreError::DuplicateName) => {
                // The interface contract fixes this status at 400.
                return Err(Error::invalid_request("skill name already exists")
                    .with_details(json!({ "field": "name", "code": "duplicate_skill_name" })));
            }
            Err(other) => return Err(Self::map_skill_store_error(other)),
        };

        let skill = Skill {
            id: skill_id,
            name: draft.name().to_owned(),
            proficiency: draft.proficiency().to_owned(),
        };
        user.skills.push(skill.clone());
        self.persist_parent_cache(user, "add skill", skill_id, "createdSkillId")
            .await?;
        Ok(skill)
    }

    async fn update_skill(
        &self,
        user_id: &Identity,
        skill_id: &Identity,
        patch: &SkillPatch,
    ) -> Result<Skill, Error> {
        let mut user = self.load_user(user_id).await?;
        let position = Self::owned_position(&user, skill_id)?;

        // Both writes use the same merged value so the representations are
        // identical once both phases succeed.
        let merged = user.skills[position].merged_with(patch);
        match self.skills.update(&merged).await {
            Ok(()) => {}
            Err(SkillStoreError::NotFound) => {
                // Embedded but absent from the store: a pre-existing
                // divergence, reported the same way as a fresh one.
                error!(
                    user_id = %user.id,
                    skill_id = %skill_id,
                    "embedded skill has no authoritative record",
                );
                return Err(Error::partial_write(
                    "embedded skill has no authoritative record",
                )
                .with_details(json!({
                    "phase": "authoritative-store",
                    "userId": user.id.to_hex(),
                    "danglingSkillId": skill_id.to_hex(),
                })));
            }
            Err(other) => return Err(Self::map_skill_store_error(other)),
        }

        user.skills[position] = merged.clone();
        self.persist_parent_cache(user, "update skill", *skill_id, "skillId")
            .await?;
        Ok(merged)
    }

    async fn remove_skill(&self, user_id: &Identity, skill_id: &Identity) -> Result<(), Error> {
        let mut user = self.load_user(user_id).await?;
        let position = Self::owned_position(&user, skill_id)?;

        match self.skills.delete(skill_id).await {
            Ok(()) => {}
            Err(SkillStoreError::NotFound) => {
                // Already gone from the store; removing the embedded entry
                // repairs the divergence instead of preserving it.
                warn!(
                    user_id = %user.id,
                    skill_id = %skill_id,
                    "embedded skill was already absent from the skill store",
                );
            }
            Err(other) => return Err(Self::map_skill_store_error(other)),
        }

        user.skills.remove(position);
        self.persist_parent_cache(user, "remove skill", *skill_id, "danglingSkillId")
            .await
    }

    async fn skills_for_user(&self, user_id: &Identity) -> Result<Vec<Skill>, Error> {
        // The embedded cache exists so that listing is one read.
        let user = self.load_user(user_id).await?;
        Ok(user.skills)
    }

    async fn delete_user(&self, user_id: &Identity) -> Result<UserDeletion, Error> {
        let user = self.load_user(user_id).await?;

        let mut failed_skill_deletes = Vec::new();
        for skill in &user.skills {
            if let Err(store_error) = self.skills.delete(&skill.id).await {
                warn!(
                    user_id = %user.id,
                    skill_id = %skill.id,
                    error = %store_error,
                    "cascade delete left a skill record behind",
                );
                failed_skill_deletes.push(skill.id);
            }
        }

        self.users
            .delete(user_id)
            .await
            .map_err(Self::map_user_store_error)?;

        if !failed_skill_deletes.is_empty() {
            error!(
                user_id = %user_id,
                orphaned = failed_skill_deletes.len(),
                "user deleted with orphaned skill records needing reconciliation",
            );
        }
        Ok(UserDeletion {
            failed_skill_deletes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{MockSkillStore, MockUserStore};
    use crate::domain::user::{STANDARD_ROLE, Username};

    fn service(
        users: MockUserStore,
        skills: MockSkillStore,
    ) -> SkillServiceImpl<MockUserStore, MockSkillStore> {
        SkillServiceImpl::new(Arc::new(users), Arc::new(skills))
    }

    fn user_with_skills(id: Identity, skills: Vec<Skill>) -> User {
        User {
            id,
            username: Username::new("alice").expect("valid username"),
            password_hash: "hash".into(),
            roles: vec![STANDARD_ROLE.to_owned()],
            skills,
            revision: 1,
        }
    }

    fn skill(id: Identity, name: &str, proficiency: &str) -> Skill {
        Skill {
            id,
            name: name.into(),
            proficiency: proficiency.into(),
        }
    }

    #[tokio::test]
    async fn add_skill_appends_in_insertion_order() {
        let user_id = Identity::generate();
        let existing = skill(Identity::generate(), "Go", "expert");
        let user = user_with_skills(user_id, vec![existing.clone()]);
        let new_id = Identity::generate();

        let mut users = MockUserStore::new();
        users.expect_get().times(1).return_once(move |_| Ok(user));
        users
            .expect_update()
            .withf(move |user: &User, expected: &u32| {
                *expected == 1
                    && user.revision == 2
                    && user.skills.len() == 2
                    && user.skills[0].name == "Go"
                    && user.skills[1].name == "Rust"
                    && user.skills[1].id == new_id
            })
            .times(1)
            .return_once(|_, _| Ok(()));

        let mut skills = MockSkillStore::new();
        skills
            .expect_insert()
            .withf(|draft: &SkillDraft| draft.name() == "Rust" && draft.proficiency() == "novice")
            .times(1)
            .return_once(move |_| Ok(new_id));

        let draft = SkillDraft::try_new("Rust", "novice").expect("valid draft");
        let created = service(users, skills)
            .add_skill(&user_id, &draft)
            .await
            .expect("add succeeds");
        assert_eq!(created.id, new_id);
        assert_eq!(created.name, "Rust");
    }

    #[tokio::test]
    async fn add_skill_fails_before_any_write_when_the_user_is_missing() {
        let mut users = MockUserStore::new();
        users
            .expect_get()
            .return_once(|_| Err(UserStoreError::NotFound));
        users.expect_update().times(0);
        let mut skills = MockSkillStore::new();
        skills.expect_insert().times(0);

        let draft = SkillDraft::try_new("Rust", "novice").expect("valid draft");
        let err = service(users, skills)
            .add_skill(&Identity::generate(), &draft)
            .await
            .expect_err("user missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn add_skill_maps_duplicate_names_without_touching_the_user() {
        let user_id = Identity::generate();
        let user = user_with_skills(user_id, Vec::new());
        let mut users = MockUserStore::new();
        users.expect_get().return_once(move |_| Ok(user));
        users.expect_update().times(0);

        let mut skills = MockSkillStore::new();
        skills
            .expect_insert()
            .return_once(|_| Err(SkillStoreError::DuplicateName));

        let draft = SkillDraft::try_new("Go", "expert").expect("valid draft");
        let err = service(users, skills)
            .add_skill(&user_id, &draft)
            .await
            .expect_err("duplicate name");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.details().expect("details")["code"], "duplicate_skill_name");
    }

    #[tokio::test]
    async fn add_skill_reports_a_partial_write_when_the_owner_update_fails() {
        let user_id = Identity::generate();
        let user = user_with_skills(user_id, Vec::new());
        let new_id = Identity::generate();

        let mut users = MockUserStore::new();
        users.expect_get().return_once(move |_| Ok(user));
        users
            .expect_update()
            .return_once(|_, _| Err(UserStoreError::query("write timed out")));

        let mut skills = MockSkillStore::new();
        skills.expect_insert().return_once(move |_| Ok(new_id));

        let draft = SkillDraft::try_new("Rust", "novice").expect("valid draft");
        let err = service(users, skills)
            .add_skill(&user_id, &draft)
            .await
            .expect_err("partial write");
        assert_eq!(err.code(), ErrorCode::PartialWrite);
        let details = err.details().expect("details");
        assert_eq!(details["createdSkillId"], new_id.to_hex());
        assert_eq!(details["phase"], "parent-cache");
    }

    #[tokio::test]
    async fn update_skill_merges_the_patch_into_both_representations() {
        let user_id = Identity::generate();
        let skill_id = Identity::generate();
        let user = user_with_skills(
            user_id,
            vec![
                skill(Identity::generate(), "Go", "expert"),
                skill(skill_id, "Rust", "novice"),
            ],
        );

        let mut users = MockUserStore::new();
        users.expect_get().return_once(move |_| Ok(user));
        users
            .expect_update()
            .withf(move |user: &User, expected: &u32| {
                *expected == 1
                    && user.skills.len() == 2
                    && user.skills[1].id == skill_id
                    && user.skills[1].name == "Rust"
                    && user.skills[1].proficiency == "intermediate"
            })
            .times(1)
            .return_once(|_, _| Ok(()));

        let mut skills = MockSkillStore::new();
        skills
            .expect_update()
            .withf(move |merged: &Skill| {
                merged.id == skill_id
                    && merged.name == "Rust"
                    && merged.proficiency == "intermediate"
            })
            .times(1)
            .return_once(|_| Ok(()));

        let patch = SkillPatch {
            name: None,
            proficiency: Some("intermediate".into()),
        };
        let updated = service(users, skills)
            .update_skill(&user_id, &skill_id, &patch)
            .await
            .expect("update succeeds");
        assert_eq!(updated.proficiency, "intermediate");
        assert_eq!(updated.name, "Rust");
    }

    #[tokio::test]
    async fn update_skill_refuses_skills_owned_by_someone_else() {
        let user_id = Identity::generate();
        let foreign_skill = Identity::generate();
        let user = user_with_skills(user_id, vec![skill(Identity::generate(), "Go", "expert")]);

        let mut users = MockUserStore::new();
        users.expect_get().return_once(move |_| Ok(user));
        users.expect_update().times(0);
        let mut skills = MockSkillStore::new();
        skills.expect_update().times(0);

        let err = service(users, skills)
            .update_skill(&user_id, &foreign_skill, &SkillPatch::default())
            .await
            .expect_err("foreign skill");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn update_skill_reports_a_partial_write_when_the_owner_update_fails() {
        let user_id = Identity::generate();
        let skill_id = Identity::generate();
        let user = user_with_skills(user_id, vec![skill(skill_id, "Go", "expert")]);

        let mut users = MockUserStore::new();
        users.expect_get().return_once(move |_| Ok(user));
        users
            .expect_update()
            .return_once(|_, _| Err(UserStoreError::query("write timed out")));
        let mut skills = MockSkillStore::new();
        skills.expect_update().return_once(|_| Ok(()));

        let patch = SkillPatch {
            name: Some("Golang".into()),
            proficiency: None,
        };
        let err = service(users, skills)
            .update_skill(&user_id, &skill_id, &patch)
            .await
            .expect_err("partial write");
        assert_eq!(err.code(), ErrorCode::PartialWrite);
        assert_eq!(err.details().expect("details")["skillId"], skill_id.to_hex());
    }

    #[tokio::test]
    async fn remove_skill_deletes_store_first_and_preserves_order() {
        let user_id = Identity::generate();
        let skill_id = Identity::generate();
        let first = skill(Identity::generate(), "Go", "expert");
        let last = skill(Identity::generate(), "SQL", "expert");
        let user = user_with_skills(
            user_id,
            vec![first.clone(), skill(skill_id, "Rust", "novice"), last.clone()],
        );

        let mut users = MockUserStore::new();
        users.expect_get().return_once(move |_| Ok(user));
        users
            .expect_update()
            .withf(move |user: &User, _: &u32| {
                user.skills.len() == 2
                    && user.skills[0].id == first.id
                    && user.skills[1].id == last.id
            })
            .times(1)
            .return_once(|_, _| Ok(()));

        let mut skills = MockSkillStore::new();
        skills
            .expect_delete()
            .withf(move |id: &Identity| *id == skill_id)
            .times(1)
            .return_once(|_| Ok(()));

        service(users, skills)
            .remove_skill(&user_id, &skill_id)
            .await
            .expect("remove succeeds");
    }

    #[tokio::test]
    async fn remove_skill_reports_the_dangling_embed_on_a_partial_write() {
        let user_id = Identity::generate();
        let skill_id = Identity::generate();
        let user = user_with_skills(user_id, vec![skill(skill_id, "Go", "expert")]);

        let mut users = MockUserStore::new();
        users.expect_get().return_once(move |_| Ok(user));
        users
            .expect_update()
            .return_once(|_, _| Err(UserStoreError::query("write timed out")));
        let mut skills = MockSkillStore::new();
        skills.expect_delete().return_once(|_| Ok(()));

        let err = service(users, skills)
            .remove_skill(&user_id, &skill_id)
            .await
            .expect_err("partial write");
        assert_eq!(err.code(), ErrorCode::PartialWrite);
        assert_eq!(
            err.details().expect("details")["danglingSkillId"],
            skill_id.to_hex()
        );
    }

    #[tokio::test]
    async fn listing_skills_never_touches_the_skill_store() {
        let user_id = Identity::generate();
        let owned = vec![
            skill(Identity::generate(), "Go", "expert"),
            skill(Identity::generate(), "Rust", "novice"),
        ];
        let user = user_with_skills(user_id, owned.clone());

        let mut users = MockUserStore::new();
        users.expect_get().times(1).return_once(move |_| Ok(user));
        // No expectations at all: any skill-store call panics the test.
        let skills = MockSkillStore::new();

        let listed = service(users, skills)
            .skills_for_user(&user_id)
            .await
            .expect("listing succeeds");
        assert_eq!(listed, owned);
    }

    #[tokio::test]
    async fn delete_user_cascades_and_collects_failures() {
        let user_id = Identity::generate();
        let kept = Identity::generate();
        let user = user_with_skills(
            user_id,
            vec![
                skill(Identity::generate(), "Go", "expert"),
                skill(kept, "Rust", "novice"),
                skill(Identity::generate(), "SQL", "expert"),
            ],
        );

        let mut users = MockUserStore::new();
        users.expect_get().return_once(move |_| Ok(user));
        users
            .expect_delete()
            .withf(move |id: &Identity| *id == user_id)
            .times(1)
            .return_once(|_| Ok(()));

        let mut skills = MockSkillStore::new();
        skills
            .expect_delete()
            .times(3)
            .returning(move |id| {
                if *id == kept {
                    Err(SkillStoreError::query("delete timed out"))
                } else {
                    Ok(())
                }
            });

        let outcome = service(users, skills)
            .delete_user(&user_id)
            .await
            .expect("deletion succeeds despite a cascade failure");
        assert_eq!(outcome.failed_skill_deletes, vec![kept]);
    }

    #[tokio::test]
    async fn delete_user_of_an_absent_user_is_not_found() {
        let mut users = MockUserStore::new();
        users
            .expect_get()
            .return_once(|_| Err(UserStoreError::NotFound));
        users.expect_delete().times(0);
        let skills = MockSkillStore::new();

        let err = service(users, skills)
            .delete_user(&Identity::generate())
            .await
            .expect_err("absent user");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn add_skill_surfaces_a_lost_revision_race_as_a_partial_write() {
        let user_id = Identity::generate();
        let user = user_with_skills(user_id, Vec::new());
        let new_id = Identity::generate();

        let mut users = MockUserStore::new();
        users.expect_get().return_once(move |_| Ok(user));
        users
            .expect_update()
            .return_once(|_, _| Err(UserStoreError::StaleRevision { expected: 1, actual: 2 }));
        let mut skills = MockSkillStore::new();
        skills.expect_insert().return_once(move |_| Ok(new_id));

        let draft = SkillDraft::try_new("Rust", "novice").expect("valid draft");
        let err = service(users, skills)
            .add_skill(&user_id, &draft)
            .await
            .expect_err("lost race");
        // The inserted record has no embedded counterpart yet, so the lost
        // race is a partial write, not a plain conflict.
        assert_eq!(err.code(), ErrorCode::PartialWrite);
        assert_eq!(
            err.details().expect("details")["createdSkillId"],
            new_id.to_hex()
        );
    }
}
