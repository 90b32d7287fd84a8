//! In-memory store adapters.
//!
//! Used when the server is started without a database URL and by the
//! integration tests. Behaviour mirrors the Diesel adapters: single-record
//! atomicity, uniqueness violations, revision checks, non-idempotent
//! deletes. Nothing here coordinates across the two stores.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{SkillStore, SkillStoreError, UserStore, UserStoreError};
use crate::domain::{Identity, NewUser, Skill, SkillDraft, User};

/// HashMap-backed implementation of the `UserStore` port.
#[derive(Default)]
pub struct MemoryUserStore {
    records: Mutex<HashMap<Identity, User>>,
}

impl MemoryUserStore {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Identity, User>>, UserStoreError> {
        self.records
            .lock()
            .map_err(|_| UserStoreError::query("user store mutex poisoned"))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, new_user: &NewUser) -> Result<Identity, UserStoreError> {
        let mut records = self.lock()?;
        if records
            .values()
            .any(|user| user.username == new_user.username)
        {
            return Err(UserStoreError::DuplicateUsername);
        }
        let id = Identity::generate();
        records.insert(id, new_user.clone().into_user(id));
        Ok(id)
    }

    async fn get(&self, id: &Identity) -> Result<User, UserStoreError> {
        self.lock()?.get(id).cloned().ok_or(UserStoreError::NotFound)
    }

    async fn update(&self, user: &User, expected_revision: u32) -> Result<(), UserStoreError> {
        let mut records = self.lock()?;
        let stored = records.get(&user.id).ok_or(UserStoreError::NotFound)?;
        if stored.revision != expected_revision {
            return Err(UserStoreError::StaleRevision {
                expected: expected_revision,
                actual: stored.revision,
            });
        }
        if records
            .values()
            .any(|other| other.id != user.id && other.username == user.username)
        {
            return Err(UserStoreError::DuplicateUsername);
        }
        records.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete(&self, id: &Identity) -> Result<(), UserStoreError> {
        self.lock()?
            .remove(id)
            .map(|_| ())
            .ok_or(UserStoreError::NotFound)
    }

    async fn find_by_username(&self, username: &str) -> Result<User, UserStoreError> {
        self.lock()?
            .values()
            .find(|user| user.username.as_ref() == username)
            .cloned()
            .ok_or(UserStoreError::NotFound)
    }
}

/// HashMap-backed implementation of the `SkillStore` port.
#[derive(Default)]
pub struct MemorySkillStore {
    records: Mutex<HashMap<Identity, Skill>>,
}

impl MemorySkillStore {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Identity, Skill>>, SkillStoreError> {
        self.records
            .lock()
            .map_err(|_| SkillStoreError::query("skill store mutex poisoned"))
    }
}

#[async_trait]
impl SkillStore for MemorySkillStore {
    async fn insert(&self, draft: &SkillDraft) -> Result<Identity, SkillStoreError> {
        let mut records = self.lock()?;
        // Names are unique across the whole store, case-sensitively.
        if records.values().any(|skill| skill.name == draft.name()) {
            return Err(SkillStoreError::DuplicateName);
        }
        let id = Identity::generate();
        records.insert(
            id,
            Skill {
                id,
                name: draft.name().to_owned(),
                proficiency: draft.proficiency().to_owned(),
            },
        );
        Ok(id)
    }

    async fn get(&self, id: &Identity) -> Result<Skill, SkillStoreError> {
        self.lock()?.get(id).cloned().ok_or(SkillStoreError::NotFound)
    }

    async fn update(&self, skill: &Skill) -> Result<(), SkillStoreError> {
        let mut records = self.lock()?;
        if records
            .values()
            .any(|other| other.id != skill.id && other.name == skill.name)
        {
            return Err(SkillStoreError::DuplicateName);
        }
        let stored = records.get_mut(&skill.id).ok_or(SkillStoreError::NotFound)?;
        *stored = skill.clone();
        Ok(())
    }

    async fn delete(&self, id: &Identity) -> Result<(), SkillStoreError> {
        self.lock()?
            .remove(id)
            .map(|_| ())
            .ok_or(SkillStoreError::NotFound)
    }
}
