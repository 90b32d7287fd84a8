//! Skill records and the shapes used to create and patch them.
//!
//! A skill lives in two places at once: as the authoritative record in the
//! skill store and as an embedded snapshot inside its owning user. Both
//! copies serialize identically (the embedded form is persisted as JSON), so
//! the record derives serde directly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::identity::Identity;

/// Validation errors for skill inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillValidationError {
    EmptyName,
}

impl fmt::Display for SkillValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "skill name must not be empty"),
        }
    }
}

impl std::error::Error for SkillValidationError {}

/// A skill as stored and as embedded in its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: Identity,
    pub name: String,
    pub proficiency: String,
}

impl Skill {
    /// Apply a partial patch, keeping fields the patch does not set.
    ///
    /// The identity is immutable; both representations of the skill are
    /// written from the value returned here so they converge byte for byte.
    pub fn merged_with(&self, patch: &SkillPatch) -> Skill {
        Skill {
            id: self.id,
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            proficiency: patch
                .proficiency
                .clone()
                .unwrap_or_else(|| self.proficiency.clone()),
        }
    }
}

/// Validated input for creating a skill. The store assigns the identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillDraft {
    name: String,
    proficiency: String,
}

impl SkillDraft {
    /// Validate and construct a draft from raw inputs.
    pub fn try_new(
        name: impl Into<String>,
        proficiency: impl Into<String>,
    ) -> Result<Self, SkillValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SkillValidationError::EmptyName);
        }
        Ok(Self {
            name,
            proficiency: proficiency.into(),
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn proficiency(&self) -> &str {
        self.proficiency.as_str()
    }
}

/// Partial update for a skill; `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillPatch {
    pub name: Option<String>,
    pub proficiency: Option<String>,
}

impl SkillPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.proficiency.is_none()
    }
}
