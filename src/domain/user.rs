//! User aggregate and its validated parts.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::identity::Identity;
use crate::domain::skill::Skill;

/// Role granted to every account at registration. There is no elevated role;
/// ownership is the only authorization rule.
pub const STANDARD_ROLE: &str = "standard";

/// Validation errors returned by [`Username::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyUsername,
    UsernameTooLong { max: usize },
    UsernameInvalidCharacters,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::UsernameTooLong { max } => {
                write!(f, "username must be at most {max} characters")
            }
            Self::UsernameInvalidCharacters => write!(
                f,
                "username may only contain letters, numbers, dots, underscores, '@', or dashes",
            ),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 64;

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        Regex::new("^[A-Za-z0-9_.@-]+$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

/// Unique login name chosen at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`]. Surrounding whitespace is
    /// trimmed before validation.
    pub fn new(username: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(username.as_ref().trim().to_owned())
    }

    fn from_owned(username: String) -> Result<Self, UserValidationError> {
        if username.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if username.chars().count() > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if !username_regex().is_match(&username) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(username))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value.trim().to_owned())
    }
}

/// Application user.
///
/// ## Invariants
/// - `skills` is the insertion-ordered denormalized cache of exactly those
///   skill-store records owned by this user; only the skill service may
///   change it.
/// - `revision` starts at 1 and increments on every persisted update; the
///   store rejects writes whose expected revision no longer matches.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Identity,
    pub username: Username,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub skills: Vec<Skill>,
    pub revision: u32,
}

/// Input for creating a user record. The store assigns the identity; the
/// first persisted revision is 1 and the skill cache starts empty.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: Username,
    pub password_hash: String,
    pub roles: Vec<String>,
}

impl NewUser {
    /// Build a registration record with the default role set.
    pub fn with_default_roles(username: Username, password_hash: String) -> Self {
        Self {
            username,
            password_hash,
            roles: vec![STANDARD_ROLE.to_owned()],
        }
    }

    /// Materialize the stored aggregate once the store has assigned an id.
    pub fn into_user(self, id: Identity) -> User {
        User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            roles: self.roles,
            skills: Vec::new(),
            revision: 1,
        }
    }
}

/// Partial profile update; `None` means "leave unchanged". A new password
/// arrives in plain text and is hashed by the account service before storage.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub username: Option<Username>,
    pub password: Option<String>,
}

impl ProfilePatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}
