//! Credential primitives shared by registration and login.
//!
//! Handlers validate raw payload strings into [`LoginCredentials`] before
//! anything touches a port or service, keeping payload parsing out of the
//! domain. The password is zeroized when the value is dropped.

use std::fmt;

use zeroize::Zeroizing;

/// Domain error returned when credential payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Username was missing or blank once trimmed.
    EmptyUsername,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

/// Validated username/password pair.
///
/// ## Invariants
/// - `username` is trimmed and non-empty after trimming.
/// - `password` is non-empty but keeps caller-provided whitespace so hashing
///   and verification see exactly what the caller typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(
        username: &str,
        password: &str,
    ) -> Result<Self, CredentialsValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(CredentialsValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }

        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username string suitable for store lookups.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password exactly as provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}
