//! User identity and role model.
//!
//! Users are created on first successful authentication with role `user`;
//! promotion to `admin` happens out of band. The engine never mutates a user
//! after creation.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validation errors returned by [`User::try_from_parts`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Identifier is empty or not a UUID.
    #[error("user id must be a valid UUID")]
    InvalidId,
    /// Email is empty or structurally invalid.
    #[error("email must contain a local part and a domain")]
    InvalidEmail,
    /// Role string is not a recognised role.
    #[error("role must be either `user` or `admin`")]
    InvalidRole,
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from string input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.is_empty() || raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Wrap an already-parsed UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authorisation role attached to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular voter; counted in participation-rate denominators.
    User,
    /// Administrator; may toggle the voting window and read stats.
    Admin,
}

impl Role {
    /// Stable string form used in storage and on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(UserValidationError::InvalidRole),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application user.
///
/// ## Invariants
/// - `id` is a valid UUID.
/// - `email` contains a non-empty local part and domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable user identifier.
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: UserId,
    /// Address asserted by the identity provider.
    #[schema(example = "ada@example.org")]
    email: String,
    /// Display name, falling back to the email local part when absent.
    #[serde(alias = "full_name")]
    #[schema(example = "Ada Lovelace")]
    full_name: String,
    /// Authorisation role; defaults to [`Role::User`] on first login.
    role: Role,
}

impl User {
    /// Build a new [`User`] from validated components.
    pub const fn new(id: UserId, email: String, full_name: String, role: Role) -> Self {
        Self {
            id,
            email,
            full_name,
            role,
        }
    }

    /// Fallible constructor enforcing identifier and email invariants.
    pub fn try_from_parts(
        id: impl AsRef<str>,
        email: impl Into<String>,
        full_name: impl Into<String>,
        role: Role,
    ) -> Result<Self, UserValidationError> {
        let id = UserId::new(id)?;
        let email = email.into();
        if !is_plausible_email(&email) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self::new(id, email, full_name.into(), role))
    }

    /// Stable user identifier.
    pub const fn id(&self) -> &UserId {
        &self.id
    }

    /// Email asserted by the identity provider.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Human-readable name.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Authorisation role.
    pub const fn role(&self) -> Role {
        self.role
    }

    /// True when the user may administer the voting window.
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

/// Derive a display name from an email when the provider supplies none.
///
/// Mirrors the first-login behaviour of the auth callback: the local part of
/// the address stands in for a missing full name.
pub fn name_from_email(email: &str) -> String {
    email
        .split('@')
        .next()
        .filter(|part| !part.is_empty())
        .unwrap_or(email)
        .to_owned()
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}
