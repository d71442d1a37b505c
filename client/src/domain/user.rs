//! User data model.
//!
//! `UserRecord` is the shape held in the in-memory session and mirrored into
//! the persisted `userRecord` slot. `Profile` is the best-effort row read from
//! the record store and folded into a record at sign-in.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fallback display name used when no profile name is known.
pub const GUEST_DISPLAY_NAME: &str = "Guest";

/// Display name given to a signed-in user whose profile could not be read.
pub const DEFAULT_PROFILE_NAME: &str = "User";

/// Validation errors returned by [`UserId::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Identifier was empty.
    #[error("user id must not be empty")]
    EmptyId,
    /// Identifier carried leading or trailing whitespace.
    #[error("user id must not contain surrounding whitespace")]
    InvalidId,
}

/// Opaque user identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    ///
    /// # Examples
    /// ```
    /// use client::domain::UserId;
    ///
    /// let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
    /// assert_eq!(id.as_ref(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    /// assert!(UserId::new("  ").is_err());
    /// ```
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.trim().is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Access role attached to a user profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular marketplace customer.
    #[default]
    User,
    /// Catalogue administrator.
    Admin,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile row kept by the record store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Full name entered at sign-up.
    pub full_name: Option<String>,
    /// Free-text occupation.
    pub occupation: Option<String>,
    /// Free-text company name.
    pub company: Option<String>,
    /// Access role; absent rows count as [`Role::User`].
    pub role: Option<Role>,
}

/// Signed-in user as held by the session and its persisted mirror.
///
/// ## Invariants
/// - `id` is a valid [`UserId`]; records with a blank id never deserialise.
///
/// # Examples
/// ```
/// use client::domain::{Role, UserId, UserRecord};
///
/// let id = UserId::new("u-1").expect("valid id");
/// let user = UserRecord::new(id, "ada@example.com").with_name("Ada");
/// assert_eq!(user.name(), Some("Ada"));
/// assert_eq!(user.role(), Role::User);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    id: UserId,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    company: Option<String>,
    #[serde(default)]
    role: Role,
}

impl UserRecord {
    /// Build a record with only identity fields populated.
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            name: None,
            occupation: None,
            company: None,
            role: Role::User,
        }
    }

    /// Fold a record-store profile into the record.
    ///
    /// Missing profile names fall back to [`DEFAULT_PROFILE_NAME`], matching
    /// what a freshly signed-in user sees before their profile exists.
    #[must_use]
    pub fn with_profile(mut self, profile: Option<Profile>) -> Self {
        let profile = profile.unwrap_or_default();
        self.name = Some(
            profile
                .full_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_owned()),
        );
        self.occupation = profile.occupation;
        self.company = profile.company;
        self.role = profile.role.unwrap_or_default();
        self
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the access role.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Sign-in email address.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Profile name, if one is known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Occupation from the profile.
    pub fn occupation(&self) -> Option<&str> {
        self.occupation.as_deref()
    }

    /// Company from the profile.
    pub fn company(&self) -> Option<&str> {
        self.company.as_deref()
    }

    /// Access role.
    pub fn role(&self) -> Role {
        self.role
    }
}
