//! Wire shapes of the hosted identity service.
//!
//! The auth API answers sign-up with either a session (auto-confirmed
//! accounts) or a bare user (email confirmation pending); both decode into
//! [`AuthResponseDto`].

use serde::{Deserialize, Serialize};

use crate::domain::{Profile, Role};

#[derive(Debug, Serialize)]
pub(super) struct CredentialsDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct AuthUserDto {
    pub(super) id: String,
    #[serde(default)]
    pub(super) email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AuthResponseDto {
    #[serde(default)]
    pub(super) access_token: Option<String>,
    #[serde(default)]
    pub(super) user: Option<AuthUserDto>,
    #[serde(default)]
    pub(super) id: Option<String>,
    #[serde(default)]
    pub(super) email: Option<String>,
}

impl AuthResponseDto {
    /// User id from the nested user, or from the top level when the response
    /// is a bare user.
    pub(super) fn user_id(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|user| user.id.as_str())
            .or(self.id.as_deref())
    }

    pub(super) fn user_email(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|user| user.email.as_deref())
            .or(self.email.as_deref())
    }
}

/// Error body; different endpoints use different field names.
#[derive(Debug, Default, Deserialize)]
pub(super) struct AuthErrorDto {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl AuthErrorDto {
    pub(super) fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .filter(|message| !message.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ProfileRowDto {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    occupation: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    role: Option<Role>,
}

impl From<ProfileRowDto> for Profile {
    fn from(row: ProfileRowDto) -> Self {
        Self {
            full_name: row.full_name,
            occupation: row.occupation,
            company: row.company,
            role: row.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct NewProfileRowDto<'a> {
    pub(super) id: &'a str,
    pub(super) email: &'a str,
    pub(super) full_name: Option<&'a str>,
    pub(super) occupation: Option<&'a str>,
    pub(super) company: Option<&'a str>,
    pub(super) role: Role,
}

impl<'a> NewProfileRowDto<'a> {
    pub(super) fn new(id: &'a str, email: &'a str, profile: &'a Profile) -> Self {
        Self {
            id,
            email,
            full_name: profile.full_name.as_deref(),
            occupation: profile.occupation.as_deref(),
            company: profile.company.as_deref(),
            role: profile.role.unwrap_or_default(),
        }
    }
}
