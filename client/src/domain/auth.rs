//! Authentication primitives: credentials, sign-up forms and session tokens.
//!
//! Keep form parsing outside the session core by exposing constructors that
//! validate string inputs before a service talks to the identity provider.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Domain error returned when credential or form values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Email did not look like `local@domain`.
    #[error("email must look like name@example.com")]
    MalformedEmail,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Full name was missing on a sign-up form.
    #[error("full name must not be empty")]
    EmptyFullName,
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Shape check only; the identity provider owns real validation.
        let pattern = r"^[^@\s]+@[^@\s]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Validated login credentials used by the identity provider.
///
/// ## Invariants
/// - `email` is trimmed, non-empty and contains exactly one `@` separating
///   two non-blank parts.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use client::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" ada@example.com ", "secret").unwrap();
/// assert_eq!(creds.email(), "ada@example.com");
/// assert_eq!(creds.password(), "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }
        if !email_regex().is_match(normalized) {
            return Err(LoginValidationError::MalformedEmail);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email address suitable for identity lookups.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated sign-up form: credentials plus the profile fields written to the
/// record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpForm {
    credentials: LoginCredentials,
    full_name: String,
    occupation: Option<String>,
    company: Option<String>,
}

impl SignUpForm {
    /// Construct a sign-up form, trimming the free-text fields and dropping
    /// blank optional values.
    pub fn try_new(
        credentials: LoginCredentials,
        full_name: &str,
        occupation: Option<&str>,
        company: Option<&str>,
    ) -> Result<Self, LoginValidationError> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(LoginValidationError::EmptyFullName);
        }
        let optional = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        };
        Ok(Self {
            credentials,
            full_name: full_name.to_owned(),
            occupation: optional(occupation),
            company: optional(company),
        })
    }

    /// Credentials to register with the identity provider.
    pub fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }

    /// Full name for the profile row.
    pub fn full_name(&self) -> &str {
        self.full_name.as_str()
    }

    /// Optional occupation for the profile row.
    pub fn occupation(&self) -> Option<&str> {
        self.occupation.as_deref()
    }

    /// Optional company for the profile row.
    pub fn company(&self) -> Option<&str> {
        self.company.as_deref()
    }
}

/// Validation error for [`AccessToken`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("access token must not be empty")]
pub struct EmptyTokenError;

/// Opaque session token issued by the identity provider.
///
/// The value is zeroized on drop and redacted from `Debug` output so it never
/// lands in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    /// Wrap a raw token, rejecting blank values.
    ///
    /// # Examples
    /// ```
    /// use client::domain::AccessToken;
    ///
    /// let token = AccessToken::new("eyJhbGciOi").expect("non-empty token");
    /// assert_eq!(token.as_str(), "eyJhbGciOi");
    /// assert_eq!(format!("{token:?}"), "AccessToken(<redacted>)");
    /// ```
    pub fn new(raw: impl Into<String>) -> Result<Self, EmptyTokenError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(EmptyTokenError);
        }
        Ok(Self(Zeroizing::new(raw)))
    }

    /// Borrow the raw token, e.g. for a bearer header.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

impl TryFrom<String> for AccessToken {
    type Error = EmptyTokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccessToken> for String {
    fn from(value: AccessToken) -> Self {
        value.0.as_str().to_owned()
    }
}
