//! Driven port for the remote identity provider.
//!
//! The provider owns sign-up, sign-in and sign-out. The session core only
//! consumes its results; it never validates tokens itself.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::domain::{AccessToken, LoginCredentials, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity provider adapters.
    pub enum IdentityProviderError {
        /// Credentials were rejected; `message` is the provider's own wording.
        InvalidCredentials { message: String } => "{message}",
        /// The provider refused the request for another reason (duplicate
        /// account, weak password, rate limiting).
        Rejected { message: String } => "identity provider rejected the request: {message}",
        /// Network or transport failure.
        Transport { message: String } => "identity provider unreachable: {message}",
        /// The provider answered with an unexpected payload.
        Decode { message: String } => "identity provider response was malformed: {message}",
    }
}

/// Result of a successful sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpResult {
    /// Identifier of the new account.
    pub user_id: UserId,
    /// Session token, absent when the provider requires email confirmation
    /// before the first sign-in.
    pub token: Option<AccessToken>,
}

/// Result of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInResult {
    /// Identifier of the signed-in account.
    pub user_id: UserId,
    /// Email on file with the provider.
    pub email: String,
    /// Session token.
    pub token: AccessToken,
}

/// Remote identity provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new account.
    async fn sign_up(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<SignUpResult, IdentityProviderError>;

    /// Exchange credentials for a session.
    async fn sign_in(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<SignInResult, IdentityProviderError>;

    /// Revoke the session identified by `token`.
    async fn sign_out(&self, token: &AccessToken) -> Result<(), IdentityProviderError>;
}

/// In-process identity provider used until a remote provider is configured.
///
/// Accounts live in memory; `admin@example.com` / `password` is seeded so the
/// command line is usable out of the box.
#[derive(Debug)]
pub struct FixtureIdentityProvider {
    accounts: Mutex<HashMap<String, FixtureAccount>>,
}

#[derive(Debug, Clone)]
struct FixtureAccount {
    user_id: UserId,
    password: String,
}

/// Identifier of the seeded fixture account.
pub const FIXTURE_ADMIN_ID: &str = "123e4567-e89b-12d3-a456-426614174000";
/// Email of the seeded fixture account.
pub const FIXTURE_ADMIN_EMAIL: &str = "admin@example.com";

impl Default for FixtureIdentityProvider {
    fn default() -> Self {
        let mut accounts = HashMap::new();
        if let Ok(user_id) = UserId::new(FIXTURE_ADMIN_ID) {
            accounts.insert(
                FIXTURE_ADMIN_EMAIL.to_owned(),
                FixtureAccount {
                    user_id,
                    password: "password".to_owned(),
                },
            );
        }
        Self {
            accounts: Mutex::new(accounts),
        }
    }
}

fn fixture_token() -> Result<AccessToken, IdentityProviderError> {
    AccessToken::new(format!("fixture-{}", Uuid::new_v4()))
        .map_err(|err| IdentityProviderError::decode(err.to_string()))
}

#[async_trait]
impl IdentityProvider for FixtureIdentityProvider {
    async fn sign_up(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<SignUpResult, IdentityProviderError> {
        let mut accounts = self.accounts.lock();
        if accounts.contains_key(credentials.email()) {
            return Err(IdentityProviderError::rejected("User already registered"));
        }
        let user_id = UserId::new(Uuid::new_v4().to_string())
            .map_err(|err| IdentityProviderError::decode(err.to_string()))?;
        accounts.insert(
            credentials.email().to_owned(),
            FixtureAccount {
                user_id: user_id.clone(),
                password: credentials.password().to_owned(),
            },
        );
        Ok(SignUpResult {
            user_id,
            token: Some(fixture_token()?),
        })
    }

    async fn sign_in(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<SignInResult, IdentityProviderError> {
        let account = self.accounts.lock().get(credentials.email()).cloned();
        match account {
            Some(account) if account.password == credentials.password() => Ok(SignInResult {
                user_id: account.user_id,
                email: credentials.email().to_owned(),
                token: fixture_token()?,
            }),
            _ => Err(IdentityProviderError::invalid_credentials(
                "Invalid login credentials",
            )),
        }
    }

    async fn sign_out(&self, _token: &AccessToken) -> Result<(), IdentityProviderError> {
        Ok(())
    }
}
