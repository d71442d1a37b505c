//! Sign-up, sign-in and sign-out orchestration.
//!
//! The identity provider decides who the user is; the record store adds
//! profile fields on a best-effort basis; session state is updated last.

use std::sync::Arc;

use tracing::{info, warn};

use super::ports::{IdentityProvider, IdentityProviderError, ProfileStore};
use super::{
    AccessToken, Error, LoginCredentials, Profile, Role, SessionState, SignUpForm, SignedOut,
    UserRecord,
};

const INVALID_CREDENTIALS_FALLBACK: &str = "Invalid login credentials";

fn map_identity_error(error: IdentityProviderError) -> Error {
    match error {
        IdentityProviderError::InvalidCredentials { message } => {
            let message = if message.trim().is_empty() {
                INVALID_CREDENTIALS_FALLBACK.to_owned()
            } else {
                message
            };
            Error::unauthorized(message)
        }
        IdentityProviderError::Rejected { message } => {
            Error::invalid_request(format!("identity provider rejected the request: {message}"))
        }
        IdentityProviderError::Transport { message } => {
            Error::service_unavailable(format!("identity provider unavailable: {message}"))
        }
        IdentityProviderError::Decode { message } => {
            Error::internal(format!("identity provider response was malformed: {message}"))
        }
    }
}

/// Outcome of [`AuthService::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Record built from the sign-up form.
    pub user: UserRecord,
    /// Whether the provider issued a session straight away. When `false` the
    /// user must confirm their email and sign in.
    pub signed_in: bool,
}

/// Authentication use-cases over the identity provider and record store.
#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    session: Arc<SessionState>,
}

impl AuthService {
    /// Create the service.
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        session: Arc<SessionState>,
    ) -> Self {
        Self {
            identity,
            profiles,
            session,
        }
    }

    /// Register a new account and, when the provider allows it, sign in.
    ///
    /// The profile row is written with role `user`; a failed write is logged
    /// and does not fail registration.
    pub async fn register(&self, form: &SignUpForm) -> Result<Registration, Error> {
        let credentials = form.credentials();
        let created = self
            .identity
            .sign_up(credentials)
            .await
            .map_err(map_identity_error)?;

        let profile = Profile {
            full_name: Some(form.full_name().to_owned()),
            occupation: form.occupation().map(str::to_owned),
            company: form.company().map(str::to_owned),
            role: Some(Role::User),
        };
        if let Err(err) = self
            .profiles
            .create_profile(&created.user_id, credentials.email(), &profile)
            .await
        {
            warn!(user_id = %created.user_id, error = %err, "failed to create profile row");
        }

        let user = UserRecord::new(created.user_id, credentials.email()).with_profile(Some(profile));
        let signed_in = match created.token {
            Some(token) => {
                self.adopt(user.clone(), token).await;
                true
            }
            None => {
                info!(user_id = %user.id(), "registered; awaiting email confirmation");
                false
            }
        };
        Ok(Registration { user, signed_in })
    }

    /// Sign in with `credentials`.
    ///
    /// Invalid credentials surface as an unauthorized [`Error`] carrying the
    /// provider's message. A missing or unreadable profile degrades the name
    /// to `"User"` and the role to `user`.
    pub async fn sign_in(&self, credentials: &LoginCredentials) -> Result<UserRecord, Error> {
        let signed_in = self
            .identity
            .sign_in(credentials)
            .await
            .map_err(map_identity_error)?;

        let profile = match self.profiles.fetch_profile(&signed_in.user_id).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(user_id = %signed_in.user_id, error = %err, "profile lookup failed; using defaults");
                None
            }
        };

        let user = UserRecord::new(signed_in.user_id, signed_in.email).with_profile(profile);
        self.adopt(user.clone(), signed_in.token).await;
        Ok(user)
    }

    /// Revoke the provider session, then clear local state.
    ///
    /// A provider failure leaves local state untouched so the user can
    /// retry. A saved session that could not be removed is reported in
    /// [`SignedOut::store_error`].
    pub async fn sign_out(&self) -> Result<SignedOut, Error> {
        if let Some(token) = self.session.token() {
            self.identity
                .sign_out(&token)
                .await
                .map_err(map_identity_error)?;
        }
        Ok(self.session.logout().await)
    }

    async fn adopt(&self, user: UserRecord, token: AccessToken) {
        let user_id = user.id().clone();
        if let Err(err) = self.session.login(user, token).await {
            warn!(user_id = %user_id, error = %err, "session will not survive a reload");
        }
    }
}

#[cfg(test)]
#[path = "auth_service_tests.rs"]
mod tests;
