//! Tests for the authentication service.

use std::sync::Arc;

use mockall::predicate::eq;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    MockIdentityProvider, MockProfileStore, MockSessionStore, ProfileStoreError, SessionStoreError,
    SignInResult, SignUpResult,
};
use crate::domain::{ErrorCode, ItemId, SessionEvents, UserId};

fn user_id() -> UserId {
    UserId::new("u-42").expect("id")
}

fn token(raw: &str) -> AccessToken {
    AccessToken::new(raw).expect("token")
}

#[fixture]
fn credentials() -> LoginCredentials {
    LoginCredentials::try_from_parts("ada@example.com", "correct horse").expect("credentials")
}

fn session_with(store: MockSessionStore) -> Arc<SessionState> {
    Arc::new(SessionState::new(Arc::new(store), SessionEvents::default()))
}

fn accepting_store() -> MockSessionStore {
    let mut store = MockSessionStore::new();
    store.expect_save().returning(|_| Ok(()));
    store.expect_clear().returning(|| Ok(()));
    store
}

fn signed_in_provider() -> MockIdentityProvider {
    let mut identity = MockIdentityProvider::new();
    identity.expect_sign_in().returning(|creds| {
        Ok(SignInResult {
            user_id: user_id(),
            email: creds.email().to_owned(),
            token: token("tok-42"),
        })
    });
    identity
}

#[rstest]
#[tokio::test]
async fn sign_in_folds_profile_into_session(credentials: LoginCredentials) {
    let mut profiles = MockProfileStore::new();
    profiles
        .expect_fetch_profile()
        .with(eq(user_id()))
        .times(1)
        .returning(|_| {
            Ok(Some(Profile {
                full_name: Some("Ada Lovelace".to_owned()),
                occupation: Some("Analyst".to_owned()),
                company: None,
                role: Some(Role::Admin),
            }))
        });
    let session = session_with(accepting_store());
    let service = AuthService::new(
        Arc::new(signed_in_provider()),
        Arc::new(profiles),
        session.clone(),
    );

    let user = service.sign_in(&credentials).await.expect("sign in");

    assert_eq!(user.name(), Some("Ada Lovelace"));
    assert!(session.is_admin());
    assert_eq!(session.display_name(), "Ada Lovelace");
    assert_eq!(session.token(), Some(token("tok-42")));
}

#[rstest]
#[case(Ok(None))]
#[case(Err(ProfileStoreError::transport("timeout")))]
#[tokio::test]
async fn profile_failures_degrade_to_defaults(
    credentials: LoginCredentials,
    #[case] lookup: Result<Option<Profile>, ProfileStoreError>,
) {
    let mut profiles = MockProfileStore::new();
    profiles
        .expect_fetch_profile()
        .return_once(move |_| lookup);
    let session = session_with(accepting_store());
    let service = AuthService::new(
        Arc::new(signed_in_provider()),
        Arc::new(profiles),
        session.clone(),
    );

    let user = service.sign_in(&credentials).await.expect("sign in");

    assert_eq!(user.name(), Some("User"));
    assert_eq!(user.role(), Role::User);
    assert!(session.is_logged_in());
}

#[rstest]
#[tokio::test]
async fn invalid_credentials_keep_provider_message(credentials: LoginCredentials) {
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_sign_in()
        .returning(|_| Err(IdentityProviderError::invalid_credentials("Email not confirmed")));
    let mut profiles = MockProfileStore::new();
    profiles.expect_fetch_profile().times(0);
    let session = session_with(MockSessionStore::new());
    let service = AuthService::new(Arc::new(identity), Arc::new(profiles), session.clone());

    let err = service.sign_in(&credentials).await.expect_err("rejected");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), "Email not confirmed");
    assert!(!session.is_logged_in());
}

#[rstest]
#[case(IdentityProviderError::transport("dns"), ErrorCode::ServiceUnavailable)]
#[case(IdentityProviderError::decode("bad json"), ErrorCode::InternalError)]
#[case(IdentityProviderError::rejected("weak password"), ErrorCode::InvalidRequest)]
#[case(IdentityProviderError::invalid_credentials(""), ErrorCode::Unauthorized)]
fn provider_errors_map_to_codes(#[case] error: IdentityProviderError, #[case] code: ErrorCode) {
    assert_eq!(map_identity_error(error).code(), code);
}

#[rstest]
#[tokio::test]
async fn login_persistence_failure_does_not_fail_sign_in(credentials: LoginCredentials) {
    let mut store = MockSessionStore::new();
    store
        .expect_save()
        .returning(|_| Err(crate::domain::ports::SessionStoreError::backend("quota")));
    let mut profiles = MockProfileStore::new();
    profiles.expect_fetch_profile().returning(|_| Ok(None));
    let session = session_with(store);
    let service = AuthService::new(
        Arc::new(signed_in_provider()),
        Arc::new(profiles),
        session.clone(),
    );

    service.sign_in(&credentials).await.expect("sign in");

    assert!(session.is_logged_in());
}

#[rstest]
#[case(Some(token("fresh")), true)]
#[case(None, false)]
#[tokio::test]
async fn register_writes_user_profile_and_signs_in_when_possible(
    credentials: LoginCredentials,
    #[case] issued: Option<AccessToken>,
    #[case] expect_signed_in: bool,
) {
    let mut identity = MockIdentityProvider::new();
    identity.expect_sign_up().return_once(move |_| {
        Ok(SignUpResult {
            user_id: user_id(),
            token: issued,
        })
    });
    let mut profiles = MockProfileStore::new();
    profiles
        .expect_create_profile()
        .withf(|id, email, profile| {
            id == &user_id()
                && email == "ada@example.com"
                && profile.role == Some(Role::User)
                && profile.full_name.as_deref() == Some("Ada")
        })
        .times(1)
        .returning(|_, _, _| Err(ProfileStoreError::query("row level security")));
    let session = session_with(accepting_store());
    let service = AuthService::new(Arc::new(identity), Arc::new(profiles), session.clone());
    let form = SignUpForm::try_new(credentials, "Ada", Some("Engineer"), None).expect("form");

    let registration = service.register(&form).await.expect("register");

    assert_eq!(registration.signed_in, expect_signed_in);
    assert_eq!(registration.user.name(), Some("Ada"));
    assert_eq!(session.is_logged_in(), expect_signed_in);
}

#[rstest]
#[tokio::test]
async fn sign_out_revokes_then_clears(credentials: LoginCredentials) {
    let mut identity = signed_in_provider();
    identity
        .expect_sign_out()
        .withf(|token| token.as_str() == "tok-42")
        .times(1)
        .returning(|_| Ok(()));
    let mut profiles = MockProfileStore::new();
    profiles.expect_fetch_profile().returning(|_| Ok(None));
    let session = session_with(accepting_store());
    let service = AuthService::new(Arc::new(identity), Arc::new(profiles), session.clone());
    service.sign_in(&credentials).await.expect("sign in");
    session.add_purchase(ItemId::new("oak").expect("item"));

    let signed_out = service.sign_out().await.expect("sign out");

    assert_eq!(signed_out.redirect.to_string(), "/");
    assert!(!session.is_logged_in());
    assert!(session.entitlements().is_empty());
}

#[rstest]
#[tokio::test]
async fn sign_out_completes_when_the_saved_session_cannot_be_removed(
    credentials: LoginCredentials,
) {
    let mut identity = signed_in_provider();
    identity.expect_sign_out().returning(|_| Ok(()));
    let mut profiles = MockProfileStore::new();
    profiles.expect_fetch_profile().returning(|_| Ok(None));
    let mut store = MockSessionStore::new();
    store.expect_save().returning(|_| Ok(()));
    store
        .expect_clear()
        .returning(|| Err(SessionStoreError::backend("quota exceeded")));
    let session = session_with(store);
    let service = AuthService::new(Arc::new(identity), Arc::new(profiles), session.clone());
    service.sign_in(&credentials).await.expect("sign in");

    let signed_out = service.sign_out().await.expect("sign out");

    assert_eq!(signed_out.redirect.to_string(), "/");
    assert_eq!(
        signed_out.store_error,
        Some(SessionStoreError::backend("quota exceeded"))
    );
    assert!(!session.is_logged_in());
}

#[rstest]
#[tokio::test]
async fn failed_revocation_keeps_local_session(credentials: LoginCredentials) {
    let mut identity = signed_in_provider();
    identity
        .expect_sign_out()
        .returning(|_| Err(IdentityProviderError::transport("offline")));
    let mut profiles = MockProfileStore::new();
    profiles.expect_fetch_profile().returning(|_| Ok(None));
    let session = session_with(accepting_store());
    let service = AuthService::new(Arc::new(identity), Arc::new(profiles), session.clone());
    service.sign_in(&credentials).await.expect("sign in");

    let err = service.sign_out().await.expect_err("revocation failed");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert!(session.is_logged_in());
}
