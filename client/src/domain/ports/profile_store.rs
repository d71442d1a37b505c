//! Port for the profile record store.
//!
//! Profiles are best-effort: a failed or empty lookup degrades the display
//! name and role to defaults and never blocks sign-in.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{Profile, Role, UserId};

use super::define_port_error;
use super::identity_provider::FIXTURE_ADMIN_ID;

define_port_error! {
    /// Errors raised by profile store adapters.
    pub enum ProfileStoreError {
        /// The store could not be reached.
        Transport { message: String } => "profile store unreachable: {message}",
        /// The store rejected the query or write.
        Query { message: String } => "profile store query failed: {message}",
        /// The store answered with an unexpected payload.
        Decode { message: String } => "profile store response was malformed: {message}",
    }
}

/// Record store holding one profile row per user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile for `user_id`; `Ok(None)` when no row exists.
    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileStoreError>;

    /// Insert the profile row created at sign-up.
    async fn create_profile(
        &self,
        user_id: &UserId,
        email: &str,
        profile: &Profile,
    ) -> Result<(), ProfileStoreError>;
}

/// In-memory profile store seeded with the fixture administrator.
#[derive(Debug)]
pub struct FixtureProfileStore {
    rows: Mutex<HashMap<UserId, Profile>>,
}

impl Default for FixtureProfileStore {
    fn default() -> Self {
        let mut rows = HashMap::new();
        if let Ok(id) = UserId::new(FIXTURE_ADMIN_ID) {
            rows.insert(
                id,
                Profile {
                    full_name: Some("Ada Admin".to_owned()),
                    occupation: Some("Curator".to_owned()),
                    company: None,
                    role: Some(Role::Admin),
                },
            );
        }
        Self {
            rows: Mutex::new(rows),
        }
    }
}

#[async_trait]
impl ProfileStore for FixtureProfileStore {
    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileStoreError> {
        Ok(self.rows.lock().get(user_id).cloned())
    }

    async fn create_profile(
        &self,
        user_id: &UserId,
        _email: &str,
        profile: &Profile,
    ) -> Result<(), ProfileStoreError> {
        let mut rows = self.rows.lock();
        if rows.contains_key(user_id) {
            return Err(ProfileStoreError::query(format!(
                "profile for {user_id} already exists"
            )));
        }
        rows.insert(user_id.clone(), profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn seeded_admin_profile_is_returned() {
        let store = FixtureProfileStore::default();
        let id = UserId::new(FIXTURE_ADMIN_ID).expect("id");
        let profile = store
            .fetch_profile(&id)
            .await
            .expect("lookup")
            .expect("seeded row");
        assert_eq!(profile.role, Some(Role::Admin));
    }

    #[rstest]
    #[tokio::test]
    async fn created_profiles_can_be_fetched_once() {
        let store = FixtureProfileStore::default();
        let id = UserId::new("u-9").expect("id");
        let profile = Profile {
            full_name: Some("Grace".to_owned()),
            role: Some(Role::User),
            ..Profile::default()
        };

        store
            .create_profile(&id, "grace@example.com", &profile)
            .await
            .expect("insert");
        assert_eq!(
            store.fetch_profile(&id).await.expect("lookup"),
            Some(profile.clone())
        );

        let err = store
            .create_profile(&id, "grace@example.com", &profile)
            .await
            .expect_err("duplicate insert");
        assert!(matches!(err, ProfileStoreError::Query { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_users_have_no_profile() {
        let store = FixtureProfileStore::default();
        let id = UserId::new("nobody").expect("id");
        assert_eq!(store.fetch_profile(&id).await.expect("lookup"), None);
    }
}
