//! Regression coverage for session state transitions and bootstrap.

use std::sync::Arc;

use futures::future::join_all;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockSessionStore, SlotStorage, TOKEN_SLOT, USER_RECORD_SLOT};
use crate::domain::test_utils::GatedStore;
use crate::domain::{PersistedSession, PersistedSessionStore, Role};
use crate::outbound::storage::MemorySlotStorage;

fn user(id: &str) -> UserRecord {
    UserRecord::new(UserId::new(id).expect("id"), format!("{id}@example.com")).with_name(id)
}

fn token(raw: &str) -> AccessToken {
    AccessToken::new(raw).expect("token")
}

fn item(raw: &str) -> ItemId {
    ItemId::new(raw).expect("item")
}

struct Harness {
    slots: Arc<MemorySlotStorage>,
    state: SessionState,
}

#[fixture]
fn harness() -> Harness {
    let slots = Arc::new(MemorySlotStorage::default());
    let store = Arc::new(PersistedSessionStore::new(slots.clone()));
    Harness {
        slots,
        state: SessionState::new(store, SessionEvents::default()),
    }
}

#[rstest]
#[tokio::test]
async fn login_signs_in_resets_entitlements_and_persists(harness: Harness) {
    let Harness { slots, state } = harness;
    state.add_purchase(item("granite"));

    state
        .login(user("ada"), token("tok-ada"))
        .await
        .expect("login");

    assert!(state.is_logged_in());
    assert!(state.entitlements().is_empty());
    assert_eq!(slots.get(TOKEN_SLOT).expect("get").as_deref(), Some("tok-ada"));
    let raw = slots
        .get(USER_RECORD_SLOT)
        .expect("get")
        .expect("record written");
    let record: UserRecord = serde_json::from_str(&raw).expect("deserialisable record");
    assert_eq!(record, user("ada"));
}

#[rstest]
#[tokio::test]
async fn login_as_another_identity_clears_entitlements(harness: Harness) {
    let state = harness.state;
    state.login(user("ada"), token("t1")).await.expect("login");
    state.add_purchase(item("oak"));
    assert!(state.has_purchased(&item("oak")));

    state.login(user("bob"), token("t2")).await.expect("login");

    assert!(!state.has_purchased(&item("oak")));
    assert_eq!(state.display_name(), "bob");
}

#[rstest]
#[tokio::test]
async fn logout_clears_everything_and_points_at_root(harness: Harness) {
    let Harness { slots, state } = harness;
    let mut events = state.events().subscribe();
    state.login(user("ada"), token("t1")).await.expect("login");
    state.add_purchase(item("oak"));

    let signed_out = state.logout().await;

    assert_eq!(signed_out.redirect, Location::root());
    assert_eq!(signed_out.store_error, None);
    assert!(!state.is_logged_in());
    assert!(state.token().is_none());
    assert!(state.entitlements().is_empty());
    assert_eq!(state.display_name(), "Guest");
    assert_eq!(slots.get(TOKEN_SLOT).expect("get"), None);
    assert_eq!(slots.get(USER_RECORD_SLOT).expect("get"), None);

    let received: Vec<SessionEvent> = std::iter::from_fn(|| events.try_recv().ok()).collect();
    assert_eq!(
        received,
        vec![
            SessionEvent::SignedIn {
                user_id: UserId::new("ada").expect("id"),
            },
            SessionEvent::SignedOut,
            SessionEvent::Reset,
        ]
    );
}

#[rstest]
#[tokio::test]
async fn logout_reports_store_failures_after_clearing_memory() {
    let mut store = MockSessionStore::new();
    store.expect_save().returning(|_| Ok(()));
    store
        .expect_clear()
        .times(1)
        .returning(|| Err(SessionStoreError::backend("read-only")));
    let state = SessionState::new(Arc::new(store), SessionEvents::default());
    state.login(user("ada"), token("t1")).await.expect("login");

    let signed_out = state.logout().await;

    assert_eq!(signed_out.redirect, Location::root());
    assert_eq!(
        signed_out.store_error,
        Some(SessionStoreError::backend("read-only"))
    );
    assert!(!state.is_logged_in());
}

#[rstest]
#[tokio::test]
async fn uncleared_record_is_not_restored_after_logout() {
    let mut store = MockSessionStore::new();
    store.expect_save().returning(|_| Ok(()));
    store
        .expect_clear()
        .returning(|| Err(SessionStoreError::backend("read-only")));
    store.expect_load().times(0);
    let state = SessionState::new(Arc::new(store), SessionEvents::default());
    state.login(user("ada"), token("t1")).await.expect("login");
    let _ = state.logout().await;

    assert!(state.is_settled());
    assert_eq!(state.settle().await, Ok(BootstrapOutcome::Superseded));
    assert!(!state.is_logged_in());
}

#[rstest]
#[tokio::test]
async fn purchases_are_refused_for_a_stale_generation(harness: Harness) {
    let state = harness.state;
    state.login(user("ada"), token("t1")).await.expect("login");
    let before = state.generation();

    let _ = state.logout().await;
    state.login(user("ada"), token("t2")).await.expect("login");

    assert_eq!(state.add_purchase_in(before, item("oak")), None);
    assert!(!state.has_purchased(&item("oak")));
    assert_eq!(state.add_purchase_in(state.generation(), item("oak")), Some(true));
}

#[rstest]
fn add_purchase_is_idempotent(harness: Harness) {
    let state = harness.state;
    let before = state.entitlements().len();

    assert!(state.add_purchase(item("moss")));
    assert!(!state.add_purchase(item("moss")));

    assert!(state.has_purchased(&item("moss")));
    assert_eq!(state.entitlements().len(), before + 1);
}

#[rstest]
#[tokio::test]
async fn init_restores_a_persisted_session(harness: Harness) {
    let Harness { slots, state } = harness;
    let record = PersistedSession {
        token: token("tok-9"),
        user: user("grace").with_role(Role::Admin),
    };
    PersistedSessionStore::new(slots)
        .save(&record)
        .await
        .expect("seed");

    let outcome = state.init().await.expect("init");

    assert_eq!(
        outcome,
        BootstrapOutcome::Restored {
            user_id: UserId::new("grace").expect("id"),
        }
    );
    assert!(state.is_admin());
    assert_eq!(state.token(), Some(token("tok-9")));
}

#[rstest]
#[tokio::test]
async fn init_with_corrupt_record_stays_signed_out(harness: Harness) {
    let Harness { slots, state } = harness;
    slots.set(TOKEN_SLOT, "tok").expect("seed");
    slots.set(USER_RECORD_SLOT, "{\"id\":").expect("seed");

    assert_eq!(state.init().await, Ok(BootstrapOutcome::NoSession));
    assert!(!state.is_logged_in());
}

#[rstest]
#[tokio::test]
async fn init_is_a_no_op_while_signed_in() {
    let mut store = MockSessionStore::new();
    store.expect_save().returning(|_| Ok(()));
    store.expect_load().times(0);
    let state = SessionState::new(Arc::new(store), SessionEvents::default());
    state.login(user("ada"), token("t1")).await.expect("login");

    assert_eq!(state.init().await, Ok(BootstrapOutcome::AlreadySignedIn));
}

#[rstest]
#[tokio::test]
async fn settle_reads_the_store_once_for_concurrent_callers() {
    let seeded = PersistedSessionStore::new(Arc::new(MemorySlotStorage::default()));
    seeded
        .save(&PersistedSession {
            token: token("tok-9"),
            user: user("grace"),
        })
        .await
        .expect("seed");
    let store = Arc::new(GatedStore::new(seeded));
    let state = Arc::new(SessionState::new(store.clone(), SessionEvents::default()));

    let callers: Vec<_> = (0..4)
        .map(|_| {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.settle().await })
        })
        .collect();
    store.entered.notified().await;
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }

    assert_eq!(store.loads(), 1);
    assert!(!state.is_settled());
    store.release.notify_one();

    let restored = Ok(BootstrapOutcome::Restored {
        user_id: UserId::new("grace").expect("id"),
    });
    for outcome in join_all(callers).await {
        assert_eq!(outcome.expect("join"), restored);
    }
    assert_eq!(store.loads(), 1);
    assert!(state.is_settled());
    assert_eq!(state.settle().await, restored);
}

#[rstest]
#[tokio::test]
async fn failed_bootstrap_is_published_and_not_retried() {
    let mut store = MockSessionStore::new();
    store
        .expect_load()
        .times(1)
        .returning(|| Err(SessionStoreError::backend("permission denied")));
    let state = SessionState::new(Arc::new(store), SessionEvents::default());
    let mut events = state.events().subscribe();

    let first = state.settle().await;
    let second = state.settle().await;

    assert!(matches!(first, Err(BootstrapError(SessionStoreError::Backend { .. }))));
    assert_eq!(first, second);
    assert!(!state.is_logged_in());
    assert!(matches!(
        events.try_recv(),
        Ok(SessionEvent::BootstrapFailed { .. })
    ));
    assert!(events.try_recv().is_err());
}

#[rstest]
#[tokio::test]
async fn login_during_bootstrap_wins_over_the_stale_read() {
    let slots = Arc::new(MemorySlotStorage::default());
    let seeded = PersistedSessionStore::new(slots.clone());
    seeded
        .save(&PersistedSession {
            token: token("stale"),
            user: user("old"),
        })
        .await
        .expect("seed");
    let store = Arc::new(GatedStore::new(seeded));
    let state = Arc::new(SessionState::new(store.clone(), SessionEvents::default()));

    let bootstrap = tokio::spawn({
        let state = Arc::clone(&state);
        async move { state.settle().await }
    });
    store.entered.notified().await;
    state
        .login(user("fresh"), token("fresh-token"))
        .await
        .expect("login");
    store.release.notify_one();

    let outcome = bootstrap.await.expect("join").expect("bootstrap");
    assert_eq!(outcome, BootstrapOutcome::Superseded);
    assert_eq!(
        state.user().map(|user| user.id().clone()),
        Some(UserId::new("fresh").expect("id"))
    );
    assert_eq!(state.token(), Some(token("fresh-token")));
}
