//! Application bundle wiring the session core to its collaborators.
//!
//! Views and commands receive an [`App`] instead of reaching for globals:
//! every service holds exactly the ports it was built with.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;

use super::navigator::Navigator;
use crate::domain::ports::{
    FixtureIdentityProvider, FixtureProfileStore, IdentityProvider, NoticeSink, ObjectStorage,
    PaymentGateway, ProfileStore, RecordingNoticeSink, SessionStore, SlotStorage,
};
use crate::domain::{
    AssetService, AuthService, CheckoutService, NavigationGuard, PersistedSessionStore,
    RouteTable, SessionEvents, SessionState,
};
use crate::outbound::object_storage::MemoryObjectStorage;
use crate::outbound::payment::{SimulatedPaymentGateway, TokioSleeper};

/// Bucket name used by the in-memory object store.
pub const FIXTURE_BUCKET: &str = "materials";

/// Parameter object bundling all port implementations the client needs.
#[derive(Clone)]
pub struct AppPorts {
    pub identity: Arc<dyn IdentityProvider>,
    pub profiles: Arc<dyn ProfileStore>,
    pub slots: Arc<dyn SlotStorage>,
    pub objects: Arc<dyn ObjectStorage>,
    pub payments: Arc<dyn PaymentGateway>,
    pub notices: Arc<dyn NoticeSink>,
    pub clock: Arc<dyn Clock>,
}

impl AppPorts {
    /// In-process fixtures for everything except session slots and time.
    ///
    /// Payments settle without delay.
    pub fn with_fixtures(slots: Arc<dyn SlotStorage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            identity: Arc::new(FixtureIdentityProvider::default()),
            profiles: Arc::new(FixtureProfileStore::default()),
            slots,
            objects: Arc::new(MemoryObjectStorage::new(FIXTURE_BUCKET, clock.clone())),
            payments: Arc::new(
                SimulatedPaymentGateway::new(Arc::new(TokioSleeper), clock.clone())
                    .with_delay(Duration::ZERO),
            ),
            notices: Arc::new(RecordingNoticeSink::default()),
            clock,
        }
    }
}

/// Session state, guard, navigator and use-case services for one page
/// lifetime.
#[derive(Clone)]
pub struct App {
    pub session: Arc<SessionState>,
    pub navigator: Arc<Navigator>,
    pub auth: AuthService,
    pub checkout: CheckoutService,
    pub assets: AssetService,
}

impl App {
    /// Compose the application over `ports` with the marketplace routes.
    pub fn new(ports: AppPorts) -> Self {
        Self::with_routes(ports, RouteTable::marketplace())
    }

    /// Compose the application over `ports` and an explicit route table.
    pub fn with_routes(ports: AppPorts, routes: RouteTable) -> Self {
        let store: Arc<dyn SessionStore> = Arc::new(PersistedSessionStore::new(ports.slots));
        let session = Arc::new(SessionState::new(store, SessionEvents::default()));
        let guard = NavigationGuard::new(session.clone(), Arc::new(routes));
        Self {
            navigator: Arc::new(Navigator::new(guard, ports.notices)),
            auth: AuthService::new(ports.identity, ports.profiles, session.clone()),
            checkout: CheckoutService::new(session.clone(), ports.payments),
            assets: AssetService::new(ports.objects, ports.clock),
            session,
        }
    }

    /// Override the signed download URL lifetime.
    #[must_use]
    pub fn with_signed_url_ttl(mut self, ttl: Duration) -> Self {
        self.assets = self.assets.with_signed_url_ttl(ttl);
        self
    }

    /// Guard deciding navigation admission.
    pub fn guard(&self) -> &NavigationGuard {
        self.navigator.guard()
    }
}
