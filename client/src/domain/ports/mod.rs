//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod identity_provider;
mod notice_sink;
mod object_storage;
mod payment_gateway;
mod profile_store;
mod session_store;

#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{
    FIXTURE_ADMIN_EMAIL, FIXTURE_ADMIN_ID, FixtureIdentityProvider, IdentityProvider,
    IdentityProviderError, SignInResult, SignUpResult,
};
#[cfg(test)]
pub use notice_sink::MockNoticeSink;
pub use notice_sink::{NoticeSink, RecordingNoticeSink};
#[cfg(test)]
pub use object_storage::MockObjectStorage;
pub use object_storage::{ObjectKey, ObjectStorage, ObjectStorageError, ObjectUpload, SignedUrl};
#[cfg(test)]
pub use payment_gateway::{MockPaymentGateway, MockSleeper};
pub use payment_gateway::{PaymentError, PaymentGateway, PaymentReceipt, PaymentRequest, Sleeper};
#[cfg(test)]
pub use profile_store::MockProfileStore;
pub use profile_store::{FixtureProfileStore, ProfileStore, ProfileStoreError};
#[cfg(test)]
pub use session_store::{MockSessionStore, MockSlotStorage};
pub use session_store::{
    SessionStore, SessionStoreError, SlotStorage, SlotStorageError, TOKEN_SLOT, USER_RECORD_SLOT,
};
