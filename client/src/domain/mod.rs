//! Session core and use-case services.
//!
//! Purpose: hold the authoritative client session, decide navigation
//! admission, and orchestrate the external collaborators reached through
//! [`ports`]. Nothing here performs I/O directly.
//!
//! Public surface:
//! - `SessionState` — in-memory session, entitlements and bootstrap.
//! - `NavigationGuard` — per-navigation admission decisions.
//! - `RouteTable` / `Location` — static route metadata and targets.
//! - `AuthService`, `CheckoutService`, `AssetService` — use-cases.
//! - `Error` / `ErrorCode` — errors returned to the UI layer.

pub mod assets;
pub mod auth;
pub mod auth_service;
pub mod checkout;
pub mod entitlements;
pub mod error;
pub mod events;
pub mod guard;
pub mod persisted_session;
pub mod ports;
pub mod routes;
pub mod session;
pub mod session_state;
#[cfg(test)]
pub mod test_utils;
pub mod user;

pub use self::assets::{AssetFile, AssetService, DEFAULT_FOLDER, DEFAULT_SIGNED_URL_TTL};
pub use self::auth::{
    AccessToken, EmptyTokenError, LoginCredentials, LoginValidationError, SignUpForm,
};
pub use self::auth_service::{AuthService, Registration};
pub use self::checkout::{CheckoutService, PurchaseOutcome};
pub use self::entitlements::{EmptyItemIdError, EntitlementSet, ItemId};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::events::{SessionEvent, SessionEvents};
pub use self::guard::{ADMIN_ONLY_MESSAGE, Admission, DenialReason, NavigationGuard, Notice};
pub use self::persisted_session::PersistedSessionStore;
pub use self::routes::{
    LOGIN_PATH, Location, LocationError, REDIRECT_PARAM, ROOT_PATH, RouteDefinition,
    RouteRequirement, RouteTable, UPDATE_PASSWORD_PATH,
};
pub use self::session::{PersistedSession, Session};
pub use self::session_state::{
    BootstrapError, BootstrapOutcome, SessionGeneration, SessionState, SignedOut,
};
pub use self::user::{
    DEFAULT_PROFILE_NAME, GUEST_DISPLAY_NAME, Profile, Role, UserId, UserRecord,
    UserValidationError,
};
