//! Inbound adapters that drive the session core.
//!
//! [`navigator`] applies guard decisions and sign-out results to the
//! current location; [`app`] composes the core over its ports; [`cli`]
//! exposes both as commands.

pub mod app;
pub mod cli;
pub mod navigator;

pub use app::{App, AppPorts, FIXTURE_BUCKET};
pub use navigator::{MAX_REDIRECTS, NavigationError, NavigationOutcome, Navigator, Redirect};
