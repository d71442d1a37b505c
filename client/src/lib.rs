//! Session, entitlement and navigation-admission core for the materials
//! marketplace client.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;

pub use config::ClientSettings;
