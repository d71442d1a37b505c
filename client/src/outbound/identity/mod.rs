//! Hosted identity service adapters.
//!
//! This module provides a thin HTTP implementation of the
//! `IdentityProvider` and `ProfileStore` ports.

mod dto;
mod rest_client;

pub use rest_client::RestIdentityClient;
