//! Outbound adapters implementing the domain ports.
//!
//! Purpose: reach the world outside the client. Each submodule implements
//! one or more traits from `crate::domain::ports` and translates transport
//! failures into the port's error enum.
//!
//! Public surface:
//! - `storage` — slot backends for the persisted session.
//! - `identity` — REST identity provider and profile store.
//! - `object_storage` — S3-compatible and in-memory asset stores.
//! - `payment` — simulated card payments.

pub mod identity;
pub mod object_storage;
pub mod payment;
pub mod storage;
