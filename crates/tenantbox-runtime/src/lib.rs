//! Per-user container lifecycle management for tenantbox.
//!
//! The [`coordinator::Coordinator`] is the entry point: it serializes
//! lifecycle operations per [`UserIdentity`](tenantbox_common::types::UserIdentity),
//! reads fresh state through the [`observer`], and drives a
//! [`backend::RuntimeAdapter`].

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod backend;
pub mod coordinator;
pub mod exec;
pub mod observer;
pub mod state;
