//! # tenantbox-api
//!
//! HTTP layer translating requests into lifecycle coordinator calls.
//!
//! | Method + path | Body | Success |
//! |---|---|---|
//! | `POST /containers/start` | `{identity}` | `200 {message}` |
//! | `POST /containers/stop` | `{identity}` | `200 {message}` |
//! | `POST /containers/exec` | `{identity, argv}` | `200 {message, stdout, stderr, exit_code}` |
//! | `GET /containers/{identity}/status` | | `200 {status}` |

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod api;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;
