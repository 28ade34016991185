//! Member Portal Backend Library
//!
//! Exposes the authentication core and HTTP plumbing for the server
//! binary and the integration tests.

pub mod auth;
pub mod email;
pub mod middleware;
