//! # HTTP Middleware
//!
//! Request-path middleware layers. Session verification lives in
//! [`crate::auth`] because it is wired per-router rather than globally.

pub mod metrics;
