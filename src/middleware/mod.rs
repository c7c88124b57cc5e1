//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers. They can
//! authenticate requests, attach context for handlers, or short-circuit
//! unauthorized requests.

/// API key authentication middleware
pub mod auth;
