//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, query string)
//! 2. Delegates to a service with the caller's `AuthContext`
//! 3. Returns HTTP response (JSON, status code)

/// Client management endpoints
pub mod clients;
/// Commission profile, calculation and run endpoints
pub mod commissions;
/// Role-specific dashboard endpoint
pub mod dashboard;
/// Service health endpoint
pub mod health;
/// Signup, organization and onboarding endpoints
pub mod organizations;
/// Session package endpoints
pub mod packages;
/// Payment tracking endpoints
pub mod payments;
/// Session logging endpoints
pub mod sessions;
/// Staff user endpoints
pub mod users;
