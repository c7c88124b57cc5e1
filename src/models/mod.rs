//! Data models representing database entities and API payloads.
//!
//! Row structs map to database tables via `sqlx::FromRow`; request and
//! response structs are the JSON shapes exchanged with the web UI.

use serde::{Deserialize, Deserializer};

pub use crate::text_enum::UnknownVariant;
pub(crate) use crate::text_enum::text_enum;

/// Distinguishes an absent JSON field (`None`) from an explicit `null` (`Some(None)`).
///
/// Use together with `#[serde(default)]`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// API key authentication model
pub mod api_key;
/// Client (trainee) model
pub mod client;
/// Commission profiles, tiers and saved runs
pub mod commission;
/// Role-specific dashboard views
pub mod dashboard;
/// Organization (tenant) model and onboarding checklist
pub mod organization;
/// Prepaid session packages
pub mod package;
/// Payments received from clients
pub mod payment;
/// Logged training sessions
pub mod session;
/// Staff users and roles
pub mod user;
