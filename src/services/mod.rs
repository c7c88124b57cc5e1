//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle tenant scoping, database transactions, validation and the
//! glue between stored rows and the commission engine.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

pub mod client_service;
pub mod commission_service;
pub mod dashboard_service;
pub mod organization_service;
pub mod package_service;
pub mod payment_service;
pub mod session_service;
pub mod user_service;

/// UTC instant range for inclusive `from`/`to` day filters.
///
/// `to` becomes the exclusive midnight after that day.
pub fn day_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let start = from.map(|d| d.and_time(NaiveTime::MIN).and_utc());
    let end = to
        .and_then(|d| d.checked_add_days(Days::new(1)))
        .map(|d| d.and_time(NaiveTime::MIN).and_utc());
    (start, end)
}

/// Trimmed, non-empty version of a required text field.
pub fn required_text(value: &str, field: &str) -> Result<String, crate::error::AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::AppError::InvalidRequest(format!(
            "{field} is required"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim optional text, turning blank strings into `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
