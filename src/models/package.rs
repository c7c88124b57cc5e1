//! Prepaid session packages.
//!
//! A package is a bundle of sessions sold to a client for a fixed price.
//! Logging a session against a package consumes one credit; cancelling the
//! session gives it back.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::commission::money::{MAX_AMOUNT_CENTS, per_session_value};

/// Packages with this many sessions left (or fewer) are flagged as running low.
pub const LOW_REMAINING_SESSIONS: i32 = 2;

/// A package row together with the completed payments made against it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Package {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub client_id: Uuid,
    pub trainer_id: Option<Uuid>,
    pub name: String,
    pub total_sessions: i32,
    pub remaining_sessions: i32,
    pub price_cents: i64,
    pub expires_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Sum of completed payments with this `package_id`
    pub paid_cents: i64,
}

/// Select list for [`Package`], expects the `packages` table aliased as `p`.
pub const PACKAGE_SELECT: &str = r#"
    SELECT p.id, p.organization_id, p.client_id, p.trainer_id, p.name,
           p.total_sessions, p.remaining_sessions, p.price_cents, p.expires_on,
           p.created_at, p.updated_at,
           COALESCE((
               SELECT SUM(pay.amount_cents) FROM payments pay
               WHERE pay.package_id = p.id AND pay.status = 'completed'
           ), 0)::BIGINT AS paid_cents
    FROM packages p
"#;

impl Package {
    /// Value credited to each session logged against this package.
    pub fn session_value_cents(&self) -> i64 {
        per_session_value(self.price_cents, self.total_sessions)
    }

    pub fn is_expired_on(&self, day: NaiveDate) -> bool {
        self.expires_on.is_some_and(|expiry| day > expiry)
    }

    pub fn outstanding_cents(&self) -> i64 {
        (self.price_cents - self.paid_cents).max(0)
    }

    pub fn is_running_low(&self) -> bool {
        self.remaining_sessions <= LOW_REMAINING_SESSIONS
    }
}

/// Request body for selling a package to a client.
///
/// ```json
/// {
///   "client_id": "550e8400-e29b-41d4-a716-446655440000",
///   "name": "10 x 60min",
///   "total_sessions": 10,
///   "price_cents": 90000,
///   "expires_on": "2026-06-30"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreatePackageRequest {
    pub client_id: Uuid,
    pub trainer_id: Option<Uuid>,
    pub name: String,
    pub total_sessions: i32,
    pub price_cents: i64,
    pub expires_on: Option<NaiveDate>,
}

impl CreatePackageRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Package name is required".to_string());
        }
        if self.total_sessions <= 0 {
            return Err("total_sessions must be positive".to_string());
        }
        if self.price_cents < 0 {
            return Err("price_cents must not be negative".to_string());
        }
        if self.price_cents > MAX_AMOUNT_CENTS {
            return Err(format!("price_cents must not exceed {MAX_AMOUNT_CENTS}"));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PackageQuery {
    pub client_id: Option<Uuid>,
    /// Only packages with credits left
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Serialize)]
pub struct PackageResponse {
    pub id: Uuid,
    pub client_id: Uuid,
    pub trainer_id: Option<Uuid>,
    pub name: String,
    pub total_sessions: i32,
    pub remaining_sessions: i32,
    pub price_cents: i64,
    pub session_value_cents: i64,
    pub paid_cents: i64,
    pub outstanding_cents: i64,
    pub expires_on: Option<NaiveDate>,
    pub expired: bool,
    pub running_low: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Package> for PackageResponse {
    fn from(package: Package) -> Self {
        Self {
            expired: package.is_expired_on(Utc::now().date_naive()),
            running_low: package.is_running_low(),
            session_value_cents: package.session_value_cents(),
            outstanding_cents: package.outstanding_cents(),
            id: package.id,
            client_id: package.client_id,
            trainer_id: package.trainer_id,
            name: package.name,
            total_sessions: package.total_sessions,
            remaining_sessions: package.remaining_sessions,
            price_cents: package.price_cents,
            paid_cents: package.paid_cents,
            expires_on: package.expires_on,
            created_at: package.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(price_cents: i64, total: i32, remaining: i32, paid_cents: i64) -> Package {
        Package {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            trainer_id: None,
            name: "Starter".to_string(),
            total_sessions: total,
            remaining_sessions: remaining,
            price_cents,
            expires_on: NaiveDate::from_ymd_opt(2025, 6, 30),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            paid_cents,
        }
    }

    #[test]
    fn derives_session_value_and_balance() {
        let p = package(90_000, 10, 10, 30_000);
        assert_eq!(p.session_value_cents(), 9_000);
        assert_eq!(p.outstanding_cents(), 60_000);

        let overpaid = package(50_000, 5, 5, 60_000);
        assert_eq!(overpaid.outstanding_cents(), 0);
    }

    #[test]
    fn expiry_is_inclusive_of_last_day() {
        let p = package(10_000, 1, 1, 0);
        assert!(!p.is_expired_on(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()));
        assert!(p.is_expired_on(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()));
    }

    #[test]
    fn flags_low_packages() {
        assert!(package(1, 10, 2, 0).is_running_low());
        assert!(!package(1, 10, 3, 0).is_running_low());
        // exhausted packages still need renewing
        assert!(package(1, 10, 0, 0).is_running_low());
    }

    #[test]
    fn validates_create_request() {
        let mut req = CreatePackageRequest {
            client_id: Uuid::new_v4(),
            trainer_id: None,
            name: "5 pack".to_string(),
            total_sessions: 5,
            price_cents: 40_000,
            expires_on: None,
        };
        assert!(req.validate().is_ok());

        req.total_sessions = 0;
        assert!(req.validate().is_err());

        req.total_sessions = 5;
        req.name = "   ".to_string();
        assert!(req.validate().is_err());

        req.name = "5 pack".to_string();
        req.price_cents = i64::MAX;
        assert!(req.validate().is_err());
    }
}
