//! Payments received from clients.
//!
//! Payments are the "sales" side of commission: a completed payment
//! attributed to a trainer counts toward that trainer's sales volume.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Cash,
    BankTransfer,
    Other,
}

text_enum!(PaymentMethod, "payment method", {
    Card => "card",
    Cash => "cash",
    BankTransfer => "bank_transfer",
    Other => "other",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
    Refunded,
}

text_enum!(PaymentStatus, "payment status", {
    Completed => "completed",
    Refunded => "refunded",
});

/// Represents a payment record from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub client_id: Uuid,
    pub package_id: Option<Uuid>,

    /// Trainer credited with this sale, if any
    pub trainer_id: Option<Uuid>,

    pub amount_cents: i64,
    #[sqlx(try_from = "String")]
    pub method: PaymentMethod,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    pub paid_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Column list matching [`Payment`].
pub const PAYMENT_COLUMNS: &str = "id, organization_id, client_id, package_id, trainer_id, \
     amount_cents, method, status, paid_at, notes, created_at";

/// Request body for recording a payment.
///
/// ```json
/// {
///   "client_id": "550e8400-e29b-41d4-a716-446655440000",
///   "package_id": "660e8400-e29b-41d4-a716-446655440001",
///   "amount_cents": 90000,
///   "method": "card"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub client_id: Uuid,
    pub package_id: Option<Uuid>,
    pub trainer_id: Option<Uuid>,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Query string for `GET /api/v1/payments`. Dates are inclusive.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentQuery {
    pub client_id: Option<Uuid>,
    pub trainer_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub client_id: Uuid,
    pub package_id: Option<Uuid>,
    pub trainer_id: Option<Uuid>,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub paid_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            client_id: payment.client_id,
            package_id: payment.package_id,
            trainer_id: payment.trainer_id,
            amount_cents: payment.amount_cents,
            method: payment.method,
            status: payment.status,
            paid_at: payment.paid_at,
            notes: payment.notes,
            created_at: payment.created_at,
        }
    }
}

/// Pick the trainer a payment is credited to.
///
/// Order: explicit trainer on the request, then the package's trainer, then
/// the client's assigned trainer.
pub fn resolve_attribution(
    explicit: Option<Uuid>,
    package_trainer: Option<Uuid>,
    client_trainer: Option<Uuid>,
) -> Option<Uuid> {
    explicit.or(package_trainer).or(client_trainer)
}
