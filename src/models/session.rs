//! Logged training sessions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text_enum;

/// Outcome of a session.
///
/// No-shows consume a package credit and count toward commission like a
/// completed session; cancelled sessions do neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Completed,
    NoShow,
    Cancelled,
}

text_enum!(SessionStatus, "session status", {
    Completed => "completed",
    NoShow => "no_show",
    Cancelled => "cancelled",
});

impl SessionStatus {
    pub fn counts_toward_commission(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::NoShow)
    }
}

/// Represents a session record from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrainingSession {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub trainer_id: Uuid,
    pub client_id: Uuid,
    pub package_id: Option<Uuid>,
    pub session_at: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: SessionStatus,

    /// Snapshot of the package's per-session value when the session was logged
    pub session_value_cents: i64,

    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Column list matching [`TrainingSession`].
pub const SESSION_COLUMNS: &str = "id, organization_id, trainer_id, client_id, package_id, \
     session_at, status, session_value_cents, notes, created_by, created_at";

/// Request body for logging a session.
///
/// ```json
/// {
///   "client_id": "550e8400-e29b-41d4-a716-446655440000",
///   "package_id": "660e8400-e29b-41d4-a716-446655440001",
///   "session_at": "2025-12-21T16:00:00Z",
///   "status": "completed",
///   "notes": "Deadlift PR"
/// }
/// ```
///
/// `trainer_id` defaults to the caller; only managers may log for someone else.
#[derive(Debug, Deserialize)]
pub struct LogSessionRequest {
    pub client_id: Uuid,
    pub trainer_id: Option<Uuid>,
    pub package_id: Option<Uuid>,
    pub session_at: DateTime<Utc>,
    #[serde(default = "default_status")]
    pub status: SessionStatus,
    pub notes: Option<String>,
}

fn default_status() -> SessionStatus {
    SessionStatus::Completed
}

/// Query string for `GET /api/v1/sessions`. Dates are inclusive.
#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    pub trainer_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<SessionStatus>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub trainer_id: Uuid,
    pub client_id: Uuid,
    pub package_id: Option<Uuid>,
    pub session_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub session_value_cents: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<TrainingSession> for SessionResponse {
    fn from(session: TrainingSession) -> Self {
        Self {
            id: session.id,
            trainer_id: session.trainer_id,
            client_id: session.client_id,
            package_id: session.package_id,
            session_at: session.session_at,
            status: session.status,
            session_value_cents: session.session_value_cents,
            notes: session.notes,
            created_at: session.created_at,
        }
    }
}
