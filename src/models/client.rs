//! Client model: the people who buy packages and attend sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::double_option;

/// Represents a client record from the database.
///
/// A client may be assigned to one trainer. Trainers only see the clients
/// assigned to them.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Client {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub trainer_id: Option<Uuid>,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list matching [`Client`].
pub const CLIENT_COLUMNS: &str =
    "id, organization_id, trainer_id, full_name, email, phone, is_active, created_at, updated_at";

/// Request body for creating a client.
///
/// Trainers creating a client are assigned to it automatically.
#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub trainer_id: Option<Uuid>,
}

/// Partial update. Absent fields are left alone; `"trainer_id": null` unassigns.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateClientRequest {
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub trainer_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}

/// Query string for `GET /api/v1/clients`.
#[derive(Debug, Default, Deserialize)]
pub struct ClientQuery {
    pub trainer_id: Option<Uuid>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Serialize)]
pub struct ClientResponse {
    pub id: Uuid,
    pub trainer_id: Option<Uuid>,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Client> for ClientResponse {
    fn from(client: Client) -> Self {
        Self {
            id: client.id,
            trainer_id: client.trainer_id,
            full_name: client.full_name,
            email: client.email,
            phone: client.phone,
            is_active: client.is_active,
            created_at: client.created_at,
            updated_at: client.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_distinguishes_null_from_absent() {
        let unassign: UpdateClientRequest =
            serde_json::from_str(r#"{"trainer_id": null}"#).unwrap();
        assert_eq!(unassign.trainer_id, Some(None));

        let untouched: UpdateClientRequest =
            serde_json::from_str(r#"{"full_name": "Ada"}"#).unwrap();
        assert_eq!(untouched.trainer_id, None);
        assert_eq!(untouched.full_name.as_deref(), Some("Ada"));
    }
}
