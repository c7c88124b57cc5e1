//! Staff users and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text_enum;

/// Role of a staff user within an organization.
///
/// Owners and admins are managers: they see all data of the organization.
/// Trainers only see their own clients, sessions, payments and commission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Admin,
    Trainer,
}

text_enum!(Role, "role", {
    Owner => "owner",
    Admin => "admin",
    Trainer => "trainer",
});

impl Role {
    pub fn is_manager(self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }

    /// Whether a user with this role may create users with `target` role.
    ///
    /// Only owners may create other managers.
    pub fn can_create(self, target: Role) -> bool {
        match self {
            Role::Owner => true,
            Role::Admin => target == Role::Trainer,
            Role::Trainer => false,
        }
    }
}

/// Represents a user record from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub full_name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub commission_profile_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list matching [`User`].
pub const USER_COLUMNS: &str = "id, organization_id, email, full_name, role, \
     commission_profile_id, is_active, created_at, updated_at";

/// Request body for creating a user.
///
/// ```json
/// {
///   "email": "sam@studio.example",
///   "full_name": "Sam Rivera",
///   "role": "trainer"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub full_name: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Trainer
}

/// Request body for assigning (or clearing) a trainer's commission profile.
#[derive(Debug, Deserialize)]
pub struct AssignProfileRequest {
    pub commission_profile_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub commission_profile_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            commission_profile_id: user.commission_profile_id,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// Returned once when a user is created: the user plus their API key.
#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    pub user: UserResponse,
    pub api_key: String,
}

/// Normalize and minimally validate an email address.
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.')
    {
        return None;
    }
    if email.chars().any(char::is_whitespace) {
        return None;
    }
    Some(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managers_and_creation_rights() {
        assert!(Role::Owner.is_manager());
        assert!(Role::Admin.is_manager());
        assert!(!Role::Trainer.is_manager());

        assert!(Role::Owner.can_create(Role::Admin));
        assert!(Role::Admin.can_create(Role::Trainer));
        assert!(!Role::Admin.can_create(Role::Owner));
        assert!(!Role::Trainer.can_create(Role::Trainer));
    }

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!(Role::try_from("admin".to_string()), Ok(Role::Admin));
        assert_eq!(Role::Trainer.to_string(), "trainer");
        assert!("coach".parse::<Role>().is_err());
    }

    #[test]
    fn normalizes_emails() {
        assert_eq!(
            normalize_email("  Sam@Studio.Example "),
            Some("sam@studio.example".to_string())
        );
        assert_eq!(normalize_email("no-at-sign"), None);
        assert_eq!(normalize_email("@studio.example"), None);
        assert_eq!(normalize_email("sam@localhost"), None);
        assert_eq!(normalize_email("sa m@studio.example"), None);
    }

    #[test]
    fn role_defaults_to_trainer() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"email":"a@b.co","full_name":"A"}"#).unwrap();
        assert_eq!(req.role, Role::Trainer);
    }
}
