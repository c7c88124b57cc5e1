//! API key authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the API key from the Authorization header
//! 2. Hash it and look up the active key and its active user
//! 3. Inject an [`AuthContext`] (user, organization, role) into the request
//! 4. Reject unauthorized requests with HTTP 401

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        api_key::{ApiKeyOwner, hash_api_key},
        user::Role,
    },
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Authentication context attached to authenticated requests.
///
/// Handlers extract it with `Extension<AuthContext>`. Every tenant query is
/// filtered by `organization_id`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub api_key_id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub full_name: String,
    pub role: Role,
}

impl AuthContext {
    pub fn is_manager(&self) -> bool {
        self.role.is_manager()
    }

    /// Fail with 403 unless the caller is an owner or admin.
    pub fn require_manager(&self) -> Result<(), AppError> {
        if self.is_manager() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Fail with 403 unless the caller is a manager or is `user_id` itself.
    pub fn require_self_or_manager(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.is_manager() || self.user_id == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Trainer whose data a request is about.
    ///
    /// Managers may name any trainer (or default to themselves); trainers are
    /// always pinned to themselves and get 403 when asking for someone else.
    pub fn scoped_trainer(&self, requested: Option<Uuid>) -> Result<Uuid, AppError> {
        match requested {
            Some(id) if id != self.user_id => {
                self.require_manager()?;
                Ok(id)
            }
            _ => Ok(self.user_id),
        }
    }

    /// Trainer filter for list queries: `None` means "everyone" (managers only).
    pub fn trainer_filter(&self, requested: Option<Uuid>) -> Result<Option<Uuid>, AppError> {
        if self.is_manager() {
            Ok(requested)
        } else {
            self.scoped_trainer(requested).map(Some)
        }
    }
}

/// Extract the bearer token from an `Authorization` header value.
fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// API key authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <key>` header from request
/// 2. Hash the `<key>` using SHA-256
/// 3. Query for a matching active key whose user is active
/// 4. If found: inject `AuthContext` into request, call next handler
/// 5. If not found: return 401 Unauthorized error
pub async fn auth_middleware(
    State(pool): State<DbPool>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or(AppError::InvalidApiKey)?;

    let key_hash = hash_api_key(api_key);

    let owner = sqlx::query_as::<_, ApiKeyOwner>(
        r#"
        SELECT k.id AS api_key_id, u.id AS user_id, u.organization_id, u.full_name, u.role
        FROM api_keys k
        JOIN users u ON u.id = k.user_id
        WHERE k.key_hash = $1 AND k.is_active = true AND u.is_active = true
        "#,
    )
    .bind(&key_hash)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::InvalidApiKey)?;

    let auth_context = AuthContext {
        api_key_id: owner.api_key_id,
        user_id: owner.user_id,
        organization_id: owner.organization_id,
        full_name: owner.full_name,
        role: owner.role,
    };

    tracing::debug!(
        user_id = %auth_context.user_id,
        organization_id = %auth_context.organization_id,
        role = %auth_context.role,
        "request authenticated"
    );

    // Route handlers can now extract this using Extension<AuthContext>
    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(role: Role) -> AuthContext {
        AuthContext {
            api_key_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            full_name: "Test User".to_string(),
            role,
        }
    }

    #[test]
    fn parses_bearer_tokens() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc123"), None);
        assert_eq!(bearer_token("abc123"), None);
    }

    #[test]
    fn trainers_are_pinned_to_themselves() {
        let trainer = context(Role::Trainer);
        let other = Uuid::new_v4();

        assert_eq!(trainer.scoped_trainer(None).unwrap(), trainer.user_id);
        assert_eq!(
            trainer.scoped_trainer(Some(trainer.user_id)).unwrap(),
            trainer.user_id
        );
        assert!(matches!(
            trainer.scoped_trainer(Some(other)),
            Err(AppError::Forbidden)
        ));
        assert_eq!(
            trainer.trainer_filter(None).unwrap(),
            Some(trainer.user_id)
        );
    }

    #[test]
    fn managers_may_scope_to_anyone() {
        let admin = context(Role::Admin);
        let other = Uuid::new_v4();

        assert_eq!(admin.scoped_trainer(Some(other)).unwrap(), other);
        assert_eq!(admin.trainer_filter(None).unwrap(), None);
        assert!(admin.require_manager().is_ok());
        assert!(context(Role::Trainer).require_manager().is_err());
    }

    #[test]
    fn self_access_is_allowed() {
        let trainer = context(Role::Trainer);
        assert!(trainer.require_self_or_manager(trainer.user_id).is_ok());
        assert!(trainer.require_self_or_manager(Uuid::new_v4()).is_err());
    }
}
