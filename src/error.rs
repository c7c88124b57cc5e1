//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::commission::{PeriodError, PlanError};

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error code.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Authentication Errors**: Invalid or missing API keys, insufficient role
/// - **Resource Errors**: Requested resources not found in the caller's organization
/// - **Business Logic Errors**: Exhausted or expired packages, conflicting records
/// - **Validation Errors**: Invalid request data, commission plans or periods
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// API key is missing, invalid, or inactive.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// The caller's role may not perform this operation.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("You do not have permission to perform this action")]
    Forbidden,

    /// Requested record does not exist or belongs to another organization.
    ///
    /// Returns HTTP 404 Not Found. The payload names the kind of record.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Record would violate a uniqueness rule or is still referenced.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("{0}")]
    Conflict(String),

    /// Package has no sessions left.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Package has no remaining sessions")]
    PackageExhausted,

    /// Package expired before the session date.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Package has expired")]
    PackageExpired,

    /// Commission profile tiers failed validation.
    #[error("Invalid commission plan: {0}")]
    InvalidPlan(#[from] PlanError),

    /// Billing period bounds are invalid.
    #[error("Invalid period: {0}")]
    InvalidPeriod(#[from] PeriodError),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Server-side failure outside the database, such as encoding a stored
    /// snapshot.
    ///
    /// Returns HTTP 500. The detail is logged, never sent to the client.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and stable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "invalid_api_key"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::PackageExhausted => {
                (StatusCode::UNPROCESSABLE_ENTITY, "package_exhausted")
            }
            AppError::PackageExpired => (StatusCode::UNPROCESSABLE_ENTITY, "package_expired"),
            AppError::InvalidPlan(_) => (StatusCode::BAD_REQUEST, "invalid_commission_plan"),
            AppError::InvalidPeriod(_) => (StatusCode::BAD_REQUEST, "invalid_period"),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::Database(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

/// Map a unique-constraint violation to `Conflict`, pass everything else through.
pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Database errors are logged and replaced by a generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match self {
            AppError::InvalidRequest(ref msg) => msg.clone(),
            AppError::Database(ref err) => {
                tracing::error!(error = %err, "database error while handling request");
                "An internal error occurred".to_string()
            }
            AppError::Internal(ref detail) => {
                tracing::error!(error = %detail, "internal error while handling request");
                "An internal error occurred".to_string()
            }
            ref other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_business_errors_to_statuses() {
        assert_eq!(
            AppError::PackageExhausted.status_and_code(),
            (StatusCode::UNPROCESSABLE_ENTITY, "package_exhausted")
        );
        assert_eq!(
            AppError::NotFound("Client").status_and_code().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidPlan(PlanError::NoTiers).status_and_code(),
            (StatusCode::BAD_REQUEST, "invalid_commission_plan")
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status_and_code().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_name_the_resource() {
        assert_eq!(AppError::NotFound("Package").to_string(), "Package not found");
        assert_eq!(
            AppError::InvalidPeriod(PeriodError::Inverted).to_string(),
            "Invalid period: period_start must not be after period_end"
        );
    }

    #[tokio::test]
    async fn internal_errors_are_500_without_details() {
        let err = AppError::Internal("breakdown encoding failed".to_string());
        assert_eq!(
            err.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        );

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "internal_error");
        assert_eq!(body["error"]["message"], "An internal error occurred");
    }

    #[test]
    fn non_unique_errors_stay_database_errors() {
        let err = conflict_on_unique(sqlx::Error::RowNotFound, "duplicate");
        assert!(matches!(err, AppError::Database(_)));
    }
}
