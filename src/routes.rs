//! HTTP routing table.

use axum::{
    Router,
    http::{HeaderValue, header::InvalidHeaderValue},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{db::DbPool, handlers, middleware};

/// CORS policy: a single allowed origin when configured, otherwise permissive.
pub fn cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer, InvalidHeaderValue> {
    match allowed_origin {
        Some(origin) => Ok(CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin.parse::<HeaderValue>()?))
            .allow_methods(Any)
            .allow_headers(Any)),
        None => Ok(CorsLayer::permissive()),
    }
}

/// Build the application router.
///
/// Everything under `/api/v1` except organization signup requires a bearer
/// API key; `/health` is public.
pub fn router(pool: DbPool, cors: CorsLayer) -> Router {
    // Create authenticated routes (API endpoints)
    let authenticated_routes = Router::new()
        // Organization
        .route(
            "/api/v1/organization",
            get(handlers::organizations::get_organization),
        )
        .route(
            "/api/v1/organization/onboarding",
            get(handlers::organizations::get_onboarding),
        )
        // Staff users
        .route(
            "/api/v1/users",
            post(handlers::users::create_user).get(handlers::users::list_users),
        )
        .route("/api/v1/users/{id}", get(handlers::users::get_user))
        .route(
            "/api/v1/users/{id}/commission-profile",
            put(handlers::users::assign_commission_profile),
        )
        .route(
            "/api/v1/users/{id}/api-keys",
            post(handlers::users::rotate_api_key),
        )
        // Clients
        .route(
            "/api/v1/clients",
            post(handlers::clients::create_client).get(handlers::clients::list_clients),
        )
        .route(
            "/api/v1/clients/{id}",
            get(handlers::clients::get_client).patch(handlers::clients::update_client),
        )
        // Packages
        .route(
            "/api/v1/packages",
            post(handlers::packages::create_package).get(handlers::packages::list_packages),
        )
        .route("/api/v1/packages/{id}", get(handlers::packages::get_package))
        // Sessions
        .route(
            "/api/v1/sessions",
            post(handlers::sessions::log_session).get(handlers::sessions::list_sessions),
        )
        .route(
            "/api/v1/sessions/{id}/cancel",
            post(handlers::sessions::cancel_session),
        )
        // Payments
        .route(
            "/api/v1/payments",
            post(handlers::payments::record_payment).get(handlers::payments::list_payments),
        )
        .route(
            "/api/v1/payments/{id}/refund",
            post(handlers::payments::refund_payment),
        )
        // Commission profiles
        .route(
            "/api/v1/commission-profiles",
            post(handlers::commissions::create_profile).get(handlers::commissions::list_profiles),
        )
        .route(
            "/api/v1/commission-profiles/{id}",
            get(handlers::commissions::get_profile)
                .put(handlers::commissions::update_profile)
                .delete(handlers::commissions::delete_profile),
        )
        // Commission calculation
        .route(
            "/api/v1/commissions/calculate",
            get(handlers::commissions::calculate),
        )
        .route("/api/v1/commissions/report", get(handlers::commissions::report))
        .route(
            "/api/v1/commissions/runs",
            post(handlers::commissions::create_run).get(handlers::commissions::list_runs),
        )
        .route("/api/v1/dashboard", get(handlers::dashboard::get_dashboard))
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            pool.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/v1/organizations",
            post(handlers::organizations::create_organization),
        )
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(pool)
}
