//! End-to-end studio flows against a real Postgres.
//!
//! Each test signs up its own organization, so tests can share one database.
//! They are skipped when `DATABASE_URL` is not set:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/pt_studio_test cargo test --test studio_flow
//! ```

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use pt_studio_server::{
    commission::{CalculationMethod, Period, Tier, TriggerType},
    db::{self, DbPool},
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        client::{Client, CreateClientRequest},
        commission::{CalculateQuery, CommissionProfileRequest},
        organization::{CreateOrganizationRequest, SignupResponse},
        package::{CreatePackageRequest, Package},
        payment::{PaymentMethod, RecordPaymentRequest},
        session::{LogSessionRequest, SessionStatus},
        user::{CreateUserRequest, Role},
    },
    routes,
    services::{
        client_service, commission_service, organization_service, package_service,
        payment_service, session_service, user_service,
    },
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

async fn pool() -> Option<DbPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .expect("connect to DATABASE_URL");
    db::run_migrations(&pool).await.expect("migrations");
    Some(pool)
}

/// A fresh organization with one trainer and one client assigned to them.
struct Studio {
    owner: AuthContext,
    trainer: AuthContext,
    trainer_api_key: String,
    client: Client,
}

fn auth_for(signup: &SignupResponse, user_id: Uuid, full_name: &str, role: Role) -> AuthContext {
    AuthContext {
        api_key_id: Uuid::new_v4(),
        user_id,
        organization_id: signup.organization.id,
        full_name: full_name.to_string(),
        role,
    }
}

async fn signup(pool: &DbPool, name: &str) -> SignupResponse {
    organization_service::signup(
        pool,
        CreateOrganizationRequest {
            name: name.to_string(),
            slug: None,
            timezone: "UTC".to_string(),
            owner_email: "owner@studio.test".to_string(),
            owner_name: "Olive Owner".to_string(),
        },
    )
    .await
    .expect("signup")
}

async fn studio(pool: &DbPool) -> Studio {
    let signup = signup(pool, &format!("Flow Studio {}", Uuid::new_v4())).await;
    let owner = auth_for(&signup, signup.owner.id, "Olive Owner", Role::Owner);

    let created = user_service::create_user(
        pool,
        &owner,
        CreateUserRequest {
            email: "sam@studio.test".to_string(),
            full_name: "Sam Rivera".to_string(),
            role: Role::Trainer,
        },
    )
    .await
    .expect("create trainer");
    let trainer = auth_for(&signup, created.user.id, "Sam Rivera", Role::Trainer);

    let client = client_service::create_client(
        pool,
        &owner,
        CreateClientRequest {
            full_name: "Casey Client".to_string(),
            email: None,
            phone: None,
            trainer_id: Some(trainer.user_id),
        },
    )
    .await
    .expect("create client");

    Studio {
        owner,
        trainer,
        trainer_api_key: created.api_key,
        client,
    }
}

async fn package(pool: &DbPool, studio: &Studio, total_sessions: i32, price_cents: i64) -> Package {
    package_service::create_package(
        pool,
        &studio.owner,
        CreatePackageRequest {
            client_id: studio.client.id,
            trainer_id: Some(studio.trainer.user_id),
            name: format!("{total_sessions} pack"),
            total_sessions,
            price_cents,
            expires_on: None,
        },
    )
    .await
    .expect("create package")
}

fn session_on(studio: &Studio, package_id: Option<Uuid>) -> LogSessionRequest {
    LogSessionRequest {
        client_id: studio.client.id,
        trainer_id: Some(studio.trainer.user_id),
        package_id,
        session_at: Utc::now(),
        status: SessionStatus::Completed,
        notes: None,
    }
}

async fn remaining(pool: &DbPool, studio: &Studio, package_id: Uuid) -> i32 {
    package_service::fetch_package(pool, studio.owner.organization_id, package_id)
        .await
        .expect("fetch package")
        .remaining_sessions
}

#[tokio::test]
async fn logging_draws_down_the_package_and_cancelling_restores_it() {
    let Some(pool) = pool().await else { return };
    let studio = studio(&pool).await;
    let pack = package(&pool, &studio, 2, 10_000).await;

    let first = session_service::log_session(&pool, &studio.owner, session_on(&studio, Some(pack.id)))
        .await
        .expect("first session");
    assert_eq!(first.session_value_cents, 5_000);
    assert_eq!(remaining(&pool, &studio, pack.id).await, 1);

    session_service::log_session(&pool, &studio.owner, session_on(&studio, Some(pack.id)))
        .await
        .expect("second session");
    assert_eq!(remaining(&pool, &studio, pack.id).await, 0);

    let exhausted =
        session_service::log_session(&pool, &studio.owner, session_on(&studio, Some(pack.id))).await;
    assert!(matches!(exhausted, Err(AppError::PackageExhausted)));
    assert_eq!(remaining(&pool, &studio, pack.id).await, 0);

    let cancelled = session_service::cancel_session(&pool, &studio.owner, first.id)
        .await
        .expect("cancel");
    assert_eq!(cancelled.status, SessionStatus::Cancelled);
    assert_eq!(remaining(&pool, &studio, pack.id).await, 1);

    let again = session_service::cancel_session(&pool, &studio.owner, first.id).await;
    assert!(matches!(again, Err(AppError::InvalidRequest(_))));
    assert_eq!(remaining(&pool, &studio, pack.id).await, 1);
}

#[tokio::test]
async fn cancelling_never_restores_past_the_package_total() {
    let Some(pool) = pool().await else { return };
    let studio = studio(&pool).await;
    let pack = package(&pool, &studio, 2, 10_000).await;

    let session =
        session_service::log_session(&pool, &studio.owner, session_on(&studio, Some(pack.id)))
            .await
            .expect("session");

    // Simulate a manual top-up back to full before the cancel lands
    sqlx::query("UPDATE packages SET remaining_sessions = total_sessions WHERE id = $1")
        .bind(pack.id)
        .execute(&pool)
        .await
        .expect("top up");

    session_service::cancel_session(&pool, &studio.owner, session.id)
        .await
        .expect("cancel");
    assert_eq!(remaining(&pool, &studio, pack.id).await, 2);
}

#[tokio::test]
async fn concurrent_logging_cannot_overdraw_a_package() {
    let Some(pool) = pool().await else { return };
    let studio = studio(&pool).await;
    let pack = package(&pool, &studio, 3, 9_000).await;

    let attempts: Vec<_> = (0..6)
        .map(|_| {
            let pool = pool.clone();
            let owner = studio.owner.clone();
            let request = session_on(&studio, Some(pack.id));
            tokio::spawn(async move { session_service::log_session(&pool, &owner, request).await })
        })
        .collect();

    let mut logged = 0;
    let mut exhausted = 0;
    for attempt in attempts {
        match attempt.await.expect("task") {
            Ok(_) => logged += 1,
            Err(AppError::PackageExhausted) => exhausted += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(logged, 3);
    assert_eq!(exhausted, 3);
    assert_eq!(remaining(&pool, &studio, pack.id).await, 0);
}

#[tokio::test]
async fn refunded_payments_stop_counting_as_sales() {
    let Some(pool) = pool().await else { return };
    let studio = studio(&pool).await;
    let period = Period::month_of(Utc::now().date_naive());

    let payment = payment_service::record_payment(
        &pool,
        &studio.owner,
        RecordPaymentRequest {
            client_id: studio.client.id,
            package_id: None,
            trainer_id: None,
            amount_cents: 50_000,
            method: PaymentMethod::Card,
            paid_at: None,
            notes: None,
        },
    )
    .await
    .expect("record payment");
    // credited to the client's trainer
    assert_eq!(payment.trainer_id, Some(studio.trainer.user_id));

    let sales = || {
        payment_service::attributed_sales_cents(
            &pool,
            studio.owner.organization_id,
            studio.trainer.user_id,
            period.starts_at(),
            period.ends_before(),
        )
    };
    assert_eq!(sales().await.expect("sales"), 50_000);

    payment_service::refund_payment(&pool, &studio.owner, payment.id)
        .await
        .expect("refund");
    assert_eq!(sales().await.expect("sales"), 0);

    let again = payment_service::refund_payment(&pool, &studio.owner, payment.id).await;
    assert!(matches!(again, Err(AppError::InvalidRequest(_))));
}

#[tokio::test]
async fn calculates_commission_from_logged_activity() {
    let Some(pool) = pool().await else { return };
    let studio = studio(&pool).await;
    let pack = package(&pool, &studio, 2, 10_000).await;

    let profile = commission_service::create_profile(
        &pool,
        &studio.owner,
        CommissionProfileRequest {
            name: "House rate".to_string(),
            calculation_method: CalculationMethod::Flat,
            trigger_type: TriggerType::None,
            tiers: vec![Tier {
                level: 1,
                session_threshold: 0,
                sales_threshold_cents: 0,
                session_rate_bps: 5_000,
                session_flat_fee_cents: 0,
                sales_rate_bps: 1_000,
                bonus_cents: 0,
            }],
        },
    )
    .await
    .expect("create profile");
    user_service::assign_commission_profile(
        &pool,
        studio.owner.organization_id,
        studio.trainer.user_id,
        Some(profile.id),
    )
    .await
    .expect("assign profile");

    for _ in 0..2 {
        session_service::log_session(&pool, &studio.trainer, session_on(&studio, Some(pack.id)))
            .await
            .expect("session");
    }
    payment_service::record_payment(
        &pool,
        &studio.owner,
        RecordPaymentRequest {
            client_id: studio.client.id,
            package_id: Some(pack.id),
            trainer_id: None,
            amount_cents: 20_000,
            method: PaymentMethod::Cash,
            paid_at: None,
            notes: None,
        },
    )
    .await
    .expect("payment");

    let commission = commission_service::calculate(
        &pool,
        &studio.owner,
        CalculateQuery {
            trainer_id: Some(studio.trainer.user_id),
            ..Default::default()
        },
    )
    .await
    .expect("calculate");

    let breakdown = &commission.breakdown;
    assert_eq!(commission.profile_name, "House rate");
    assert_eq!(breakdown.session_count, 2);
    assert_eq!(breakdown.session_value_cents, 10_000);
    assert_eq!(breakdown.sales_cents, 20_000);
    assert_eq!(breakdown.session_commission_cents, 5_000);
    assert_eq!(breakdown.sales_commission_cents, 2_000);
    assert_eq!(breakdown.total_cents, 7_000);

    // The trainer's dashboard shows the same estimate, through the HTTP stack
    let app = routes::router(pool.clone(), routes::cors_layer(None).expect("cors"));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/dashboard")
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", studio.trainer_api_key),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["view"], "trainer");
    assert_eq!(body["sessions_logged"], 2);
    assert_eq!(body["attributed_sales_cents"], 20_000);
    assert_eq!(body["commission_estimate"]["total_cents"], 7_000);
}

#[tokio::test]
async fn derived_slugs_are_numbered_when_taken() {
    let Some(pool) = pool().await else { return };
    let name = format!("Slug Studio {}", Uuid::new_v4());

    let first = signup(&pool, &name).await;
    let second = signup(&pool, &name).await;
    assert_eq!(
        second.organization.slug,
        format!("{}-2", first.organization.slug)
    );

    let explicit = organization_service::signup(
        &pool,
        CreateOrganizationRequest {
            name: "Someone Else".to_string(),
            slug: Some(first.organization.slug.clone()),
            timezone: "UTC".to_string(),
            owner_email: "else@studio.test".to_string(),
            owner_name: "Elliot Else".to_string(),
        },
    )
    .await;
    assert!(matches!(explicit, Err(AppError::Conflict(_))));
}
