//! Organization signup and onboarding progress.

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        organization::{
            CreateOrganizationRequest, OnboardingChecklist, OnboardingCounts, Organization,
            SignupResponse, slug_candidate, slugify,
        },
        user::Role,
    },
    services::{
        required_text,
        user_service::{insert_api_key, insert_user},
    },
};

const ORGANIZATION_COLUMNS: &str = "id, name, slug, timezone, created_at, updated_at";

/// How many numbered variants of a slug derived from the name are tried.
const DERIVED_SLUG_ATTEMPTS: u32 = 20;

/// Create an organization with its owner and the owner's first API key.
///
/// # Process
///
/// 1. Validate name and derive (or validate) the slug
/// 2. Insert organization, owner user and API key in one transaction. A slug
///    derived from the name gets a `-2`, `-3`, ... suffix when taken; an
///    explicit slug that is taken fails with `Conflict`
/// 3. Return everything, including the plain API key (only time it's shown)
pub async fn signup(
    pool: &DbPool,
    request: CreateOrganizationRequest,
) -> Result<SignupResponse, AppError> {
    let name = required_text(&request.name, "name")?;
    let base_slug = slugify(request.slug.as_deref().unwrap_or(&name)).ok_or_else(|| {
        AppError::InvalidRequest("Organization slug must contain letters or digits".to_string())
    })?;
    let timezone = required_text(&request.timezone, "timezone")?;
    let attempts = if request.slug.is_some() {
        1
    } else {
        DERIVED_SLUG_ATTEMPTS
    };

    let mut tx = pool.begin().await?;

    // ON CONFLICT keeps the transaction usable between attempts
    let mut inserted = None;
    for attempt in 1..=attempts {
        let slug = slug_candidate(&base_slug, attempt);
        inserted = sqlx::query_as::<_, Organization>(&format!(
            "INSERT INTO organizations (name, slug, timezone) VALUES ($1, $2, $3) \
             ON CONFLICT (slug) DO NOTHING \
             RETURNING {ORGANIZATION_COLUMNS}"
        ))
        .bind(&name)
        .bind(&slug)
        .bind(&timezone)
        .fetch_optional(&mut *tx)
        .await?;

        if inserted.is_some() {
            break;
        }
        tracing::debug!(slug = %slug, "organization slug taken");
    }
    let organization = inserted.ok_or_else(|| {
        AppError::Conflict("An organization with this slug already exists".to_string())
    })?;

    let owner = insert_user(
        &mut tx,
        organization.id,
        &request.owner_email,
        &request.owner_name,
        Role::Owner,
    )
    .await?;
    let (_, api_key) = insert_api_key(&mut tx, owner.id).await?;

    tx.commit().await?;

    tracing::info!(
        organization_id = %organization.id,
        slug = %organization.slug,
        owner_id = %owner.id,
        "organization created"
    );

    Ok(SignupResponse {
        organization,
        owner: owner.into(),
        api_key,
    })
}

pub async fn get_organization(
    pool: &DbPool,
    organization_id: Uuid,
) -> Result<Organization, AppError> {
    sqlx::query_as::<_, Organization>(&format!(
        "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = $1"
    ))
    .bind(organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Organization"))
}

/// Compute the setup checklist for an organization.
pub async fn onboarding(
    pool: &DbPool,
    organization_id: Uuid,
) -> Result<OnboardingChecklist, AppError> {
    let counts = sqlx::query_as::<_, OnboardingCounts>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users
              WHERE organization_id = $1 AND role = 'trainer' AND is_active) AS trainers,
            (SELECT COUNT(*) FROM clients WHERE organization_id = $1) AS clients,
            (SELECT COUNT(*) FROM packages WHERE organization_id = $1) AS packages,
            (SELECT COUNT(*) FROM commission_profiles WHERE organization_id = $1)
                AS commission_profiles,
            (SELECT COUNT(*) FROM users
              WHERE organization_id = $1 AND commission_profile_id IS NOT NULL)
                AS trainers_with_profile,
            (SELECT COUNT(*) FROM sessions WHERE organization_id = $1) AS sessions,
            (SELECT COUNT(*) FROM payments WHERE organization_id = $1) AS payments
        "#,
    )
    .bind(organization_id)
    .fetch_one(pool)
    .await?;

    Ok(OnboardingChecklist::from_counts(&counts))
}
