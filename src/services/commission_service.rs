//! Commission profiles and calculation.
//!
//! This service is the bridge between stored rows and the pure commission
//! engine: it loads a trainer's profile and tiers into a [`CommissionPlan`],
//! gathers the trainer's commissionable sessions and attributed sales for a
//! [`Period`] into a [`PeriodActivity`], and runs the plan.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    commission::{CommissionPlan, Period, PeriodActivity, Tier},
    db::DbPool,
    error::{AppError, conflict_on_unique},
    middleware::auth::AuthContext,
    models::{
        commission::{
            CalculateQuery, CommissionProfile, CommissionProfileRequest,
            CommissionProfileResponse, CommissionReport, CommissionRun, CommissionTierRow,
            CreateRunRequest, PROFILE_COLUMNS, RUN_COLUMNS, RunQuery, SkippedTrainer,
            TrainerCommission,
        },
        user::{USER_COLUMNS, User},
    },
    services::{payment_service, required_text, session_service, user_service},
};

const TIER_COLUMNS: &str = "profile_id, tier_level, session_threshold, sales_threshold_cents, \
     session_rate_bps, session_flat_fee_cents, sales_rate_bps, bonus_cents";

async fn insert_tiers(
    conn: &mut PgConnection,
    profile_id: Uuid,
    tiers: &[Tier],
) -> Result<(), AppError> {
    for tier in tiers {
        sqlx::query(
            r#"
            INSERT INTO commission_tiers (
                profile_id, tier_level, session_threshold, sales_threshold_cents,
                session_rate_bps, session_flat_fee_cents, sales_rate_bps, bonus_cents
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(profile_id)
        .bind(tier.level)
        .bind(tier.session_threshold)
        .bind(tier.sales_threshold_cents)
        .bind(tier.session_rate_bps)
        .bind(tier.session_flat_fee_cents)
        .bind(tier.sales_rate_bps)
        .bind(tier.bonus_cents)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn fetch_tiers(pool: &DbPool, profile_ids: &[Uuid]) -> Result<Vec<CommissionTierRow>, AppError> {
    let rows = sqlx::query_as::<_, CommissionTierRow>(&format!(
        "SELECT {TIER_COLUMNS} FROM commission_tiers \
         WHERE profile_id = ANY($1) ORDER BY profile_id, tier_level"
    ))
    .bind(profile_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn fetch_profile(
    pool: &DbPool,
    organization_id: Uuid,
    profile_id: Uuid,
) -> Result<CommissionProfile, AppError> {
    sqlx::query_as::<_, CommissionProfile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM commission_profiles WHERE id = $1 AND organization_id = $2"
    ))
    .bind(profile_id)
    .bind(organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Commission profile"))
}

/// Create a profile and its tiers. Managers only.
///
/// The tiers are validated by building the [`CommissionPlan`] they describe
/// before anything is written.
pub async fn create_profile(
    pool: &DbPool,
    auth: &AuthContext,
    request: CommissionProfileRequest,
) -> Result<CommissionProfileResponse, AppError> {
    auth.require_manager()?;
    let name = required_text(&request.name, "name")?;
    let plan = request.to_plan()?;

    let mut tx = pool.begin().await?;

    let profile = sqlx::query_as::<_, CommissionProfile>(&format!(
        "INSERT INTO commission_profiles (organization_id, name, calculation_method, trigger_type) \
         VALUES ($1, $2, $3, $4) RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(auth.organization_id)
    .bind(&name)
    .bind(plan.method().as_str())
    .bind(plan.trigger().as_str())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| conflict_on_unique(e, "A commission profile with this name already exists"))?;

    insert_tiers(&mut tx, profile.id, plan.tiers()).await?;
    tx.commit().await?;

    tracing::info!(
        profile_id = %profile.id,
        method = %profile.calculation_method,
        trigger = %profile.trigger_type,
        tiers = plan.tiers().len(),
        "commission profile created"
    );

    Ok(CommissionProfileResponse::new(profile, plan.tiers().to_vec()))
}

/// Replace a profile's name, method, trigger and all of its tiers. Managers only.
pub async fn update_profile(
    pool: &DbPool,
    auth: &AuthContext,
    profile_id: Uuid,
    request: CommissionProfileRequest,
) -> Result<CommissionProfileResponse, AppError> {
    auth.require_manager()?;
    let name = required_text(&request.name, "name")?;
    let plan = request.to_plan()?;

    let mut tx = pool.begin().await?;

    let profile = sqlx::query_as::<_, CommissionProfile>(&format!(
        r#"
        UPDATE commission_profiles
        SET name = $1, calculation_method = $2, trigger_type = $3, updated_at = NOW()
        WHERE id = $4 AND organization_id = $5
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(&name)
    .bind(plan.method().as_str())
    .bind(plan.trigger().as_str())
    .bind(profile_id)
    .bind(auth.organization_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| conflict_on_unique(e, "A commission profile with this name already exists"))?
    .ok_or(AppError::NotFound("Commission profile"))?;

    sqlx::query("DELETE FROM commission_tiers WHERE profile_id = $1")
        .bind(profile_id)
        .execute(&mut *tx)
        .await?;
    insert_tiers(&mut tx, profile_id, plan.tiers()).await?;

    tx.commit().await?;

    tracing::info!(profile_id = %profile.id, updated_by = %auth.user_id, "commission profile updated");

    Ok(CommissionProfileResponse::new(profile, plan.tiers().to_vec()))
}

/// Delete a profile that no user is assigned to. Managers only.
pub async fn delete_profile(
    pool: &DbPool,
    auth: &AuthContext,
    profile_id: Uuid,
) -> Result<(), AppError> {
    auth.require_manager()?;

    let in_use: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE commission_profile_id = $1 AND organization_id = $2",
    )
    .bind(profile_id)
    .bind(auth.organization_id)
    .fetch_one(pool)
    .await?;

    if in_use > 0 {
        return Err(AppError::Conflict(format!(
            "Commission profile is assigned to {in_use} user(s)"
        )));
    }

    let result =
        sqlx::query("DELETE FROM commission_profiles WHERE id = $1 AND organization_id = $2")
            .bind(profile_id)
            .bind(auth.organization_id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Commission profile"));
    }

    tracing::info!(profile_id = %profile_id, deleted_by = %auth.user_id, "commission profile deleted");

    Ok(())
}

pub async fn get_profile(
    pool: &DbPool,
    organization_id: Uuid,
    profile_id: Uuid,
) -> Result<CommissionProfileResponse, AppError> {
    let profile = fetch_profile(pool, organization_id, profile_id).await?;
    let tiers = fetch_tiers(pool, &[profile.id]).await?;
    Ok(CommissionProfileResponse::new(
        profile,
        tiers.into_iter().map(Tier::from).collect(),
    ))
}

pub async fn list_profiles(
    pool: &DbPool,
    organization_id: Uuid,
) -> Result<Vec<CommissionProfileResponse>, AppError> {
    let profiles = sqlx::query_as::<_, CommissionProfile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM commission_profiles WHERE organization_id = $1 ORDER BY name"
    ))
    .bind(organization_id)
    .fetch_all(pool)
    .await?;

    let ids: Vec<Uuid> = profiles.iter().map(|p| p.id).collect();
    let mut tiers_by_profile: HashMap<Uuid, Vec<Tier>> = HashMap::new();
    for row in fetch_tiers(pool, &ids).await? {
        tiers_by_profile
            .entry(row.profile_id)
            .or_default()
            .push(row.into());
    }

    Ok(profiles
        .into_iter()
        .map(|profile| {
            let tiers = tiers_by_profile.remove(&profile.id).unwrap_or_default();
            CommissionProfileResponse::new(profile, tiers)
        })
        .collect())
}

/// Load a stored profile as a runnable plan.
async fn load_plan(
    pool: &DbPool,
    organization_id: Uuid,
    profile_id: Uuid,
) -> Result<(CommissionProfile, CommissionPlan), AppError> {
    let profile = fetch_profile(pool, organization_id, profile_id).await?;
    let tiers = fetch_tiers(pool, &[profile.id]).await?;
    let plan = CommissionPlan::new(
        profile.calculation_method,
        profile.trigger_type,
        tiers.into_iter().map(Tier::from).collect(),
    )?;
    Ok((profile, plan))
}

/// Gather a trainer's commissionable activity for a period.
pub async fn load_activity(
    pool: &DbPool,
    organization_id: Uuid,
    trainer_id: Uuid,
    period: &Period,
) -> Result<PeriodActivity, AppError> {
    let (from, to) = (period.starts_at(), period.ends_before());

    let session_values_cents =
        session_service::commissionable_session_values(pool, organization_id, trainer_id, from, to)
            .await?;
    let sales_cents =
        payment_service::attributed_sales_cents(pool, organization_id, trainer_id, from, to)
            .await?;

    Ok(PeriodActivity {
        session_values_cents,
        sales_cents,
    })
}

/// Run a trainer's assigned profile over a period.
///
/// # Errors
///
/// - `InvalidRequest` if the trainer has no commission profile
pub async fn commission_for_trainer(
    pool: &DbPool,
    trainer: &User,
    period: Period,
) -> Result<TrainerCommission, AppError> {
    let activity = load_activity(pool, trainer.organization_id, trainer.id, &period).await?;
    commission_with_activity(pool, trainer, period, &activity).await
}

/// Run a trainer's assigned profile over activity the caller already loaded.
pub async fn commission_with_activity(
    pool: &DbPool,
    trainer: &User,
    period: Period,
    activity: &PeriodActivity,
) -> Result<TrainerCommission, AppError> {
    let profile_id = trainer.commission_profile_id.ok_or_else(|| {
        AppError::InvalidRequest(format!(
            "{} has no commission profile assigned",
            trainer.full_name
        ))
    })?;

    let (profile, plan) = load_plan(pool, trainer.organization_id, profile_id).await?;
    let breakdown = plan.calculate(activity);

    tracing::debug!(
        trainer_id = %trainer.id,
        sessions = breakdown.session_count,
        sales_cents = breakdown.sales_cents,
        tier = ?breakdown.tier_reached,
        total_cents = breakdown.total_cents,
        "commission calculated"
    );

    Ok(TrainerCommission {
        trainer_id: trainer.id,
        trainer_name: trainer.full_name.clone(),
        profile_id: profile.id,
        profile_name: profile.name,
        period,
        breakdown,
    })
}

fn resolve_period(
    start: Option<chrono::NaiveDate>,
    end: Option<chrono::NaiveDate>,
) -> Result<Period, AppError> {
    Ok(Period::from_bounds(start, end, Utc::now().date_naive())?)
}

/// `GET /commissions/calculate`: one trainer, one period.
pub async fn calculate(
    pool: &DbPool,
    auth: &AuthContext,
    query: CalculateQuery,
) -> Result<TrainerCommission, AppError> {
    let trainer_id = auth.scoped_trainer(query.trainer_id)?;
    let period = resolve_period(query.period_start, query.period_end)?;
    let trainer = user_service::get_user(pool, auth.organization_id, trainer_id).await?;

    commission_for_trainer(pool, &trainer, period).await
}

/// Commission of every active staff member with a profile. Managers only.
pub async fn report(
    pool: &DbPool,
    auth: &AuthContext,
    query: CalculateQuery,
) -> Result<CommissionReport, AppError> {
    auth.require_manager()?;
    let period = resolve_period(query.period_start, query.period_end)?;

    let staff = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS} FROM users
        WHERE organization_id = $1 AND is_active = true
          AND (role = 'trainer' OR commission_profile_id IS NOT NULL)
        ORDER BY full_name
        "#
    ))
    .bind(auth.organization_id)
    .fetch_all(pool)
    .await?;

    let mut trainers = Vec::new();
    let mut skipped = Vec::new();
    for user in staff {
        if user.commission_profile_id.is_none() {
            skipped.push(SkippedTrainer {
                trainer_id: user.id,
                trainer_name: user.full_name,
                reason: "no commission profile assigned",
            });
            continue;
        }
        trainers.push(commission_for_trainer(pool, &user, period).await?);
    }

    let total_cents = trainers.iter().map(|t| t.breakdown.total_cents).sum();

    Ok(CommissionReport {
        period,
        trainers,
        skipped,
        total_cents,
    })
}

/// Calculate and persist a commission snapshot. Managers only.
pub async fn save_run(
    pool: &DbPool,
    auth: &AuthContext,
    request: CreateRunRequest,
) -> Result<CommissionRun, AppError> {
    auth.require_manager()?;
    let period = resolve_period(request.period_start, request.period_end)?;
    let trainer = user_service::get_user(pool, auth.organization_id, request.trainer_id).await?;

    let result = commission_for_trainer(pool, &trainer, period).await?;
    let breakdown = serde_json::to_value(&result.breakdown)
        .map_err(|e| AppError::Internal(format!("Failed to serialize breakdown: {}", e)))?;

    let run = sqlx::query_as::<_, CommissionRun>(&format!(
        r#"
        INSERT INTO commission_runs (
            organization_id, trainer_id, profile_id, period_start, period_end,
            total_cents, breakdown, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {RUN_COLUMNS}
        "#
    ))
    .bind(auth.organization_id)
    .bind(trainer.id)
    .bind(result.profile_id)
    .bind(period.start)
    .bind(period.end)
    .bind(result.breakdown.total_cents)
    .bind(breakdown)
    .bind(auth.user_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(
        run_id = %run.id,
        trainer_id = %run.trainer_id,
        period_start = %run.period_start,
        period_end = %run.period_end,
        total_cents = run.total_cents,
        "commission run saved"
    );

    Ok(run)
}

/// Saved runs, newest period first. Trainers only see their own.
pub async fn list_runs(
    pool: &DbPool,
    auth: &AuthContext,
    query: RunQuery,
) -> Result<Vec<CommissionRun>, AppError> {
    let trainer_id = auth.trainer_filter(query.trainer_id)?;

    let runs = sqlx::query_as::<_, CommissionRun>(&format!(
        r#"
        SELECT {RUN_COLUMNS} FROM commission_runs
        WHERE organization_id = $1
          AND ($2::uuid IS NULL OR trainer_id = $2)
        ORDER BY period_start DESC, created_at DESC
        "#
    ))
    .bind(auth.organization_id)
    .bind(trainer_id)
    .fetch_all(pool)
    .await?;

    Ok(runs)
}
