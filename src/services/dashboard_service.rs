//! Role-specific dashboards for the current month.

use chrono::Utc;

use crate::{
    commission::Period,
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::dashboard::{Dashboard, ManagerDashboard, TrainerDashboard, TrainerSessionCount},
    services::{commission_service, package_service, user_service},
};

/// Build the dashboard for the caller's role.
pub async fn dashboard(pool: &DbPool, auth: &AuthContext) -> Result<Dashboard, AppError> {
    let period = Period::month_of(Utc::now().date_naive());

    if auth.is_manager() {
        manager_dashboard(pool, auth, period).await.map(Dashboard::Manager)
    } else {
        trainer_dashboard(pool, auth, period).await.map(Dashboard::Trainer)
    }
}

async fn manager_dashboard(
    pool: &DbPool,
    auth: &AuthContext,
    period: Period,
) -> Result<ManagerDashboard, AppError> {
    let (from, to) = (period.starts_at(), period.ends_before());
    let org = auth.organization_id;

    let (sessions_logged, revenue_cents, active_clients, active_trainers): (i64, i64, i64, i64) =
        sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM sessions
                  WHERE organization_id = $1 AND session_at >= $2 AND session_at < $3
                    AND status IN ('completed', 'no_show')),
                (SELECT COALESCE(SUM(amount_cents), 0)::BIGINT FROM payments
                  WHERE organization_id = $1 AND paid_at >= $2 AND paid_at < $3
                    AND status = 'completed'),
                (SELECT COUNT(*) FROM clients WHERE organization_id = $1 AND is_active),
                (SELECT COUNT(*) FROM users
                  WHERE organization_id = $1 AND is_active AND role = 'trainer')
            "#,
        )
        .bind(org)
        .bind(from)
        .bind(to)
        .fetch_one(pool)
        .await?;

    let sessions_by_trainer = sqlx::query_as::<_, TrainerSessionCount>(
        r#"
        SELECT u.id AS trainer_id, u.full_name AS trainer_name, COUNT(s.id) AS sessions
        FROM users u
        LEFT JOIN sessions s
               ON s.trainer_id = u.id
              AND s.session_at >= $2 AND s.session_at < $3
              AND s.status IN ('completed', 'no_show')
        WHERE u.organization_id = $1 AND u.is_active
          AND (u.role = 'trainer' OR s.id IS NOT NULL)
        GROUP BY u.id, u.full_name
        ORDER BY sessions DESC, u.full_name
        "#,
    )
    .bind(org)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    let packages_running_low = package_service::list_running_low(pool, org, None)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(ManagerDashboard {
        role: auth.role,
        period,
        sessions_logged,
        revenue_cents,
        active_clients,
        active_trainers,
        sessions_by_trainer,
        packages_running_low,
    })
}

async fn trainer_dashboard(
    pool: &DbPool,
    auth: &AuthContext,
    period: Period,
) -> Result<TrainerDashboard, AppError> {
    let org = auth.organization_id;
    let trainer = user_service::get_user(pool, org, auth.user_id).await?;

    let activity = commission_service::load_activity(pool, org, trainer.id, &period).await?;

    let active_clients: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM clients WHERE organization_id = $1 AND trainer_id = $2 AND is_active",
    )
    .bind(org)
    .bind(trainer.id)
    .fetch_one(pool)
    .await?;

    let commission_estimate = match trainer.commission_profile_id {
        Some(_) => Some(
            commission_service::commission_with_activity(pool, &trainer, period, &activity)
                .await?
                .breakdown,
        ),
        None => None,
    };

    let packages_running_low = package_service::list_running_low(pool, org, Some(trainer.id))
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(TrainerDashboard {
        period,
        sessions_logged: activity.session_count(),
        active_clients,
        attributed_sales_cents: activity.sales_cents,
        commission_estimate,
        packages_running_low,
    })
}
