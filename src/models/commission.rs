//! Commission profiles, tiers and saved commission runs.
//!
//! A profile is the stored form of a [`CommissionPlan`]: a named method and
//! trigger plus its tier rows. Trainers point at one profile through
//! `users.commission_profile_id`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::commission::{
    CalculationMethod, CommissionBreakdown, CommissionPlan, Period, PlanError, Tier, TriggerType,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommissionProfile {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub calculation_method: CalculationMethod,
    #[sqlx(try_from = "String")]
    pub trigger_type: TriggerType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list matching [`CommissionProfile`].
pub const PROFILE_COLUMNS: &str =
    "id, organization_id, name, calculation_method, trigger_type, created_at, updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommissionTierRow {
    pub profile_id: Uuid,
    pub tier_level: i32,
    pub session_threshold: i32,
    pub sales_threshold_cents: i64,
    pub session_rate_bps: i32,
    pub session_flat_fee_cents: i64,
    pub sales_rate_bps: i32,
    pub bonus_cents: i64,
}

impl From<CommissionTierRow> for Tier {
    fn from(row: CommissionTierRow) -> Self {
        Self {
            level: row.tier_level,
            session_threshold: row.session_threshold,
            sales_threshold_cents: row.sales_threshold_cents,
            session_rate_bps: row.session_rate_bps,
            session_flat_fee_cents: row.session_flat_fee_cents,
            sales_rate_bps: row.sales_rate_bps,
            bonus_cents: row.bonus_cents,
        }
    }
}

/// Request body for creating or replacing a profile.
///
/// ```json
/// {
///   "name": "Senior trainers",
///   "calculation_method": "graduated",
///   "trigger_type": "session_count",
///   "tiers": [
///     { "level": 1, "session_rate_bps": 4000 },
///     { "level": 2, "session_threshold": 40, "session_rate_bps": 5000, "bonus_cents": 10000 }
///   ]
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CommissionProfileRequest {
    pub name: String,
    pub calculation_method: CalculationMethod,
    pub trigger_type: TriggerType,
    pub tiers: Vec<Tier>,
}

impl CommissionProfileRequest {
    /// Validate the tiers by building the plan they describe.
    pub fn to_plan(&self) -> Result<CommissionPlan, PlanError> {
        CommissionPlan::new(
            self.calculation_method,
            self.trigger_type,
            self.tiers.clone(),
        )
    }
}

/// A profile with its tiers sorted by level.
#[derive(Debug, Serialize)]
pub struct CommissionProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub calculation_method: CalculationMethod,
    pub trigger_type: TriggerType,
    pub tiers: Vec<Tier>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommissionProfileResponse {
    pub fn new(profile: CommissionProfile, mut tiers: Vec<Tier>) -> Self {
        tiers.sort_by_key(|t| t.level);
        Self {
            id: profile.id,
            name: profile.name,
            calculation_method: profile.calculation_method,
            trigger_type: profile.trigger_type,
            tiers,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

/// Query string for calculate/report endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct CalculateQuery {
    /// Defaults to the caller
    pub trainer_id: Option<Uuid>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

/// Commission of one trainer for one period.
#[derive(Debug, Clone, Serialize)]
pub struct TrainerCommission {
    pub trainer_id: Uuid,
    pub trainer_name: String,
    pub profile_id: Uuid,
    pub profile_name: String,
    pub period: Period,
    pub breakdown: CommissionBreakdown,
}

#[derive(Debug, Serialize)]
pub struct SkippedTrainer {
    pub trainer_id: Uuid,
    pub trainer_name: String,
    pub reason: &'static str,
}

/// Organization-wide commission report for one period.
#[derive(Debug, Serialize)]
pub struct CommissionReport {
    pub period: Period,
    pub trainers: Vec<TrainerCommission>,
    pub skipped: Vec<SkippedTrainer>,
    pub total_cents: i64,
}

/// Request body for saving a commission run.
#[derive(Debug, Deserialize)]
pub struct CreateRunRequest {
    pub trainer_id: Uuid,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunQuery {
    pub trainer_id: Option<Uuid>,
}

/// A persisted commission snapshot.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct CommissionRun {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub organization_id: Uuid,
    pub trainer_id: Uuid,
    pub profile_id: Option<Uuid>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_cents: i64,
    pub breakdown: serde_json::Value,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Column list matching [`CommissionRun`].
pub const RUN_COLUMNS: &str = "id, organization_id, trainer_id, profile_id, period_start, \
     period_end, total_cents, breakdown, created_by, created_at";
