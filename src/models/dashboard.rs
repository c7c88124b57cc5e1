//! Role-specific dashboard views.

use serde::Serialize;
use uuid::Uuid;

use super::package::PackageResponse;
use super::user::Role;
use crate::commission::{CommissionBreakdown, Period};

/// Dashboard payload, tagged by `view` so the UI can pick a layout.
#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Dashboard {
    Manager(ManagerDashboard),
    Trainer(TrainerDashboard),
}

#[derive(Debug, Serialize)]
pub struct ManagerDashboard {
    pub role: Role,
    pub period: Period,
    pub sessions_logged: i64,
    pub revenue_cents: i64,
    pub active_clients: i64,
    pub active_trainers: i64,
    pub sessions_by_trainer: Vec<TrainerSessionCount>,
    pub packages_running_low: Vec<PackageResponse>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct TrainerSessionCount {
    pub trainer_id: Uuid,
    pub trainer_name: String,
    pub sessions: i64,
}

#[derive(Debug, Serialize)]
pub struct TrainerDashboard {
    pub period: Period,
    pub sessions_logged: i64,
    pub active_clients: i64,
    pub attributed_sales_cents: i64,

    /// Present when the trainer has a commission profile
    pub commission_estimate: Option<CommissionBreakdown>,

    pub packages_running_low: Vec<PackageResponse>,
}
