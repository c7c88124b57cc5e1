//! Commission engine.
//!
//! Pure calculation code with no database access. Services load sessions,
//! payments and the trainer's profile, build a [`PeriodActivity`] and a
//! [`CommissionPlan`], and hand them to [`CommissionPlan::calculate`].

pub mod calculator;
pub mod money;
pub mod period;

pub use calculator::{
    CalculationMethod, CommissionBreakdown, CommissionPlan, PeriodActivity, PlanError, Tier,
    TierLine, TriggerType,
};
pub use period::{Period, PeriodError};
