//! Tiered commission calculation.
//!
//! A [`CommissionPlan`] is a calculation method, a trigger mode and an ordered
//! list of [`Tier`]s. Given a trainer's [`PeriodActivity`] (commissionable
//! session values in chronological order plus attributed sales), the plan
//! produces a [`CommissionBreakdown`].
//!
//! # Methods
//!
//! - **Flat**: the base tier's rates apply to everything. Thresholds and
//!   bonuses are ignored.
//! - **Progressive**: the highest tier reached applies to the whole period.
//! - **Graduated**: each tier's rate applies only to the activity inside its
//!   bracket, like income-tax brackets.
//!
//! # Triggers
//!
//! The trigger decides what "reaching" a tier means: session count, sales
//! volume, either of them, both of them, or nothing at all (base tier only).

use serde::{Deserialize, Serialize};

use super::money::{FULL_RATE_BPS, MAX_AMOUNT_CENTS, apply_rate};
use crate::text_enum::text_enum;

/// How tier rates are applied to a period's activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    Progressive,
    Graduated,
    Flat,
}

/// Which activity thresholds must be met for a tier to be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    None,
    SessionCount,
    SalesVolume,
    EitherOr,
    BothAnd,
}

impl TriggerType {
    fn considers_sessions(self) -> bool {
        matches!(self, Self::SessionCount | Self::EitherOr | Self::BothAnd)
    }

    fn considers_sales(self) -> bool {
        matches!(self, Self::SalesVolume | Self::EitherOr | Self::BothAnd)
    }
}

text_enum!(CalculationMethod, "calculation method", {
    Progressive => "progressive",
    Graduated => "graduated",
    Flat => "flat",
});

text_enum!(TriggerType, "trigger type", {
    None => "none",
    SessionCount => "session_count",
    SalesVolume => "sales_volume",
    EitherOr => "either_or",
    BothAnd => "both_and",
});

/// One threshold bracket of a commission plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    /// Ordering key, lowest level is the base tier
    pub level: i32,

    /// Sessions needed to reach this tier
    #[serde(default)]
    pub session_threshold: i32,

    /// Attributed sales needed to reach this tier, in cents
    #[serde(default)]
    pub sales_threshold_cents: i64,

    /// Share of each session's value paid out
    #[serde(default)]
    pub session_rate_bps: i32,

    /// Fixed amount paid per session
    #[serde(default)]
    pub session_flat_fee_cents: i64,

    /// Share of attributed sales paid out
    #[serde(default)]
    pub sales_rate_bps: i32,

    /// One-off amount paid when the tier is reached
    #[serde(default)]
    pub bonus_cents: i64,
}

impl Tier {
    fn session_pay(&self, sessions: i64, value_cents: i64) -> i64 {
        apply_rate(value_cents, self.session_rate_bps)
            .saturating_add(sessions.saturating_mul(self.session_flat_fee_cents))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("a commission plan needs at least one tier")]
    NoTiers,

    #[error("tier level {0} appears more than once")]
    DuplicateLevel(i32),

    #[error("tier {level}: {field} must not be negative")]
    Negative { level: i32, field: &'static str },

    #[error("tier {level}: {field} must not exceed {max} cents", max = MAX_AMOUNT_CENTS)]
    TooLarge { level: i32, field: &'static str },

    #[error("tier {level}: {field} must be between 0 and {max} basis points", max = FULL_RATE_BPS)]
    RateOutOfRange { level: i32, field: &'static str },

    #[error("tier {level}: {field} is lower than the tier below it")]
    DecreasingThreshold { level: i32, field: &'static str },
}

/// A validated commission plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommissionPlan {
    method: CalculationMethod,
    trigger: TriggerType,
    tiers: Vec<Tier>,
}

/// Commissionable activity of one trainer over one period.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodActivity {
    /// Value of each commissionable session, in chronological order
    pub session_values_cents: Vec<i64>,

    /// Completed payments attributed to the trainer
    pub sales_cents: i64,
}

impl PeriodActivity {
    pub fn session_count(&self) -> i64 {
        self.session_values_cents.len() as i64
    }

    pub fn session_value_cents(&self) -> i64 {
        sum_cents(self.session_values_cents.iter().copied())
    }
}

/// Sum of cent amounts, pinned at `i64::MAX` instead of overflowing.
fn sum_cents(amounts: impl IntoIterator<Item = i64>) -> i64 {
    amounts.into_iter().fold(0, i64::saturating_add)
}

/// Commission earned inside a single tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLine {
    pub tier_level: i32,
    pub sessions: i64,
    pub session_value_cents: i64,
    pub sales_cents: i64,
    pub session_commission_cents: i64,
    pub sales_commission_cents: i64,
    pub bonus_cents: i64,
}

impl TierLine {
    fn empty(tier_level: i32) -> Self {
        Self {
            tier_level,
            sessions: 0,
            session_value_cents: 0,
            sales_cents: 0,
            session_commission_cents: 0,
            sales_commission_cents: 0,
            bonus_cents: 0,
        }
    }

    pub fn total_cents(&self) -> i64 {
        sum_cents([
            self.session_commission_cents,
            self.sales_commission_cents,
            self.bonus_cents,
        ])
    }
}

/// Result of running a plan over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionBreakdown {
    pub method: CalculationMethod,
    pub trigger: TriggerType,
    pub session_count: i64,
    pub session_value_cents: i64,
    pub sales_cents: i64,
    /// Highest tier reached, `None` when no tier qualifies
    pub tier_reached: Option<i32>,
    pub session_commission_cents: i64,
    pub sales_commission_cents: i64,
    pub bonus_cents: i64,
    pub total_cents: i64,
    pub tiers: Vec<TierLine>,
}

impl CommissionPlan {
    /// Validate and build a plan. Tiers may be given in any order.
    pub fn new(
        method: CalculationMethod,
        trigger: TriggerType,
        mut tiers: Vec<Tier>,
    ) -> Result<Self, PlanError> {
        if tiers.is_empty() {
            return Err(PlanError::NoTiers);
        }
        tiers.sort_by_key(|t| t.level);

        for pair in tiers.windows(2) {
            if pair[0].level == pair[1].level {
                return Err(PlanError::DuplicateLevel(pair[1].level));
            }
            if pair[1].session_threshold < pair[0].session_threshold {
                return Err(PlanError::DecreasingThreshold {
                    level: pair[1].level,
                    field: "session_threshold",
                });
            }
            if pair[1].sales_threshold_cents < pair[0].sales_threshold_cents {
                return Err(PlanError::DecreasingThreshold {
                    level: pair[1].level,
                    field: "sales_threshold_cents",
                });
            }
        }

        for tier in &tiers {
            let amounts = [
                ("session_threshold", tier.session_threshold as i64),
                ("sales_threshold_cents", tier.sales_threshold_cents),
                ("session_flat_fee_cents", tier.session_flat_fee_cents),
                ("bonus_cents", tier.bonus_cents),
            ];
            if let Some((field, _)) = amounts.iter().find(|(_, v)| *v < 0) {
                return Err(PlanError::Negative {
                    level: tier.level,
                    field: *field,
                });
            }
            if let Some((field, _)) = amounts.iter().find(|(_, v)| *v > MAX_AMOUNT_CENTS) {
                return Err(PlanError::TooLarge {
                    level: tier.level,
                    field: *field,
                });
            }

            let rates = [
                ("session_rate_bps", tier.session_rate_bps),
                ("sales_rate_bps", tier.sales_rate_bps),
            ];
            if let Some((field, _)) = rates
                .iter()
                .find(|(_, r)| !(0..=FULL_RATE_BPS).contains(r))
            {
                return Err(PlanError::RateOutOfRange {
                    level: tier.level,
                    field: *field,
                });
            }
        }

        Ok(Self {
            method,
            trigger,
            tiers,
        })
    }

    pub fn method(&self) -> CalculationMethod {
        self.method
    }

    pub fn trigger(&self) -> TriggerType {
        self.trigger
    }

    /// Tiers sorted by level.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    fn base_tier(&self) -> &Tier {
        // non-empty is checked in `new`
        &self.tiers[0]
    }

    fn qualifies(&self, tier: &Tier, sessions: i64, sales_cents: i64) -> bool {
        let by_sessions = sessions >= tier.session_threshold as i64;
        let by_sales = sales_cents >= tier.sales_threshold_cents;
        match self.trigger {
            TriggerType::None => false,
            TriggerType::SessionCount => by_sessions,
            TriggerType::SalesVolume => by_sales,
            TriggerType::EitherOr => by_sessions || by_sales,
            TriggerType::BothAnd => by_sessions && by_sales,
        }
    }

    /// Index of the highest tier reached for the given totals.
    fn reached_index(&self, sessions: i64, sales_cents: i64) -> Option<usize> {
        if self.trigger == TriggerType::None {
            return Some(0);
        }
        self.tiers
            .iter()
            .rposition(|tier| self.qualifies(tier, sessions, sales_cents))
    }

    /// Highest tier whose thresholds are satisfied under this plan's trigger.
    pub fn tier_reached(&self, sessions: i64, sales_cents: i64) -> Option<&Tier> {
        self.reached_index(sessions, sales_cents)
            .map(|idx| &self.tiers[idx])
    }

    /// Run the plan over a period's activity.
    pub fn calculate(&self, activity: &PeriodActivity) -> CommissionBreakdown {
        let session_count = activity.session_count();
        let sales_cents = activity.sales_cents.max(0);

        let (tier_reached, lines) = match self.method {
            CalculationMethod::Flat => (Some(self.base_tier().level), self.flat(activity)),
            CalculationMethod::Progressive => match self.reached_index(session_count, sales_cents) {
                Some(idx) => (
                    Some(self.tiers[idx].level),
                    self.progressive(idx, activity),
                ),
                None => (None, Vec::new()),
            },
            CalculationMethod::Graduated => match self.reached_index(session_count, sales_cents) {
                Some(idx) if self.trigger == TriggerType::None => {
                    (Some(self.tiers[idx].level), self.flat(activity))
                }
                Some(idx) => (Some(self.tiers[idx].level), self.graduated(idx, activity)),
                None => (None, Vec::new()),
            },
        };

        let session_commission_cents = sum_cents(lines.iter().map(|l| l.session_commission_cents));
        let sales_commission_cents = sum_cents(lines.iter().map(|l| l.sales_commission_cents));
        let bonus_cents = sum_cents(lines.iter().map(|l| l.bonus_cents));

        CommissionBreakdown {
            method: self.method,
            trigger: self.trigger,
            session_count,
            session_value_cents: activity.session_value_cents(),
            sales_cents,
            tier_reached,
            session_commission_cents,
            sales_commission_cents,
            bonus_cents,
            total_cents: sum_cents([session_commission_cents, sales_commission_cents, bonus_cents]),
            tiers: lines,
        }
    }

    /// Base tier rates over all activity, no bonus.
    fn flat(&self, activity: &PeriodActivity) -> Vec<TierLine> {
        let base = self.base_tier();
        let mut line = TierLine::empty(base.level);
        line.sessions = activity.session_count();
        line.session_value_cents = activity.session_value_cents();
        line.sales_cents = activity.sales_cents.max(0);
        line.session_commission_cents = base.session_pay(line.sessions, line.session_value_cents);
        line.sales_commission_cents = apply_rate(line.sales_cents, base.sales_rate_bps);
        vec![line]
    }

    /// Reached tier rates over all activity, plus that tier's bonus.
    fn progressive(&self, reached: usize, activity: &PeriodActivity) -> Vec<TierLine> {
        let tier = &self.tiers[reached];
        let mut line = TierLine::empty(tier.level);
        line.sessions = activity.session_count();
        line.session_value_cents = activity.session_value_cents();
        line.sales_cents = activity.sales_cents.max(0);
        line.session_commission_cents = tier.session_pay(line.sessions, line.session_value_cents);
        line.sales_commission_cents = apply_rate(line.sales_cents, tier.sales_rate_bps);
        line.bonus_cents = tier.bonus_cents;
        vec![line]
    }

    /// Bracketed rates over tiers `0..=reached`, bonuses of every eligible tier.
    fn graduated(&self, reached: usize, activity: &PeriodActivity) -> Vec<TierLine> {
        let eligible = &self.tiers[..=reached];
        let mut lines: Vec<TierLine> = eligible
            .iter()
            .map(|t| {
                let mut line = TierLine::empty(t.level);
                line.bonus_cents = t.bonus_cents;
                line
            })
            .collect();

        // Sessions: bracket by ordinal, or pay everything at the reached tier
        for (i, value) in activity.session_values_cents.iter().enumerate() {
            let ordinal = i as i64 + 1;
            let idx = if self.trigger.considers_sessions() {
                eligible
                    .iter()
                    .rposition(|t| (t.session_threshold as i64) < ordinal)
                    .unwrap_or(0)
            } else {
                reached
            };
            lines[idx].sessions += 1;
            lines[idx].session_value_cents = lines[idx].session_value_cents.saturating_add(*value);
        }

        // Sales: split at each eligible tier's threshold, base tier from zero
        let sales = activity.sales_cents.max(0);
        if self.trigger.considers_sales() {
            for idx in 0..eligible.len() {
                let lower = if idx == 0 {
                    0
                } else {
                    eligible[idx].sales_threshold_cents
                };
                let upper = eligible
                    .get(idx + 1)
                    .map(|t| t.sales_threshold_cents)
                    .unwrap_or(i64::MAX);
                lines[idx].sales_cents = (sales.min(upper) - lower).max(0);
            }
        } else {
            lines[reached].sales_cents = sales;
        }

        for (line, tier) in lines.iter_mut().zip(eligible) {
            line.session_commission_cents = tier.session_pay(line.sessions, line.session_value_cents);
            line.sales_commission_cents = apply_rate(line.sales_cents, tier.sales_rate_bps);
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(level: i32, sessions: i32, sales: i64) -> Tier {
        Tier {
            level,
            session_threshold: sessions,
            sales_threshold_cents: sales,
            session_rate_bps: 0,
            session_flat_fee_cents: 0,
            sales_rate_bps: 0,
            bonus_cents: 0,
        }
    }

    /// Three session-rate tiers: 40% from 0, 50% from 10, 60% from 20 sessions.
    fn session_tiers() -> Vec<Tier> {
        vec![
            Tier {
                session_rate_bps: 4_000,
                ..tier(1, 0, 0)
            },
            Tier {
                session_rate_bps: 5_000,
                bonus_cents: 5_000,
                ..tier(2, 10, 100_000)
            },
            Tier {
                session_rate_bps: 6_000,
                bonus_cents: 10_000,
                ..tier(3, 20, 300_000)
            },
        ]
    }

    fn sessions(count: usize, value: i64) -> PeriodActivity {
        PeriodActivity {
            session_values_cents: vec![value; count],
            sales_cents: 0,
        }
    }

    #[test]
    fn rejects_invalid_plans() {
        let m = CalculationMethod::Progressive;
        let t = TriggerType::SessionCount;

        assert_eq!(CommissionPlan::new(m, t, vec![]), Err(PlanError::NoTiers));
        assert_eq!(
            CommissionPlan::new(m, t, vec![tier(1, 0, 0), tier(1, 5, 0)]),
            Err(PlanError::DuplicateLevel(1))
        );
        assert_eq!(
            CommissionPlan::new(m, t, vec![tier(1, 10, 0), tier(2, 5, 0)]),
            Err(PlanError::DecreasingThreshold {
                level: 2,
                field: "session_threshold"
            })
        );
        assert!(matches!(
            CommissionPlan::new(
                m,
                t,
                vec![Tier {
                    sales_rate_bps: 10_001,
                    ..tier(1, 0, 0)
                }]
            ),
            Err(PlanError::RateOutOfRange { level: 1, .. })
        ));
        assert!(matches!(
            CommissionPlan::new(
                m,
                t,
                vec![Tier {
                    bonus_cents: -1,
                    ..tier(1, 0, 0)
                }]
            ),
            Err(PlanError::Negative {
                field: "bonus_cents",
                ..
            })
        ));
    }

    #[test]
    fn sorts_tiers_by_level() {
        let plan = CommissionPlan::new(
            CalculationMethod::Flat,
            TriggerType::None,
            vec![tier(3, 20, 0), tier(1, 0, 0), tier(2, 10, 0)],
        )
        .unwrap();
        let levels: Vec<i32> = plan.tiers().iter().map(|t| t.level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
    }

    #[test]
    fn tier_reached_per_trigger() {
        let tiers = session_tiers();
        let plan = |trigger| {
            CommissionPlan::new(CalculationMethod::Progressive, trigger, tiers.clone()).unwrap()
        };

        // 12 sessions, $500 in sales
        let (s, v) = (12, 50_000);
        assert_eq!(plan(TriggerType::None).tier_reached(s, v).unwrap().level, 1);
        assert_eq!(plan(TriggerType::SessionCount).tier_reached(s, v).unwrap().level, 2);
        assert_eq!(plan(TriggerType::SalesVolume).tier_reached(s, v).unwrap().level, 1);
        assert_eq!(plan(TriggerType::EitherOr).tier_reached(s, v).unwrap().level, 2);
        assert_eq!(plan(TriggerType::BothAnd).tier_reached(s, v).unwrap().level, 1);

        // 25 sessions, $2,000 in sales: both_and stops at tier 2
        assert_eq!(
            plan(TriggerType::BothAnd).tier_reached(25, 200_000).unwrap().level,
            2
        );
        assert_eq!(
            plan(TriggerType::EitherOr).tier_reached(5, 300_000).unwrap().level,
            3
        );
    }

    #[test]
    fn no_tier_reached_when_base_has_threshold() {
        let plan = CommissionPlan::new(
            CalculationMethod::Progressive,
            TriggerType::SessionCount,
            vec![Tier {
                session_rate_bps: 5_000,
                bonus_cents: 1_000,
                ..tier(1, 5, 0)
            }],
        )
        .unwrap();

        let result = plan.calculate(&sessions(4, 10_000));
        assert_eq!(result.tier_reached, None);
        assert_eq!(result.total_cents, 0);
        assert!(result.tiers.is_empty());
        assert_eq!(result.session_count, 4);
    }

    #[test]
    fn progressive_applies_highest_tier_to_everything() {
        let plan = CommissionPlan::new(
            CalculationMethod::Progressive,
            TriggerType::SessionCount,
            session_tiers(),
        )
        .unwrap();

        // 12 sessions at $100: tier 2 (50%) on all $1,200 + $50 bonus
        let result = plan.calculate(&sessions(12, 10_000));
        assert_eq!(result.tier_reached, Some(2));
        assert_eq!(result.session_commission_cents, 60_000);
        assert_eq!(result.bonus_cents, 5_000);
        assert_eq!(result.total_cents, 65_000);
        assert_eq!(result.tiers.len(), 1);
        assert_eq!(result.tiers[0].tier_level, 2);
    }

    #[test]
    fn graduated_brackets_sessions_by_ordinal() {
        let plan = CommissionPlan::new(
            CalculationMethod::Graduated,
            TriggerType::SessionCount,
            session_tiers(),
        )
        .unwrap();

        // 12 sessions at $100: first 10 at 40%, sessions 11-12 at 50%, + tier 2 bonus
        let result = plan.calculate(&sessions(12, 10_000));
        assert_eq!(result.tier_reached, Some(2));
        assert_eq!(result.tiers.len(), 2);
        assert_eq!(result.tiers[0].sessions, 10);
        assert_eq!(result.tiers[0].session_commission_cents, 40_000);
        assert_eq!(result.tiers[1].sessions, 2);
        assert_eq!(result.tiers[1].session_commission_cents, 10_000);
        assert_eq!(result.session_commission_cents, 50_000);
        assert_eq!(result.bonus_cents, 5_000);
        assert_eq!(result.total_cents, 55_000);
    }

    #[test]
    fn graduated_never_exceeds_progressive_for_rising_rates() {
        let tiers = session_tiers();
        let grad =
            CommissionPlan::new(CalculationMethod::Graduated, TriggerType::SessionCount, tiers.clone())
                .unwrap();
        let prog =
            CommissionPlan::new(CalculationMethod::Progressive, TriggerType::SessionCount, tiers)
                .unwrap();

        for n in [0, 1, 9, 10, 11, 19, 20, 21, 40] {
            let activity = sessions(n, 7_500);
            let g = grad.calculate(&activity);
            let p = prog.calculate(&activity);
            assert!(
                g.session_commission_cents <= p.session_commission_cents,
                "{n} sessions: graduated {} > progressive {}",
                g.session_commission_cents,
                p.session_commission_cents
            );
        }
    }

    #[test]
    fn graduated_splits_sales_into_brackets() {
        let plan = CommissionPlan::new(
            CalculationMethod::Graduated,
            TriggerType::SalesVolume,
            vec![
                Tier {
                    sales_rate_bps: 1_000,
                    ..tier(1, 0, 0)
                },
                Tier {
                    sales_rate_bps: 1_500,
                    ..tier(2, 0, 100_000)
                },
                Tier {
                    sales_rate_bps: 2_000,
                    ..tier(3, 0, 300_000)
                },
            ],
        )
        .unwrap();

        // $3,500 of sales: $1,000 @10% + $2,000 @15% + $500 @20%
        let result = plan.calculate(&PeriodActivity {
            session_values_cents: vec![],
            sales_cents: 350_000,
        });
        assert_eq!(result.tier_reached, Some(3));
        let split: Vec<i64> = result.tiers.iter().map(|l| l.sales_cents).collect();
        assert_eq!(split, vec![100_000, 200_000, 50_000]);
        assert_eq!(result.sales_commission_cents, 10_000 + 30_000 + 10_000);
    }

    #[test]
    fn graduated_pays_ignored_dimension_at_reached_tier() {
        let mut tiers = session_tiers();
        for t in &mut tiers {
            t.sales_rate_bps = t.session_rate_bps / 4;
            t.bonus_cents = 0;
        }
        let plan =
            CommissionPlan::new(CalculationMethod::Graduated, TriggerType::SessionCount, tiers)
                .unwrap();

        // 21 sessions reach tier 3; sales are not bracketed so all pay 15%
        let result = plan.calculate(&PeriodActivity {
            session_values_cents: vec![1_000; 21],
            sales_cents: 100_000,
        });
        assert_eq!(result.tier_reached, Some(3));
        assert_eq!(result.tiers[2].sales_cents, 100_000);
        assert_eq!(result.sales_commission_cents, 15_000);
        // 10 @40% + 10 @50% + 1 @60%
        assert_eq!(result.session_commission_cents, 4_000 + 5_000 + 600);
    }

    #[test]
    fn graduated_both_and_caps_eligible_tiers() {
        let plan = CommissionPlan::new(
            CalculationMethod::Graduated,
            TriggerType::BothAnd,
            session_tiers(),
        )
        .unwrap();

        // 25 sessions but only $1,500 sales: tier 3 not reached, so sessions 21+ stay in tier 2
        let result = plan.calculate(&PeriodActivity {
            session_values_cents: vec![1_000; 25],
            sales_cents: 150_000,
        });
        assert_eq!(result.tier_reached, Some(2));
        assert_eq!(result.tiers.len(), 2);
        assert_eq!(result.tiers[0].sessions, 10);
        assert_eq!(result.tiers[1].sessions, 15);
        assert_eq!(result.bonus_cents, 5_000);
    }

    #[test]
    fn graduated_with_no_trigger_behaves_like_flat() {
        let tiers = session_tiers();
        let grad =
            CommissionPlan::new(CalculationMethod::Graduated, TriggerType::None, tiers.clone())
                .unwrap();
        let flat = CommissionPlan::new(CalculationMethod::Flat, TriggerType::None, tiers).unwrap();

        let activity = sessions(30, 5_000);
        let g = grad.calculate(&activity);
        let f = flat.calculate(&activity);
        assert_eq!(g.total_cents, f.total_cents);
        assert_eq!(g.total_cents, 60_000);
    }

    #[test]
    fn flat_ignores_thresholds_and_bonuses() {
        let plan = CommissionPlan::new(
            CalculationMethod::Flat,
            TriggerType::SessionCount,
            vec![
                Tier {
                    session_flat_fee_cents: 2_500,
                    sales_rate_bps: 500,
                    bonus_cents: 9_999,
                    ..tier(1, 50, 0)
                },
                Tier {
                    session_flat_fee_cents: 4_000,
                    ..tier(2, 60, 0)
                },
            ],
        )
        .unwrap();

        let result = plan.calculate(&PeriodActivity {
            session_values_cents: vec![0, 0, 0],
            sales_cents: 20_000,
        });
        assert_eq!(result.tier_reached, Some(1));
        assert_eq!(result.session_commission_cents, 7_500);
        assert_eq!(result.sales_commission_cents, 1_000);
        assert_eq!(result.bonus_cents, 0);
        assert_eq!(result.total_cents, 8_500);
    }

    #[test]
    fn negative_sales_are_treated_as_zero() {
        let plan = CommissionPlan::new(
            CalculationMethod::Progressive,
            TriggerType::SalesVolume,
            vec![Tier {
                sales_rate_bps: 1_000,
                ..tier(1, 0, 0)
            }],
        )
        .unwrap();

        let result = plan.calculate(&PeriodActivity {
            session_values_cents: vec![],
            sales_cents: -5_000,
        });
        assert_eq!(result.sales_cents, 0);
        assert_eq!(result.total_cents, 0);
    }

    #[test]
    fn line_totals_add_up() {
        let plan = CommissionPlan::new(
            CalculationMethod::Graduated,
            TriggerType::EitherOr,
            session_tiers(),
        )
        .unwrap();
        let result = plan.calculate(&PeriodActivity {
            session_values_cents: vec![8_000; 22],
            sales_cents: 320_000,
        });
        let sum: i64 = result.tiers.iter().map(TierLine::total_cents).sum();
        assert_eq!(sum, result.total_cents);
    }

    #[test]
    fn parses_stored_names() {
        assert_eq!(
            "graduated".parse::<CalculationMethod>(),
            Ok(CalculationMethod::Graduated)
        );
        assert_eq!(
            TriggerType::try_from("both_and".to_string()),
            Ok(TriggerType::BothAnd)
        );
        assert!("tiered".parse::<CalculationMethod>().is_err());
        assert_eq!(TriggerType::EitherOr.to_string(), "either_or");
    }

    #[test]
    fn rejects_amounts_past_the_cap() {
        let huge_fee = vec![Tier {
            session_flat_fee_cents: i64::MAX / 2,
            ..tier(1, 0, 0)
        }];
        assert_eq!(
            CommissionPlan::new(CalculationMethod::Flat, TriggerType::None, huge_fee),
            Err(PlanError::TooLarge {
                level: 1,
                field: "session_flat_fee_cents"
            })
        );

        let huge_bonus = vec![
            Tier {
                bonus_cents: i64::MAX / 2 + 1,
                ..tier(1, 0, 0)
            },
            Tier {
                bonus_cents: i64::MAX / 2 + 1,
                ..tier(2, 1, 0)
            },
        ];
        assert_eq!(
            CommissionPlan::new(
                CalculationMethod::Graduated,
                TriggerType::SessionCount,
                huge_bonus
            ),
            Err(PlanError::TooLarge {
                level: 1,
                field: "bonus_cents"
            })
        );

        let at_cap = vec![Tier {
            sales_threshold_cents: MAX_AMOUNT_CENTS,
            ..tier(1, 0, 0)
        }];
        assert!(CommissionPlan::new(CalculationMethod::Flat, TriggerType::None, at_cap).is_ok());
    }

    #[test]
    fn extreme_activity_saturates_instead_of_overflowing() {
        let tiers = vec![
            Tier {
                session_rate_bps: FULL_RATE_BPS,
                session_flat_fee_cents: MAX_AMOUNT_CENTS,
                sales_rate_bps: FULL_RATE_BPS,
                bonus_cents: MAX_AMOUNT_CENTS,
                ..tier(1, 0, 0)
            },
            Tier {
                session_rate_bps: FULL_RATE_BPS,
                session_flat_fee_cents: MAX_AMOUNT_CENTS,
                sales_rate_bps: FULL_RATE_BPS,
                bonus_cents: MAX_AMOUNT_CENTS,
                ..tier(2, 1, MAX_AMOUNT_CENTS)
            },
        ];
        let activity = PeriodActivity {
            session_values_cents: vec![i64::MAX / 2; 3],
            sales_cents: i64::MAX,
        };

        for method in [
            CalculationMethod::Flat,
            CalculationMethod::Progressive,
            CalculationMethod::Graduated,
        ] {
            let plan = CommissionPlan::new(method, TriggerType::EitherOr, tiers.clone()).unwrap();
            let result = plan.calculate(&activity);
            assert_eq!(result.session_value_cents, i64::MAX, "{method}");
            assert_eq!(result.total_cents, i64::MAX, "{method}");
        }
    }
}
