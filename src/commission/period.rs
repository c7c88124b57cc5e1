//! Billing periods for commission calculation.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Longest period a single calculation may cover.
pub const MAX_PERIOD_DAYS: i64 = 366;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    #[error("period_start must not be after period_end")]
    Inverted,

    #[error("period may not exceed {max} days", max = MAX_PERIOD_DAYS)]
    TooLong,
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PeriodError> {
        if start > end {
            return Err(PeriodError::Inverted);
        }
        if (end - start).num_days() + 1 > MAX_PERIOD_DAYS {
            return Err(PeriodError::TooLong);
        }
        Ok(Self { start, end })
    }

    /// The calendar month containing `today`.
    pub fn month_of(today: NaiveDate) -> Self {
        let start = today.with_day(1).unwrap_or(today);
        let next_month = if start.month() == 12 {
            NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
        };
        let end = next_month
            .and_then(|d| d.pred_opt())
            .unwrap_or(start);
        Self { start, end }
    }

    /// Build a period from optional query bounds, defaulting to the month of `today`.
    ///
    /// A missing start or end falls back to the matching bound of that month.
    pub fn from_bounds(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, PeriodError> {
        let default = Self::month_of(today);
        Self::new(start.unwrap_or(default.start), end.unwrap_or(default.end))
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// First instant of the period (UTC midnight of `start`).
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.start.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    /// First instant after the period (UTC midnight following `end`).
    pub fn ends_before(&self) -> DateTime<Utc> {
        self.end
            .checked_add_days(Days::new(1))
            .unwrap_or(self.end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
    }
}
