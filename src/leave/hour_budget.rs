use derive_more::Display;
use serde::Serialize;

use crate::leave::period::Month;
use crate::model::leave_request::{LeaveRequest, RequestStatus};

/// Smallest bookable step, also the minimum request.
pub const HOUR_STEP: f64 = 0.5;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HourPolicy {
    /// Partial-day hours allowed per calendar month.
    pub period_budget: f64,
    pub per_request_cap: f64,
}

impl Default for HourPolicy {
    fn default() -> Self {
        Self {
            period_budget: 4.0,
            per_request_cap: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Display, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum HourBudgetViolation {
    #[display(fmt = "{} hour(s) exceeds the per-request cap of {}", requested, cap)]
    PerRequestCap { requested: f64, cap: f64 },
    #[display(
        fmt = "{} hour(s) exceeds the {} hour(s) remaining this period",
        requested,
        remaining
    )]
    RemainingBudget { requested: f64, remaining: f64 },
}

/// Malformed hour values: wrong step or below the minimum.
#[derive(Debug, Clone, PartialEq, Display)]
#[display(fmt = "hours must be a multiple of {} and at least {} (got {})", HOUR_STEP, HOUR_STEP, _0)]
pub struct MalformedHours(pub f64);

pub fn validate_granularity(hours: f64) -> Result<(), MalformedHours> {
    let steps = hours / HOUR_STEP;
    if !hours.is_finite() || steps.fract() != 0.0 || hours < HOUR_STEP {
        return Err(MalformedHours(hours));
    }
    Ok(())
}

/// Approved partial-day hours dated inside `month`.
pub fn used_hours<'a>(requests: impl IntoIterator<Item = &'a LeaveRequest>, month: Month) -> f64 {
    requests
        .into_iter()
        .filter(|r| {
            r.request_type.is_partial_day()
                && r.status == RequestStatus::Approved
                && month.contains(r.date)
        })
        .filter_map(|r| r.hours)
        .sum()
}

impl HourPolicy {
    pub fn remaining(&self, used: f64) -> f64 {
        (self.period_budget - used).max(0.0)
    }

    /// Cap first, then the remaining budget. Granularity is checked separately.
    pub fn check(&self, hours: f64, remaining: f64) -> Result<(), HourBudgetViolation> {
        if hours > self.per_request_cap {
            return Err(HourBudgetViolation::PerRequestCap {
                requested: hours,
                cap: self.per_request_cap,
            });
        }
        if hours > remaining {
            return Err(HourBudgetViolation::RemainingBudget {
                requested: hours,
                remaining,
            });
        }
        Ok(())
    }
}
