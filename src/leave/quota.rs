use derive_more::Display;
use serde::Serialize;

use crate::leave::period::Month;
use crate::model::leave_request::{LeaveRequest, RequestStatus, RequestType};

#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum QuotaViolation {
    #[display(fmt = "already used all {} of {} days in {}", used, quota, month)]
    Exhausted {
        #[serde(serialize_with = "serialize_month")]
        month: Month,
        used: u32,
        quota: u32,
    },
    #[display(
        fmt = "{} more day(s) would exceed the {}-day quota for {} ({} used)",
        requested,
        quota,
        month,
        used
    )]
    WouldExceed {
        #[serde(serialize_with = "serialize_month")]
        month: Month,
        used: u32,
        requested: u32,
        quota: u32,
    },
}

/// Longest span a single absence request may cover.
pub const MAX_REQUEST_DAYS: u32 = 31;

fn serialize_month<S: serde::Serializer>(month: &Month, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&month.to_string())
}

/// Days of approved authorized absence that fall inside `month`.
///
/// Multi-day spans are clipped to the month; anything other than an
/// approved authorized absence is ignored.
pub fn existing_days<'a>(requests: impl IntoIterator<Item = &'a LeaveRequest>, month: Month) -> u32 {
    requests
        .into_iter()
        .filter(|r| {
            r.request_type == RequestType::AuthorizedAbsence && r.status == RequestStatus::Approved
        })
        .map(|r| month.overlap_days(r.date, r.end_date()))
        .sum()
}

/// Decides whether `requested` more days fit under `quota` given `used`.
pub fn check(month: Month, used: u32, requested: u32, quota: u32) -> Result<(), QuotaViolation> {
    if used >= quota {
        return Err(QuotaViolation::Exhausted { month, used, quota });
    }
    if used + requested > quota {
        return Err(QuotaViolation::WouldExceed {
            month,
            used,
            requested,
            quota,
        });
    }
    Ok(())
}
