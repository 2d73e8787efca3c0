use chrono::{Datelike, Duration, NaiveDate, Weekday};
use derive_more::Display;
use serde::Serialize;

use crate::model::leave_request::RequestType;

/// The school's fixed weekend.
pub const WEEKEND: [Weekday; 2] = [Weekday::Fri, Weekday::Sat];

#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum DateRuleViolation {
    #[display(fmt = "{} is a non-working day ({:?})", date, weekday)]
    NonWorkingDay {
        date: NaiveDate,
        #[serde(serialize_with = "serialize_weekday")]
        weekday: Weekday,
    },
    #[display(
        fmt = "{} requests need {} day(s) notice; earliest allowed date is {}",
        request_type,
        notice_days,
        earliest
    )]
    InsufficientNotice {
        request_type: RequestType,
        date: NaiveDate,
        earliest: NaiveDate,
        notice_days: i64,
    },
}

fn serialize_weekday<S: serde::Serializer>(weekday: &Weekday, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{:?}", weekday))
}

pub fn is_non_working_day(date: NaiveDate) -> bool {
    WEEKEND.contains(&date.weekday())
}

/// Calendar days of advance notice each request type needs.
pub fn notice_days(request_type: RequestType) -> i64 {
    match request_type {
        RequestType::LateArrival | RequestType::EarlyLeave => 0,
        RequestType::AuthorizedAbsence
        | RequestType::UnauthorizedAbsence
        | RequestType::Overtime => 2,
    }
}

/// Checks the weekend rule first, then advance notice, at day granularity.
pub fn validate(
    request_type: RequestType,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<(), DateRuleViolation> {
    if is_non_working_day(date) {
        return Err(DateRuleViolation::NonWorkingDay {
            date,
            weekday: date.weekday(),
        });
    }

    let notice_days = notice_days(request_type);
    let earliest = today + Duration::days(notice_days);
    if date < earliest {
        return Err(DateRuleViolation::InsufficientNotice {
            request_type,
            date,
            earliest,
            notice_days,
        });
    }

    Ok(())
}
