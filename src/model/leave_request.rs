use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    AsRefStr,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestType {
    LateArrival,
    EarlyLeave,
    AuthorizedAbsence,
    /// Recorded by attendance ingestion, never filed by a teacher.
    UnauthorizedAbsence,
    /// Recorded by attendance ingestion, never filed by a teacher.
    Overtime,
}

impl RequestType {
    /// Partial-day requests draw from the hour budget.
    pub fn is_partial_day(self) -> bool {
        matches!(self, RequestType::LateArrival | RequestType::EarlyLeave)
    }
}

#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    AsRefStr,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        match self {
            RequestStatus::Pending => false,
            RequestStatus::Approved | RequestStatus::Rejected => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "teacher_id": 1000,
    "request_type": "early_leave",
    "date": "2026-10-19",
    "hours": 1.5,
    "days": null,
    "reason": "Medical appointment",
    "status": "pending",
    "approved_by": null,
    "approved_date": null,
    "rejection_reason": null,
    "created_at": "2026-10-18T08:00:00Z",
    "updated_at": "2026-10-18T08:00:00Z"
}))]
pub struct LeaveRequest {
    pub id: u64,
    pub teacher_id: u64,
    pub request_type: RequestType,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub hours: Option<f64>,
    pub days: Option<u32>,
    pub reason: String,
    pub status: RequestStatus,
    pub approved_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub approved_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// Number of calendar days covered; single-day requests count as one.
    pub fn day_count(&self) -> u32 {
        self.days.unwrap_or(1).max(1)
    }

    /// Inclusive last day of the request.
    pub fn end_date(&self) -> NaiveDate {
        self.date
            .checked_add_days(Days::new(u64::from(self.day_count() - 1)))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// A validated request ready to be persisted as `Pending`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub teacher_id: u64,
    pub request_type: RequestType,
    pub date: NaiveDate,
    pub hours: Option<f64>,
    pub days: Option<u32>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn partial_day_types_are_late_and_early() {
        let partial: Vec<_> = RequestType::iter().filter(|t| t.is_partial_day()).collect();
        assert_eq!(partial, vec![RequestType::LateArrival, RequestType::EarlyLeave]);
    }

    #[test]
    fn span_end_is_inclusive() {
        let at = chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 10, 1, 8, 0, 0).unwrap();
        let mut request = LeaveRequest {
            id: 1,
            teacher_id: 1,
            request_type: RequestType::AuthorizedAbsence,
            date: NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(),
            hours: None,
            days: None,
            reason: "wedding".into(),
            status: RequestStatus::Pending,
            approved_by: None,
            approved_date: None,
            rejection_reason: None,
            created_at: at,
            updated_at: at,
        };
        assert_eq!(request.end_date(), request.date);
        request.days = Some(3);
        assert_eq!(request.end_date(), NaiveDate::from_ymd_opt(2026, 10, 14).unwrap());
        request.days = Some(0);
        assert_eq!(request.day_count(), 1);
        request.date = NaiveDate::MAX;
        request.days = Some(3);
        assert_eq!(request.end_date(), NaiveDate::MAX);
    }

    #[test]
    fn status_strings_match_columns() {
        assert_eq!(RequestStatus::Pending.as_ref(), "pending");
        assert_eq!("approved".parse::<RequestStatus>().ok(), Some(RequestStatus::Approved));
        assert_eq!(RequestType::AuthorizedAbsence.to_string(), "authorized_absence");
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
    }
}
