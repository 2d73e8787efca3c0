use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::leave::date_rules::is_non_working_day;
use crate::leave::period::Month;
use crate::model::leave_request::{LeaveRequest, RequestStatus, RequestType};

/// One day's check-in/check-out row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceDay {
    pub id: u64,
    pub teacher_id: u64,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
}

impl AttendanceDay {
    /// Hours between check-in and check-out; an open day counts zero.
    pub fn worked_hours(&self) -> f64 {
        match (self.check_in, self.check_out) {
            (Some(start), Some(end)) if end > start => (end - start).num_minutes() as f64 / 60.0,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "teacher_id": 1000,
    "month": "2026-10",
    "permitted_leaves": 2,
    "unpermitted_leaves": 1,
    "authorized_absence_days": 3,
    "unauthorized_absence_days": 0,
    "late_hours": 1.5,
    "overtime_hours": 4.0,
    "days_present": 10,
    "working_days": 12,
    "worked_hours": 71.5,
    "attendance_rate": 83.3,
    "total_hours": 75.5
}))]
pub struct AttendanceRecord {
    pub teacher_id: u64,
    pub month: String,
    /// Approved early leaves
    pub permitted_leaves: u32,
    /// Rejected early leaves
    pub unpermitted_leaves: u32,
    pub authorized_absence_days: u32,
    pub unauthorized_absence_days: u32,
    pub late_hours: f64,
    pub overtime_hours: f64,
    pub days_present: u32,
    /// Non-weekend days of the month elapsed so far
    pub working_days: u32,
    pub worked_hours: f64,
    /// Percent of working days present, one decimal
    pub attendance_rate: f64,
    /// Worked plus overtime hours
    pub total_hours: f64,
}

impl AttendanceRecord {
    pub fn compile(
        teacher_id: u64,
        month: Month,
        days: &[AttendanceDay],
        requests: &[LeaveRequest],
        today: NaiveDate,
    ) -> Self {
        let mut record = Self {
            teacher_id,
            month: month.to_string(),
            permitted_leaves: 0,
            unpermitted_leaves: 0,
            authorized_absence_days: 0,
            unauthorized_absence_days: 0,
            late_hours: 0.0,
            overtime_hours: 0.0,
            days_present: 0,
            working_days: month
                .days()
                .filter(|d| *d <= today && !is_non_working_day(*d))
                .count() as u32,
            worked_hours: 0.0,
            attendance_rate: 0.0,
            total_hours: 0.0,
        };

        for day in days.iter().filter(|d| month.contains(d.date)) {
            if day.check_in.is_some() {
                record.days_present += 1;
            }
            record.worked_hours += day.worked_hours();
        }

        for request in requests.iter().filter(|r| r.teacher_id == teacher_id) {
            let overlap = month.overlap_days(request.date, request.end_date());
            if overlap == 0 {
                continue;
            }
            match (request.request_type, request.status) {
                (RequestType::EarlyLeave, RequestStatus::Approved) => record.permitted_leaves += 1,
                (RequestType::EarlyLeave, RequestStatus::Rejected) => {
                    record.unpermitted_leaves += 1
                }
                (RequestType::LateArrival, RequestStatus::Approved) => {
                    record.late_hours += request.hours.unwrap_or(0.0)
                }
                (RequestType::AuthorizedAbsence, RequestStatus::Approved) => {
                    record.authorized_absence_days += overlap
                }
                // Recorded by ingestion; only an explicit rejection voids them.
                (RequestType::UnauthorizedAbsence, status) if status != RequestStatus::Rejected => {
                    record.unauthorized_absence_days += overlap
                }
                (RequestType::Overtime, status) if status != RequestStatus::Rejected => {
                    record.overtime_hours += request.hours.unwrap_or(0.0)
                }
                _ => {}
            }
        }

        record.attendance_rate = rate(record.days_present, record.working_days);
        record.total_hours = record.worked_hours + record.overtime_hours;
        record
    }
}

fn rate(present: u32, working: u32) -> f64 {
    if working == 0 {
        return 0.0;
    }
    (f64::from(present) / f64::from(working) * 1000.0).round() / 10.0
}
