//! Persistence seams for the leave engine.
//!
//! Quota and hour-budget counters are derived from approved requests, so the
//! stores only hand back the requests a tracker needs; the tracker does the
//! arithmetic.

use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::leave::audit_trail::AuditFilter;
use crate::leave::lifecycle::Transition;
use crate::leave::period::Month;
use crate::model::audit::AuditEntry;
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest, RequestStatus, RequestType};
use crate::model::teacher::Teacher;

#[cfg(test)]
pub mod memory;
pub mod mysql;

#[derive(Debug, Display)]
pub enum StoreError {
    /// The conditional status update found the request no longer pending.
    #[display(fmt = "request {} is no longer pending", _0)]
    Conflict(u64),
    #[display(fmt = "corrupt row: {}", _0)]
    Corrupt(String),
    #[display(fmt = "store unavailable: {}", _0)]
    Unavailable(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct RequestFilter {
    #[schema(example = 1000)]
    /// Filter by teacher ID (managers only; teachers always see their own)
    pub teacher_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by request status
    pub status: Option<RequestStatus>,
    #[schema(example = "early_leave")]
    /// Filter by request type
    pub request_type: Option<RequestType>,
    #[schema(example = "2026-10-01", value_type = Option<String>, format = "date")]
    #[param(value_type = Option<String>, format = "date")]
    /// Requests dated on or after
    pub from: Option<NaiveDate>,
    #[schema(example = "2026-10-31", value_type = Option<String>, format = "date")]
    #[param(value_type = Option<String>, format = "date")]
    /// Requests dated on or before
    pub to: Option<NaiveDate>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Items per page (max 100)
    pub per_page: Option<u64>,
}

impl RequestFilter {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page.unwrap_or(10).clamp(1, 100)
    }

    pub fn offset(&self) -> u64 {
        (self.page() - 1) * self.per_page()
    }

    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.teacher_id.is_none_or(|id| id == request.teacher_id)
            && self.status.is_none_or(|s| s == request.status)
            && self.request_type.is_none_or(|t| t == request.request_type)
            && self.from.is_none_or(|from| request.date >= from)
            && self.to.is_none_or(|to| request.date <= to)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RequestPage {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

pub trait TeacherDirectory {
    async fn teacher(&self, teacher_id: u64) -> Result<Option<Teacher>, StoreError>;
}

pub trait RequestStore {
    async fn insert_request(&self, request: NewLeaveRequest) -> Result<LeaveRequest, StoreError>;

    async fn request(&self, request_id: u64) -> Result<Option<LeaveRequest>, StoreError>;

    async fn list_requests(&self, filter: &RequestFilter) -> Result<RequestPage, StoreError>;

    /// Writes the new request state and its audit entry as one unit.
    ///
    /// Fails with [`StoreError::Conflict`] when the stored request is no
    /// longer pending; nothing is written in that case.
    async fn commit_transition(&self, transition: &Transition) -> Result<(), StoreError>;
}

pub trait QuotaStore {
    /// Approved authorized absences whose span touches `month`.
    async fn approved_absences(
        &self,
        teacher_id: u64,
        month: Month,
    ) -> Result<Vec<LeaveRequest>, StoreError>;
}

pub trait HourBudgetStore {
    /// Approved late-arrival and early-leave requests dated in `month`.
    async fn approved_partial_day(
        &self,
        teacher_id: u64,
        month: Month,
    ) -> Result<Vec<LeaveRequest>, StoreError>;
}

pub trait AuditStore {
    /// Entries matching `filter`, newest first.
    async fn audit_entries(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, StoreError>;
}

pub trait LeaveStore:
    TeacherDirectory + RequestStore + QuotaStore + HourBudgetStore + AuditStore
{
}

impl<T> LeaveStore for T where
    T: TeacherDirectory + RequestStore + QuotaStore + HourBudgetStore + AuditStore
{
}
