use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::leave::audit_trail::{self, AuditFilter, AuditSummary};
use crate::leave::date_rules;
use crate::leave::eligibility::{Eligibility, QuotaTier};
use crate::leave::error::{LeaveError, ValidationError};
use crate::leave::hour_budget::{self, HourPolicy};
use crate::leave::lifecycle::{self, Decision, Transition};
use crate::leave::period::Month;
use crate::leave::quota;
use crate::leave::store::{LeaveStore, RequestFilter, RequestPage, StoreError};
use crate::model::audit::AuditEntry;
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest, RequestType};
use crate::model::role::Role;
use crate::model::teacher::Teacher;
use crate::utils::teacher_locks::TeacherLocks;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(example = json!({
    "request_type": "early_leave",
    "date": "2026-10-19",
    "reason": "Medical appointment",
    "hours": 1.5
}))]
pub struct SubmitRequest {
    pub request_type: RequestType,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub reason: String,
    /// Required for late arrival and early leave, in 0.5 steps
    pub hours: Option<f64>,
    /// Authorized absence span length; defaults to 1
    pub days: Option<u32>,
}

/// What a teacher has earned and what is left this month.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EligibilitySummary {
    pub teacher_id: u64,
    pub tenure_months: u32,
    pub tier: QuotaTier,
    pub day_quota: u32,
    pub used_days: u32,
    pub remaining_days: u32,
    pub hour_budget: f64,
    pub used_hours: f64,
    pub remaining_hours: f64,
}

pub struct LeaveService<S> {
    store: S,
    hours: HourPolicy,
    locks: TeacherLocks,
}

impl<S: LeaveStore> LeaveService<S> {
    pub fn new(store: S, hours: HourPolicy, locks: TeacherLocks) -> Self {
        Self {
            store,
            hours,
            locks,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates and files a request for the calling teacher as `Pending`.
    #[instrument(
        name = "leave_submit",
        skip(self, actor, submission, now),
        fields(user_id = actor.user_id, request_type = %submission.request_type, date = %submission.date)
    )]
    pub async fn submit_request(
        &self,
        actor: &AuthUser,
        submission: SubmitRequest,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<LeaveRequest, LeaveError> {
        let teacher_id = actor.teacher_id.ok_or(LeaveError::Authorization {
            role: actor.role,
            action: "file requests without a teacher profile",
        })?;
        let teacher = self.active_teacher(teacher_id).await?;

        date_rules::validate(submission.request_type, submission.date, today)?;

        let reason = submission.reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::BlankReason.into());
        }

        let (hours, days) = match submission.request_type {
            RequestType::AuthorizedAbsence => {
                let eligibility = Eligibility::evaluate(teacher.employment_date, today);
                if !eligibility.is_eligible() {
                    return Err(LeaveError::ineligible(eligibility.tenure_months));
                }
                let days = submission.days.unwrap_or(1);
                if days == 0 || days > quota::MAX_REQUEST_DAYS {
                    return Err(ValidationError::InvalidDays(days).into());
                }
                self.check_absence_quota(teacher.id, submission.date, days, eligibility.day_quota)
                    .await?;
                (None, Some(days))
            }
            RequestType::LateArrival | RequestType::EarlyLeave => {
                let hours = submission
                    .hours
                    .ok_or(ValidationError::MissingHours(submission.request_type))?;
                hour_budget::validate_granularity(hours).map_err(ValidationError::MalformedHours)?;
                let remaining = self
                    .remaining_hours_in(teacher.id, Month::containing(submission.date))
                    .await?;
                self.hours.check(hours, remaining)?;
                (Some(hours), None)
            }
            RequestType::UnauthorizedAbsence | RequestType::Overtime => {
                return Err(ValidationError::NotSubmittable(submission.request_type).into());
            }
        };

        let request = self
            .store
            .insert_request(NewLeaveRequest {
                teacher_id: teacher.id,
                request_type: submission.request_type,
                date: submission.date,
                hours,
                days,
                reason: reason.to_string(),
                created_at: now,
            })
            .await?;

        info!(request_id = request.id, teacher_id = teacher.id, "Leave request submitted");
        Ok(request)
    }

    /// Approves a pending request, consuming quota or hour budget.
    ///
    /// The budget re-check and the commit run under the teacher's lock so two
    /// approvals can never both fit into the last remaining allowance.
    #[instrument(name = "leave_approve", skip(self, actor, at), fields(user_id = actor.user_id))]
    pub async fn approve_request(
        &self,
        actor: &AuthUser,
        request_id: u64,
        at: DateTime<Utc>,
    ) -> Result<LeaveRequest, LeaveError> {
        lifecycle::ensure_can_decide(actor)?;
        let teacher_id = self.find_request(request_id).await?.teacher_id;

        let lock = self.locks.handle(teacher_id).await;
        let _guard = lock.lock().await;

        let request = self.find_request(request_id).await?;
        lifecycle::ensure_pending(&request)?;
        let teacher = self.teacher(request.teacher_id).await?;
        let today = at.with_timezone(&Local).date_naive();

        match request.request_type {
            RequestType::AuthorizedAbsence => {
                let eligibility = Eligibility::evaluate(teacher.employment_date, today);
                if !eligibility.is_eligible() {
                    return Err(LeaveError::ineligible(eligibility.tenure_months));
                }
                self.check_absence_quota(
                    teacher.id,
                    request.date,
                    request.day_count(),
                    eligibility.day_quota,
                )
                .await?;
            }
            RequestType::LateArrival | RequestType::EarlyLeave => {
                let hours = request.hours.unwrap_or(0.0);
                let remaining = self
                    .remaining_hours_in(teacher.id, Month::containing(request.date))
                    .await?;
                self.hours.check(hours, remaining)?;
            }
            RequestType::UnauthorizedAbsence | RequestType::Overtime => {}
        }

        let transition = lifecycle::decide(&request, &teacher.full_name, Decision::Approve, actor, at)?;
        self.commit(transition).await
    }

    #[instrument(name = "leave_reject", skip(self, actor, reason, at), fields(user_id = actor.user_id))]
    pub async fn reject_request(
        &self,
        actor: &AuthUser,
        request_id: u64,
        reason: String,
        at: DateTime<Utc>,
    ) -> Result<LeaveRequest, LeaveError> {
        lifecycle::ensure_can_decide(actor)?;
        let teacher_id = self.find_request(request_id).await?.teacher_id;

        let lock = self.locks.handle(teacher_id).await;
        let _guard = lock.lock().await;

        let request = self.find_request(request_id).await?;
        let teacher = self.teacher(request.teacher_id).await?;
        let transition = lifecycle::decide(
            &request,
            &teacher.full_name,
            Decision::Reject { reason },
            actor,
            at,
        )?;
        self.commit(transition).await
    }

    pub async fn remaining_hour_budget(
        &self,
        actor: &AuthUser,
        teacher_id: u64,
        today: NaiveDate,
    ) -> Result<f64, LeaveError> {
        ensure_can_view(actor, teacher_id)?;
        self.teacher(teacher_id).await?;
        self.remaining_hours_in(teacher_id, Month::containing(today)).await
    }

    pub async fn eligibility(
        &self,
        actor: &AuthUser,
        teacher_id: u64,
        today: NaiveDate,
    ) -> Result<EligibilitySummary, LeaveError> {
        ensure_can_view(actor, teacher_id)?;
        let teacher = self.teacher(teacher_id).await?;
        let month = Month::containing(today);
        let eligibility = Eligibility::evaluate(teacher.employment_date, today);

        let absences = self.store.approved_absences(teacher_id, month).await?;
        let used_days = quota::existing_days(&absences, month);
        let partial = self.store.approved_partial_day(teacher_id, month).await?;
        let used_hours = hour_budget::used_hours(&partial, month);

        Ok(EligibilitySummary {
            teacher_id,
            tenure_months: eligibility.tenure_months,
            tier: eligibility.tier,
            day_quota: eligibility.day_quota,
            used_days,
            remaining_days: eligibility.day_quota.saturating_sub(used_days),
            hour_budget: self.hours.period_budget,
            used_hours,
            remaining_hours: self.hours.remaining(used_hours),
        })
    }

    /// Teachers see only their own requests; managers and admins see any.
    pub async fn list_requests(
        &self,
        actor: &AuthUser,
        mut filter: RequestFilter,
    ) -> Result<RequestPage, LeaveError> {
        if actor.is_teacher() {
            let own = actor.teacher_id.ok_or(LeaveError::Authorization {
                role: actor.role,
                action: "list requests without a teacher profile",
            })?;
            ensure_can_view(actor, filter.teacher_id.unwrap_or(own))?;
            filter.teacher_id = Some(own);
        }
        Ok(self.store.list_requests(&filter).await?)
    }

    pub async fn get_request(
        &self,
        actor: &AuthUser,
        request_id: u64,
    ) -> Result<LeaveRequest, LeaveError> {
        let request = self.find_request(request_id).await?;
        ensure_can_view(actor, request.teacher_id)?;
        Ok(request)
    }

    pub async fn query_audit_trail(
        &self,
        actor: &AuthUser,
        filter: &AuditFilter,
    ) -> Result<Vec<AuditEntry>, LeaveError> {
        audit_trail::ensure_admin(actor)?;
        Ok(self.store.audit_entries(filter).await?)
    }

    pub async fn audit_summary(&self, actor: &AuthUser) -> Result<AuditSummary, LeaveError> {
        audit_trail::ensure_admin(actor)?;
        let entries = self.store.audit_entries(&AuditFilter::default()).await?;
        Ok(AuditSummary::from_entries(&entries))
    }

    /// Checks every month the span `[start, start + days)` touches.
    async fn check_absence_quota(
        &self,
        teacher_id: u64,
        start: NaiveDate,
        days: u32,
        day_quota: u32,
    ) -> Result<(), LeaveError> {
        let end = start
            .checked_add_days(Days::new(u64::from(days.saturating_sub(1))))
            .ok_or(ValidationError::InvalidDays(days))?;
        let mut month = Month::containing(start);
        loop {
            let approved = self.store.approved_absences(teacher_id, month).await?;
            let used = quota::existing_days(&approved, month);
            quota::check(month, used, month.overlap_days(start, end), day_quota)?;
            if month.contains(end) {
                return Ok(());
            }
            month = month.next();
        }
    }

    async fn remaining_hours_in(&self, teacher_id: u64, month: Month) -> Result<f64, LeaveError> {
        let approved = self.store.approved_partial_day(teacher_id, month).await?;
        Ok(self.hours.remaining(hour_budget::used_hours(&approved, month)))
    }

    async fn commit(&self, transition: Transition) -> Result<LeaveRequest, LeaveError> {
        match self.store.commit_transition(&transition).await {
            Ok(()) => {
                info!(
                    request_id = transition.request.id,
                    action = %transition.audit.action_type,
                    performed_by = transition.audit.performed_by,
                    "Leave request finalized"
                );
                Ok(transition.request)
            }
            Err(StoreError::Conflict(request_id)) => {
                let current = self.find_request(request_id).await?;
                warn!(request_id, status = %current.status, "Request finalized concurrently");
                Err(LeaveError::State {
                    request_id,
                    status: current.status,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_request(&self, request_id: u64) -> Result<LeaveRequest, LeaveError> {
        self.store
            .request(request_id)
            .await?
            .ok_or(LeaveError::NotFound {
                entity: "request",
                id: request_id,
            })
    }

    async fn teacher(&self, teacher_id: u64) -> Result<Teacher, LeaveError> {
        self.store
            .teacher(teacher_id)
            .await?
            .ok_or(LeaveError::NotFound {
                entity: "teacher",
                id: teacher_id,
            })
    }

    async fn active_teacher(&self, teacher_id: u64) -> Result<Teacher, LeaveError> {
        let teacher = self.teacher(teacher_id).await?;
        if !teacher.is_active {
            return Err(LeaveError::Authorization {
                role: Role::Teacher,
                action: "file requests while deactivated",
            });
        }
        Ok(teacher)
    }
}

fn ensure_can_view(actor: &AuthUser, teacher_id: u64) -> Result<(), LeaveError> {
    match actor.role {
        Role::Admin | Role::Manager => Ok(()),
        Role::Teacher if actor.teacher_id == Some(teacher_id) => Ok(()),
        Role::Teacher => Err(LeaveError::Authorization {
            role: actor.role,
            action: "view another teacher's leave",
        }),
    }
}

#[cfg(test)]
mod tests;
