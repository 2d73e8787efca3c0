use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDate, TimeZone, Utc};

use super::*;
use crate::leave::date_rules::DateRuleViolation;
use crate::leave::hour_budget::HourBudgetViolation;
use crate::leave::quota::QuotaViolation;
use crate::leave::store::memory::MemoryStore;
use crate::leave::store::{QuotaStore, RequestStore};
use crate::model::audit::AuditAction;
use crate::model::leave_request::RequestStatus;

const TEACHER: u64 = 10;
const MANAGER: u64 = 7;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Sunday 2026-10-18.
fn today() -> NaiveDate {
    date(2026, 10, 18)
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 7, 0, 0).unwrap()
}

fn later() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
}

fn teacher_hired(id: u64, employment_date: Option<NaiveDate>) -> Teacher {
    Teacher {
        id,
        teacher_code: format!("T-{id:03}"),
        full_name: format!("Teacher {id}"),
        email: format!("t{id}@school.edu"),
        department: "Science".into(),
        work_type: "full_time".into(),
        employment_date,
        is_active: true,
    }
}

fn service_with(teachers: Vec<Teacher>) -> LeaveService<MemoryStore> {
    LeaveService::new(
        MemoryStore::with_teachers(teachers),
        HourPolicy::default(),
        TeacherLocks::new(StdDuration::from_secs(60)),
    )
}

/// A teacher with ten months of tenure.
fn service() -> LeaveService<MemoryStore> {
    service_with(vec![teacher_hired(TEACHER, Some(date(2025, 12, 1)))])
}

fn teacher_actor(teacher_id: u64) -> AuthUser {
    AuthUser {
        user_id: 100 + teacher_id,
        username: format!("t{teacher_id}"),
        role: Role::Teacher,
        teacher_id: Some(teacher_id),
    }
}

fn manager() -> AuthUser {
    AuthUser {
        user_id: MANAGER,
        username: "manager".into(),
        role: Role::Manager,
        teacher_id: None,
    }
}

fn admin() -> AuthUser {
    AuthUser {
        user_id: 1,
        username: "admin".into(),
        role: Role::Admin,
        teacher_id: None,
    }
}

fn absence(day: NaiveDate) -> SubmitRequest {
    SubmitRequest {
        request_type: RequestType::AuthorizedAbsence,
        date: day,
        reason: "family event".into(),
        hours: None,
        days: None,
    }
}

fn partial(request_type: RequestType, day: NaiveDate, hours: f64) -> SubmitRequest {
    SubmitRequest {
        request_type,
        date: day,
        reason: "appointment".into(),
        hours: Some(hours),
        days: None,
    }
}

fn approved(request_type: RequestType, day: NaiveDate, hours: Option<f64>) -> LeaveRequest {
    LeaveRequest {
        id: 0,
        teacher_id: TEACHER,
        request_type,
        date: day,
        hours,
        days: None,
        reason: "seeded".into(),
        status: RequestStatus::Approved,
        approved_by: Some(MANAGER),
        approved_date: Some(now()),
        rejection_reason: None,
        created_at: now(),
        updated_at: now(),
    }
}

async fn submit(
    service: &LeaveService<MemoryStore>,
    submission: SubmitRequest,
) -> Result<LeaveRequest, LeaveError> {
    service
        .submit_request(&teacher_actor(TEACHER), submission, today(), now())
        .await
}

async fn remaining(service: &LeaveService<MemoryStore>) -> f64 {
    service
        .remaining_hour_budget(&manager(), TEACHER, today())
        .await
        .unwrap()
}

#[actix_web::test]
async fn new_hire_cannot_file_authorized_absence() {
    let hired = today() - Duration::days(40);
    let service = service_with(vec![teacher_hired(TEACHER, Some(hired))]);

    let err = submit(&service, absence(date(2026, 10, 26))).await.unwrap_err();
    assert!(matches!(
        err,
        LeaveError::Eligibility {
            tenure_months: 1,
            required_months: 3
        }
    ));
}

#[actix_web::test]
async fn absence_spans_are_bounded() {
    let service = service();
    for days in [0, quota::MAX_REQUEST_DAYS + 1, u32::MAX] {
        let mut submission = absence(date(2026, 10, 26));
        submission.days = Some(days);
        let err = submit(&service, submission).await.unwrap_err();
        assert!(
            matches!(err, LeaveError::Validation(ValidationError::InvalidDays(d)) if d == days),
            "{days}: {err:?}"
        );
    }
}

#[actix_web::test]
async fn approval_rechecks_eligibility() {
    let hired = today() - Duration::days(40);
    let service = service_with(vec![teacher_hired(TEACHER, Some(hired))]);
    let mut pending = approved(RequestType::AuthorizedAbsence, date(2026, 10, 26), None);
    pending.status = RequestStatus::Pending;
    pending.approved_by = None;
    pending.approved_date = None;
    let pending = service.store().seed(pending);

    let err = service
        .approve_request(&manager(), pending.id, later())
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Eligibility { tenure_months: 1, .. }));
    let stored = service.get_request(&manager(), pending.id).await.unwrap();
    assert_eq!(stored.status, RequestStatus::Pending);
}

#[actix_web::test]
async fn missing_employment_date_reads_as_ineligible() {
    let service = service_with(vec![teacher_hired(TEACHER, None)]);
    let err = submit(&service, absence(date(2026, 10, 26))).await.unwrap_err();
    assert!(matches!(err, LeaveError::Eligibility { tenure_months: 0, .. }));
}

#[actix_web::test]
async fn exhausted_quota_rejects_next_absence() {
    let service = service();
    for day in 1..=9 {
        service
            .store()
            .seed(approved(RequestType::AuthorizedAbsence, date(2026, 10, day), None));
    }

    let err = submit(&service, absence(date(2026, 10, 26))).await.unwrap_err();
    match err {
        LeaveError::QuotaExceeded(QuotaViolation::Exhausted { used, quota, .. }) => {
            assert_eq!((used, quota), (9, 9));
        }
        other => panic!("expected exhausted quota, got {other:?}"),
    }
}

#[actix_web::test]
async fn multi_day_absence_that_overflows_is_rejected() {
    let service = service();
    for day in 1..=7 {
        service
            .store()
            .seed(approved(RequestType::AuthorizedAbsence, date(2026, 10, day), None));
    }

    let mut three_days = absence(date(2026, 10, 26));
    three_days.days = Some(3);
    let err = submit(&service, three_days).await.unwrap_err();
    assert!(matches!(
        err,
        LeaveError::QuotaExceeded(QuotaViolation::WouldExceed { used: 7, requested: 3, .. })
    ));

    let mut two_days = absence(date(2026, 10, 26));
    two_days.days = Some(2);
    let request = submit(&service, two_days).await.unwrap();
    assert_eq!(request.days, Some(2));
}

#[actix_web::test]
async fn senior_teachers_get_twelve_days() {
    let service = service_with(vec![teacher_hired(TEACHER, Some(date(2020, 1, 1)))]);
    for day in 1..=11 {
        service
            .store()
            .seed(approved(RequestType::AuthorizedAbsence, date(2026, 10, day), None));
    }
    assert!(submit(&service, absence(date(2026, 10, 26))).await.is_ok());

    let summary = service
        .eligibility(&teacher_actor(TEACHER), TEACHER, today())
        .await
        .unwrap();
    assert_eq!(summary.tier, QuotaTier::Senior);
    assert_eq!(summary.day_quota, 12);
    assert_eq!(summary.used_days, 11);
    assert_eq!(summary.remaining_days, 1);
}

#[actix_web::test]
async fn approvals_never_push_a_month_past_the_quota() {
    let service = service();
    let mut pending = Vec::new();
    for day in [20, 21, 22, 25, 26, 27, 28, 29] {
        pending.push(submit(&service, absence(date(2026, 10, day))).await.unwrap());
    }
    let mut november = absence(date(2026, 11, 2));
    november.days = Some(1);
    pending.push(submit(&service, november).await.unwrap());
    // Pending requests do not count against the quota at submission.
    pending.push(submit(&service, absence(date(2026, 10, 20))).await.unwrap());
    pending.push(submit(&service, absence(date(2026, 10, 21))).await.unwrap());

    let mut approved_count = 0;
    let mut refused = 0;
    for request in &pending {
        match service.approve_request(&manager(), request.id, later()).await {
            Ok(_) => approved_count += 1,
            Err(LeaveError::QuotaExceeded(_)) => refused += 1,
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }

    // Nine October days plus the November one fit; the tenth October day does not.
    assert_eq!(approved_count, 10);
    assert_eq!(refused, 1);
    let october = service
        .store()
        .approved_absences(TEACHER, Month { year: 2026, month: 10 })
        .await
        .unwrap();
    assert_eq!(quota::existing_days(&october, Month { year: 2026, month: 10 }), 9);
}

#[actix_web::test]
async fn one_hour_left_blocks_a_ninety_minute_early_leave() {
    let service = service();
    service
        .store()
        .seed(approved(RequestType::LateArrival, date(2026, 10, 5), Some(2.0)));
    service
        .store()
        .seed(approved(RequestType::EarlyLeave, date(2026, 10, 12), Some(1.0)));

    let remaining = service
        .remaining_hour_budget(&teacher_actor(TEACHER), TEACHER, today())
        .await
        .unwrap();
    assert_eq!(remaining, 1.0);

    let err = submit(&service, partial(RequestType::EarlyLeave, date(2026, 10, 19), 1.5))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LeaveError::HourBudgetExceeded(HourBudgetViolation::RemainingBudget { .. })
    ));
    assert!(submit(&service, partial(RequestType::EarlyLeave, date(2026, 10, 19), 1.0))
        .await
        .is_ok());
}

#[actix_web::test]
async fn malformed_and_oversized_hours() {
    let service = service();
    let day = date(2026, 10, 19);

    for bad in [0.0, 0.25, 1.2] {
        let err = submit(&service, partial(RequestType::LateArrival, day, bad))
            .await
            .unwrap_err();
        assert!(
            matches!(err, LeaveError::Validation(ValidationError::MalformedHours(_))),
            "{bad}: {err:?}"
        );
    }

    let err = submit(&service, partial(RequestType::LateArrival, day, 2.5))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LeaveError::HourBudgetExceeded(HourBudgetViolation::PerRequestCap { .. })
    ));

    let mut no_hours = partial(RequestType::LateArrival, day, 1.0);
    no_hours.hours = None;
    let err = submit(&service, no_hours).await.unwrap_err();
    assert!(matches!(
        err,
        LeaveError::Validation(ValidationError::MissingHours(RequestType::LateArrival))
    ));
}

#[actix_web::test]
async fn pending_hours_are_consumed_only_at_approval() {
    let service = service();
    let day = date(2026, 10, 19);
    let first = submit(&service, partial(RequestType::LateArrival, day, 2.0)).await.unwrap();
    let second = submit(&service, partial(RequestType::EarlyLeave, day, 2.0)).await.unwrap();
    let third = submit(&service, partial(RequestType::EarlyLeave, day, 0.5)).await.unwrap();

    assert_eq!(remaining(&service).await, 4.0);

    service.approve_request(&manager(), first.id, later()).await.unwrap();
    assert_eq!(remaining(&service).await, 2.0);
    service.approve_request(&manager(), second.id, later()).await.unwrap();
    assert_eq!(remaining(&service).await, 0.0);

    let err = service
        .approve_request(&manager(), third.id, later())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LeaveError::HourBudgetExceeded(HourBudgetViolation::RemainingBudget { .. })
    ));
    let third = service.get_request(&manager(), third.id).await.unwrap();
    assert_eq!(third.status, RequestStatus::Pending);
}

#[actix_web::test]
async fn concurrent_approvals_share_the_last_hours() {
    let service = service();
    service
        .store()
        .seed(approved(RequestType::LateArrival, date(2026, 10, 5), Some(2.0)));
    let day = date(2026, 10, 19);
    let a = submit(&service, partial(RequestType::LateArrival, day, 2.0)).await.unwrap();
    let b = submit(&service, partial(RequestType::EarlyLeave, day, 2.0)).await.unwrap();
    service.store().interleave_budget_reads();

    let manager = manager();
    let (ra, rb) = futures::join!(
        service.approve_request(&manager, a.id, later()),
        service.approve_request(&manager, b.id, later())
    );
    assert_eq!(ra.is_ok() as u8 + rb.is_ok() as u8, 1);
    let loser = ra.err().or(rb.err()).unwrap();
    assert!(matches!(
        loser,
        LeaveError::HourBudgetExceeded(HourBudgetViolation::RemainingBudget { .. })
    ));
    assert_eq!(remaining(&service).await, 0.0);
}

#[actix_web::test]
async fn concurrent_approvals_share_the_last_quota_day() {
    let service = service();
    for d in 1..=8 {
        service
            .store()
            .seed(approved(RequestType::AuthorizedAbsence, date(2026, 10, d), None));
    }
    let a = submit(&service, absence(date(2026, 10, 25))).await.unwrap();
    let b = submit(&service, absence(date(2026, 10, 26))).await.unwrap();
    service.store().interleave_budget_reads();

    let manager = manager();
    let (ra, rb) = futures::join!(
        service.approve_request(&manager, a.id, later()),
        service.approve_request(&manager, b.id, later())
    );
    assert_eq!(ra.is_ok() as u8 + rb.is_ok() as u8, 1);
    let loser = ra.err().or(rb.err()).unwrap();
    assert!(matches!(
        loser,
        LeaveError::QuotaExceeded(QuotaViolation::Exhausted { used: 9, quota: 9, .. })
    ));
}

#[actix_web::test]
async fn weekend_dates_are_rejected_first() {
    let service = service();
    let saturday = date(2026, 10, 24);
    let err = submit(&service, partial(RequestType::LateArrival, saturday, 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::DateRule(DateRuleViolation::NonWorkingDay { .. })));

    // Still the weekend rule, even with a blank reason.
    let mut blank = absence(date(2026, 10, 23));
    blank.reason = "   ".into();
    let err = submit(&service, blank).await.unwrap_err();
    assert!(matches!(err, LeaveError::DateRule(DateRuleViolation::NonWorkingDay { .. })));
}

#[actix_web::test]
async fn notice_windows_per_type() {
    let service = service();
    let err = submit(&service, absence(date(2026, 10, 19))).await.unwrap_err();
    assert!(matches!(
        err,
        LeaveError::DateRule(DateRuleViolation::InsufficientNotice { .. })
    ));
    assert!(submit(&service, absence(date(2026, 10, 20))).await.is_ok());
    assert!(submit(&service, partial(RequestType::LateArrival, today(), 0.5))
        .await
        .is_ok());
}

#[actix_web::test]
async fn reason_is_mandatory_and_trimmed() {
    let service = service();
    let mut blank = absence(date(2026, 10, 20));
    blank.reason = " \t".into();
    let err = submit(&service, blank).await.unwrap_err();
    assert!(matches!(err, LeaveError::Validation(ValidationError::BlankReason)));

    let mut padded = absence(date(2026, 10, 20));
    padded.reason = "  wedding  ".into();
    assert_eq!(submit(&service, padded).await.unwrap().reason, "wedding");
}

#[actix_web::test]
async fn reporting_types_cannot_be_filed() {
    let service = service();
    for request_type in [RequestType::UnauthorizedAbsence, RequestType::Overtime] {
        let mut submission = absence(date(2026, 10, 20));
        submission.request_type = request_type;
        let err = submit(&service, submission).await.unwrap_err();
        assert!(matches!(
            err,
            LeaveError::Validation(ValidationError::NotSubmittable(t)) if t == request_type
        ));
    }
}

#[actix_web::test]
async fn approve_once_then_state_error() {
    let service = service();
    let request = submit(&service, partial(RequestType::LateArrival, date(2026, 10, 19), 1.0))
        .await
        .unwrap();

    let approved = service
        .approve_request(&manager(), request.id, later())
        .await
        .unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.approved_by, Some(MANAGER));
    assert_eq!(approved.approved_date, Some(later()));

    let log = service.store().audit_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].action_type, AuditAction::Approve);
    assert_eq!(log[0].details.previous_status, RequestStatus::Pending);
    assert_eq!(log[0].details.new_status, RequestStatus::Approved);
    assert_eq!(log[0].teacher_name, format!("Teacher {TEACHER}"));

    let again = service
        .approve_request(&manager(), request.id, later())
        .await
        .unwrap_err();
    assert!(matches!(again, LeaveError::State { status: RequestStatus::Approved, .. }));
    let reject = service
        .reject_request(&manager(), request.id, "too late".into(), later())
        .await
        .unwrap_err();
    assert!(matches!(reject, LeaveError::State { .. }));
    assert_eq!(service.store().audit_log().len(), 1);
}

#[actix_web::test]
async fn reject_records_reason_and_audit() {
    let service = service();
    let request = submit(&service, absence(date(2026, 10, 20))).await.unwrap();

    let rejected = service
        .reject_request(&manager(), request.id, "exam week".into(), later())
        .await
        .unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("exam week"));

    let log = service.store().audit_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].action_type, AuditAction::Reject);
    assert_eq!(log[0].details.new_status, RequestStatus::Rejected);
    assert_eq!(log[0].details.reason.as_deref(), Some("exam week"));
}

#[actix_web::test]
async fn teachers_cannot_decide_or_read_audit() {
    let service = service();
    let request = submit(&service, absence(date(2026, 10, 20))).await.unwrap();
    let err = service
        .approve_request(&teacher_actor(TEACHER), request.id, later())
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Authorization { .. }));

    for actor in [teacher_actor(TEACHER), manager()] {
        assert!(matches!(
            service.query_audit_trail(&actor, &AuditFilter::default()).await,
            Err(LeaveError::Authorization { .. })
        ));
        assert!(matches!(
            service.audit_summary(&actor).await,
            Err(LeaveError::Authorization { .. })
        ));
    }
}

#[actix_web::test]
async fn admin_queries_audit_trail() {
    let service = service();
    let a = submit(&service, absence(date(2026, 10, 20))).await.unwrap();
    let b = submit(&service, absence(date(2026, 10, 21))).await.unwrap();
    service.approve_request(&manager(), a.id, later()).await.unwrap();
    service
        .reject_request(&admin(), b.id, "staffing".into(), later())
        .await
        .unwrap();

    let rejections = service
        .query_audit_trail(
            &admin(),
            &AuditFilter {
                action_type: Some(AuditAction::Reject),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(rejections.len(), 1);
    assert_eq!(rejections[0].request_id, b.id);
    assert_eq!(rejections[0].performer_role, Role::Admin);

    let summary = service.audit_summary(&admin()).await.unwrap();
    assert_eq!(summary.total_actions, 2);
    assert_eq!(summary.by_action_type[&AuditAction::Approve], 1);
    assert_eq!(summary.distinct_performers.len(), 2);
}

#[actix_web::test]
async fn concurrent_finalization_surfaces_as_state_error() {
    let service = service();
    let request = submit(&service, absence(date(2026, 10, 20))).await.unwrap();
    let transition = lifecycle::decide(
        &request,
        "Teacher 10",
        Decision::Approve,
        &manager(),
        later(),
    )
    .unwrap();

    service
        .store()
        .overwrite_status(request.id, RequestStatus::Rejected);
    let err = service.commit(transition).await.unwrap_err();
    assert!(matches!(err, LeaveError::State { status: RequestStatus::Rejected, .. }));
    assert!(service.store().audit_log().is_empty());
}

#[actix_web::test]
async fn store_outage_is_not_masked() {
    let service = service();
    service.store().set_unavailable(true);
    let err = submit(&service, absence(date(2026, 10, 20))).await.unwrap_err();
    assert!(matches!(err, LeaveError::Store(StoreError::Unavailable(_))));
}

#[actix_web::test]
async fn teachers_list_only_their_own_requests() {
    let other = 11;
    let service = service_with(vec![
        teacher_hired(TEACHER, Some(date(2025, 1, 1))),
        teacher_hired(other, Some(date(2025, 1, 1))),
    ]);
    submit(&service, absence(date(2026, 10, 20))).await.unwrap();
    service
        .submit_request(&teacher_actor(other), absence(date(2026, 10, 21)), today(), now())
        .await
        .unwrap();

    let own = service
        .list_requests(&teacher_actor(TEACHER), RequestFilter::default())
        .await
        .unwrap();
    assert_eq!(own.total, 1);
    assert!(own.data.iter().all(|r| r.teacher_id == TEACHER));

    let snooping = RequestFilter {
        teacher_id: Some(other),
        ..Default::default()
    };
    assert!(matches!(
        service.list_requests(&teacher_actor(TEACHER), snooping).await,
        Err(LeaveError::Authorization { .. })
    ));

    let all = service
        .list_requests(&manager(), RequestFilter::default())
        .await
        .unwrap();
    assert_eq!(all.total, 2);

    let pending_absences = RequestFilter {
        status: Some(RequestStatus::Pending),
        request_type: Some(RequestType::AuthorizedAbsence),
        from: Some(date(2026, 10, 21)),
        ..Default::default()
    };
    let page = service.list_requests(&manager(), pending_absences).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].teacher_id, other);

    let inserted = service.store().request(1).await.unwrap().unwrap();
    assert!(matches!(
        service.get_request(&teacher_actor(other), inserted.id).await,
        Err(LeaveError::Authorization { .. })
    ));
}

#[actix_web::test]
async fn deactivated_teachers_cannot_file() {
    let mut teacher = teacher_hired(TEACHER, Some(date(2025, 1, 1)));
    teacher.is_active = false;
    let service = service_with(vec![teacher]);
    let err = submit(&service, absence(date(2026, 10, 20))).await.unwrap_err();
    assert!(matches!(err, LeaveError::Authorization { .. }));
}

#[actix_web::test]
async fn unknown_request_is_not_found() {
    let service = service();
    let err = service
        .approve_request(&manager(), 999, later())
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::NotFound { entity: "request", id: 999 }));
}
