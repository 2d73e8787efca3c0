use crate::auth::auth::AuthUser;
use crate::leave::AppLeaveService;
use crate::leave::period::Month;
use crate::leave::service::SubmitRequest;
use crate::leave::store::RequestFilter;
use actix_web::{HttpResponse, Responder, error::ErrorBadRequest, web};
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct RejectLeave {
    #[schema(example = "Exam week, no cover available")]
    pub reason: String,
}

#[derive(Deserialize, IntoParams)]
pub struct TeacherQuery {
    /// Teacher to inspect; defaults to the caller's own profile
    pub teacher_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "teacher_id": 1000,
    "month": "2026-10",
    "remaining_hours": 1.5
}))]
pub struct RemainingHoursResponse {
    pub teacher_id: u64,
    pub month: String,
    pub remaining_hours: f64,
}

fn target_teacher(auth: &AuthUser, query: &TeacherQuery) -> actix_web::Result<u64> {
    query
        .teacher_id
        .or(auth.teacher_id)
        .ok_or_else(|| ErrorBadRequest("teacher_id is required"))
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = SubmitRequest,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request filed as pending", body = LeaveRequest),
        (status = 400, description = "Validation, date rule, eligibility, quota or hour budget violation", body = Object, example = json!({
            "error": "hour_budget_exceeded",
            "message": "1.5 hour(s) exceeds the 1 hour(s) remaining this period",
            "details": {"reason": "remaining_budget", "requested": 1.5, "remaining": 1.0}
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    service: web::Data<AppLeaveService>,
    payload: web::Json<SubmitRequest>,
) -> actix_web::Result<impl Responder> {
    let request = service
        .submit_request(&auth, payload.into_inner(), Local::now().date_naive(), Utc::now())
        .await?;

    Ok(HttpResponse::Created().json(request))
}

/* =========================
Approve leave (Manager/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved", body = LeaveRequest),
        (status = 400, description = "Approving would exceed the quota or hour budget"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already finalized", body = Object, example = json!({
            "error": "state_error",
            "message": "request 7 already finalized as approved",
            "details": {"request_id": 7, "status": "approved"}
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    service: web::Data<AppLeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = service
        .approve_request(&auth, path.into_inner(), Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Reject leave (Manager/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body = RejectLeave,
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 400, description = "Blank rejection reason"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already finalized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    service: web::Data<AppLeaveService>,
    path: web::Path<u64>,
    payload: web::Json<RejectLeave>,
) -> actix_web::Result<impl Responder> {
    let request = service
        .reject_request(&auth, path.into_inner(), payload.into_inner().reason, Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(request))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Another teacher's request"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    service: web::Data<AppLeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = service.get_request(&auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(RequestFilter),
    responses(
        (status = 200, description = "Paginated leave list, newest first", body = RequestPage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Teachers may only list their own requests")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    service: web::Data<AppLeaveService>,
    query: web::Query<RequestFilter>,
) -> actix_web::Result<impl Responder> {
    let page = service.list_requests(&auth, query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Hours left in the current month's partial-day budget
#[utoipa::path(
    get,
    path = "/api/v1/leave/hours/remaining",
    params(TeacherQuery),
    responses(
        (status = 200, description = "Remaining hour budget", body = RemainingHoursResponse),
        (status = 400, description = "No teacher_id given and caller has no teacher profile"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Another teacher's budget"),
        (status = 404, description = "Teacher not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn remaining_hours(
    auth: AuthUser,
    service: web::Data<AppLeaveService>,
    query: web::Query<TeacherQuery>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = target_teacher(&auth, &query)?;
    let today = Local::now().date_naive();
    let remaining_hours = service.remaining_hour_budget(&auth, teacher_id, today).await?;

    Ok(HttpResponse::Ok().json(RemainingHoursResponse {
        teacher_id,
        month: Month::containing(today).to_string(),
        remaining_hours,
    }))
}

/// Tenure, quota tier and this month's usage
#[utoipa::path(
    get,
    path = "/api/v1/leave/eligibility",
    params(TeacherQuery),
    responses(
        (status = 200, description = "Eligibility and usage", body = EligibilitySummary),
        (status = 400, description = "No teacher_id given and caller has no teacher profile"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Another teacher's profile"),
        (status = 404, description = "Teacher not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn eligibility(
    auth: AuthUser,
    service: web::Data<AppLeaveService>,
    query: web::Query<TeacherQuery>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = target_teacher(&auth, &query)?;
    let summary = service
        .eligibility(&auth, teacher_id, Local::now().date_naive())
        .await?;

    Ok(HttpResponse::Ok().json(summary))
}
