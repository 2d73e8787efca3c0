use crate::auth::auth::AuthUser;
use crate::leave::period::Month;
use crate::leave::store::mysql::MySqlLeaveStore;
use crate::model::attendance::{AttendanceDay, AttendanceRecord};
use actix_web::{HttpResponse, Responder, error::ErrorBadRequest, web};
use chrono::Local;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
pub struct SummaryQuery {
    /// `YYYY-MM`; defaults to the current month
    pub month: Option<String>,
    /// Teacher to summarize; defaults to the caller's own profile
    pub teacher_id: Option<u64>,
}

fn own_teacher_id(auth: &AuthUser) -> actix_web::Result<u64> {
    auth.teacher_id
        .ok_or_else(|| actix_web::error::ErrorForbidden("No teacher profile"))
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = own_teacher_id(&auth)?;

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (teacher_id, date, check_in)
        VALUES (?, CURDATE(), CURTIME())
        "#,
    )
    .bind(teacher_id)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Checked in successfully"
        }))),

        Err(e) => {
            // UNIQUE (teacher_id, date)
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                        "message": "Already checked in today"
                    })));
                }
            }

            tracing::error!(error = %e, teacher_id, "Check-in failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = own_teacher_id(&auth)?;

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET check_out = CURTIME()
        WHERE teacher_id = ?
        AND date = CURDATE()
        AND check_out IS NULL
        "#,
    )
    .bind(teacher_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, teacher_id, "Check-out failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "No active check-in found for today"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully"
    })))
}

/// Monthly attendance record built from check-ins and leave requests
#[utoipa::path(
    get,
    path = "/api/v1/attendance/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Monthly attendance record", body = AttendanceRecord),
        (status = 400, description = "Malformed month or missing teacher_id"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Another teacher's record"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    store: web::Data<MySqlLeaveStore>,
    query: web::Query<SummaryQuery>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = query
        .teacher_id
        .or(auth.teacher_id)
        .ok_or_else(|| ErrorBadRequest("teacher_id is required"))?;
    auth.require_self_or_manager(teacher_id)?;

    let today = Local::now().date_naive();
    let month = match query.month.as_deref() {
        Some(raw) => Month::parse(raw).ok_or_else(|| ErrorBadRequest("month must be YYYY-MM"))?,
        None => Month::containing(today),
    };

    let days = sqlx::query_as::<_, AttendanceDay>(
        r#"
        SELECT id, teacher_id, date, check_in, check_out
        FROM attendance
        WHERE teacher_id = ?
        AND date BETWEEN ? AND ?
        "#,
    )
    .bind(teacher_id)
    .bind(month.first_day())
    .bind(month.last_day())
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, teacher_id, %month, "Failed to fetch attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let requests = store.requests_in_month(teacher_id, month).await.map_err(|e| {
        tracing::error!(error = %e, teacher_id, %month, "Failed to fetch leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(AttendanceRecord::compile(
        teacher_id, month, &days, &requests, today,
    )))
}
