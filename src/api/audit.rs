use crate::auth::auth::AuthUser;
use crate::leave::AppLeaveService;
use crate::leave::audit_trail::AuditFilter;
use actix_web::{HttpResponse, Responder, web};

/// Approval/rejection history, newest first (Admin only)
#[utoipa::path(
    get,
    path = "/api/v1/audit",
    params(AuditFilter),
    responses(
        (status = 200, description = "Matching audit entries", body = [AuditEntry]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Audit"
)]
pub async fn audit_list(
    auth: AuthUser,
    service: web::Data<AppLeaveService>,
    query: web::Query<AuditFilter>,
) -> actix_web::Result<impl Responder> {
    let entries = service.query_audit_trail(&auth, &query).await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// Totals by action and the distinct performers (Admin only)
#[utoipa::path(
    get,
    path = "/api/v1/audit/summary",
    responses(
        (status = 200, description = "Audit summary", body = AuditSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Audit"
)]
pub async fn audit_summary(
    auth: AuthUser,
    service: web::Data<AppLeaveService>,
) -> actix_web::Result<impl Responder> {
    let summary = service.audit_summary(&auth).await?;
    Ok(HttpResponse::Ok().json(summary))
}
