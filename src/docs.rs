use crate::api::leave_request::{RejectLeave, RemainingHoursResponse};
use crate::api::teacher::{CreateTeacher, TeacherListResponse, UpdateTeacher};
use crate::leave::audit_trail::{AuditFilter, AuditSummary};
use crate::leave::eligibility::QuotaTier;
use crate::leave::service::{EligibilitySummary, SubmitRequest};
use crate::leave::store::{RequestFilter, RequestPage};
use crate::model::attendance::AttendanceRecord;
use crate::model::audit::{AuditAction, AuditDetails, AuditEntry};
use crate::model::leave_request::{LeaveRequest, RequestStatus, RequestType};
use crate::model::role::Role;
use crate::model::teacher::Teacher;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staff Leave API",
        version = "1.0.0",
        description = r#"
## School Staff Leave & Attendance

Teachers check in and out, file late-arrival, early-leave and absence
requests; managers approve or reject them; admins review the audit trail.

### Rules enforced on every request
- **Working days**: Friday and Saturday are closed
- **Notice**: absences need two days' notice, partial days none
- **Eligibility**: authorized absence after 3 months of tenure
- **Monthly quota**: 9 days (12 after 24 months of tenure)
- **Hour budget**: 4 partial-day hours per month, at most 2 per request, in 0.5h steps

### Errors
Every rule violation returns `{"error", "message", "details"}` where `error`
is a stable code clients can localize against.

### Security
All endpoints require a **JWT Bearer** access token.
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::remaining_hours,
        crate::api::leave_request::eligibility,

        crate::api::audit::audit_list,
        crate::api::audit::audit_summary,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::attendance_summary,

        crate::api::teacher::create_teacher,
        crate::api::teacher::get_teacher,
        crate::api::teacher::list_teachers,
        crate::api::teacher::update_teacher,
        crate::api::teacher::deactivate_teacher
    ),
    components(
        schemas(
            LeaveRequest,
            RequestType,
            RequestStatus,
            SubmitRequest,
            RejectLeave,
            RequestFilter,
            RequestPage,
            RemainingHoursResponse,
            EligibilitySummary,
            QuotaTier,
            AuditEntry,
            AuditAction,
            AuditDetails,
            AuditFilter,
            AuditSummary,
            Role,
            AttendanceRecord,
            Teacher,
            CreateTeacher,
            UpdateTeacher,
            TeacherListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "Audit", description = "Approval audit trail APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Teacher", description = "Teacher profile APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
