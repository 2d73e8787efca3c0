use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};

use crate::leave::audit_trail::AuditFilter;
use crate::leave::eligibility::parse_employment_date;
use crate::leave::lifecycle::Transition;
use crate::leave::period::Month;
use crate::leave::store::{
    AuditStore, HourBudgetStore, QuotaStore, RequestFilter, RequestPage, RequestStore,
    StoreError, TeacherDirectory,
};
use crate::model::audit::{AuditDetails, AuditEntry};
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest, RequestStatus, RequestType};
use crate::model::teacher::Teacher;

const REQUEST_COLUMNS: &str = "id, teacher_id, request_type, date, hours, days, reason, status, \
     approved_by, approved_date, rejection_reason, created_at, updated_at";

pub(crate) const TEACHER_COLUMNS: &str =
    "id, teacher_code, full_name, email, department, work_type, employment_date, is_active";

#[derive(Clone)]
pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Every request of any type and status whose span touches `month`.
    pub async fn requests_in_month(
        &self,
        teacher_id: u64,
        month: Month,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests \
             WHERE teacher_id = ? \
             AND date <= ? AND DATE_ADD(date, INTERVAL GREATEST(COALESCE(days, 1), 1) - 1 DAY) >= ? \
             ORDER BY date"
        );
        let rows = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(teacher_id)
            .bind(month.last_day())
            .bind(month.first_day())
            .fetch_all(&self.pool)
            .await?;
        into_requests(rows)
    }
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(&'static str),
    Date(NaiveDate),
}

#[derive(FromRow)]
pub(crate) struct TeacherRow {
    id: u64,
    teacher_code: String,
    full_name: String,
    email: String,
    department: String,
    work_type: String,
    employment_date: Option<String>,
    is_active: bool,
}

impl From<TeacherRow> for Teacher {
    fn from(row: TeacherRow) -> Self {
        // Unparseable legacy values read as "no date" and so as zero tenure.
        let employment_date = row.employment_date.as_deref().and_then(parse_employment_date);
        if employment_date.is_none() {
            tracing::warn!(
                teacher_id = row.id,
                raw = ?row.employment_date,
                "employment date missing or unparseable"
            );
        }
        Teacher {
            id: row.id,
            teacher_code: row.teacher_code,
            full_name: row.full_name,
            email: row.email,
            department: row.department,
            work_type: row.work_type,
            employment_date,
            is_active: row.is_active,
        }
    }
}

#[derive(FromRow)]
struct RequestRow {
    id: u64,
    teacher_id: u64,
    request_type: String,
    date: NaiveDate,
    hours: Option<f64>,
    days: Option<u32>,
    reason: String,
    status: String,
    approved_by: Option<u64>,
    approved_date: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let request_type: RequestType = row.request_type.parse().map_err(|_| {
            StoreError::Corrupt(format!("request {} has type {:?}", row.id, row.request_type))
        })?;
        let status: RequestStatus = row.status.parse().map_err(|_| {
            StoreError::Corrupt(format!("request {} has status {:?}", row.id, row.status))
        })?;
        Ok(LeaveRequest {
            id: row.id,
            teacher_id: row.teacher_id,
            request_type,
            date: row.date,
            hours: row.hours,
            days: row.days,
            reason: row.reason,
            status,
            approved_by: row.approved_by,
            approved_date: row.approved_date,
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct AuditRow {
    id: String,
    request_id: u64,
    action_type: String,
    teacher_id: u64,
    teacher_name: String,
    performed_by: u64,
    performer_role: String,
    timestamp: DateTime<Utc>,
    previous_status: String,
    new_status: String,
    reason: Option<String>,
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = StoreError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, value: &str| {
            StoreError::Corrupt(format!("audit entry {} has {} {:?}", row.id, field, value))
        };
        Ok(AuditEntry {
            action_type: row
                .action_type
                .parse()
                .map_err(|_| corrupt("action_type", &row.action_type))?,
            performer_role: row
                .performer_role
                .parse()
                .map_err(|_| corrupt("performer_role", &row.performer_role))?,
            details: AuditDetails {
                previous_status: row
                    .previous_status
                    .parse()
                    .map_err(|_| corrupt("previous_status", &row.previous_status))?,
                new_status: row
                    .new_status
                    .parse()
                    .map_err(|_| corrupt("new_status", &row.new_status))?,
                reason: row.reason,
            },
            request_id: row.request_id,
            teacher_id: row.teacher_id,
            teacher_name: row.teacher_name,
            performed_by: row.performed_by,
            timestamp: row.timestamp,
            id: row.id,
        })
    }
}

fn into_requests(rows: Vec<RequestRow>) -> Result<Vec<LeaveRequest>, StoreError> {
    rows.into_iter().map(LeaveRequest::try_from).collect()
}

impl TeacherDirectory for MySqlLeaveStore {
    async fn teacher(&self, teacher_id: u64) -> Result<Option<Teacher>, StoreError> {
        let sql = format!("SELECT {TEACHER_COLUMNS} FROM teachers WHERE id = ?");
        let row = sqlx::query_as::<_, TeacherRow>(&sql)
            .bind(teacher_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Teacher::from))
    }
}

impl RequestStore for MySqlLeaveStore {
    async fn insert_request(&self, request: NewLeaveRequest) -> Result<LeaveRequest, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (teacher_id, request_type, date, hours, days, reason, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.teacher_id)
        .bind(request.request_type.as_ref())
        .bind(request.date)
        .bind(request.hours)
        .bind(request.days)
        .bind(&request.reason)
        .bind(RequestStatus::Pending.as_ref())
        .bind(request.created_at)
        .bind(request.created_at)
        .execute(&self.pool)
        .await?;

        Ok(LeaveRequest {
            id: result.last_insert_id(),
            teacher_id: request.teacher_id,
            request_type: request.request_type,
            date: request.date,
            hours: request.hours,
            days: request.days,
            reason: request.reason,
            status: RequestStatus::Pending,
            approved_by: None,
            approved_date: None,
            rejection_reason: None,
            created_at: request.created_at,
            updated_at: request.created_at,
        })
    }

    async fn request(&self, request_id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ?");
        sqlx::query_as::<_, RequestRow>(&sql)
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<RequestPage, StoreError> {
        // -------------------------
        // WHERE clause
        // -------------------------
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(teacher_id) = filter.teacher_id {
            where_sql.push_str(" AND teacher_id = ?");
            args.push(FilterValue::U64(teacher_id));
        }
        if let Some(status) = filter.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.into()));
        }
        if let Some(request_type) = filter.request_type {
            where_sql.push_str(" AND request_type = ?");
            args.push(FilterValue::Str(request_type.into()));
        }
        if let Some(from) = filter.from {
            where_sql.push_str(" AND date >= ?");
            args.push(FilterValue::Date(from));
        }
        if let Some(to) = filter.to {
            where_sql.push_str(" AND date <= ?");
            args.push(FilterValue::Date(to));
        }

        // -------------------------
        // COUNT query
        // -------------------------
        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(*s),
                FilterValue::Date(d) => count_q.bind(*d),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        // -------------------------
        // DATA query
        // -------------------------
        let data_sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests{where_sql} \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let mut data_q = sqlx::query_as::<_, RequestRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
                FilterValue::Date(d) => data_q.bind(d),
            };
        }
        let rows = data_q
            .bind(filter.per_page())
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(RequestPage {
            data: into_requests(rows)?,
            page: filter.page(),
            per_page: filter.per_page(),
            total,
        })
    }

    async fn commit_transition(&self, transition: &Transition) -> Result<(), StoreError> {
        let request = &transition.request;
        let audit = &transition.audit;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, approved_by = ?, approved_date = ?, rejection_reason = ?, updated_at = ?
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(request.status.as_ref())
        .bind(request.approved_by)
        .bind(request.approved_date)
        .bind(&request.rejection_reason)
        .bind(request.updated_at)
        .bind(request.id)
        .bind(audit.details.previous_status.as_ref())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // dropping `tx` rolls back
            return Err(StoreError::Conflict(request.id));
        }

        sqlx::query(
            r#"
            INSERT INTO audit_entries
                (id, request_id, action_type, teacher_id, teacher_name, performed_by,
                 performer_role, timestamp, previous_status, new_status, reason)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&audit.id)
        .bind(audit.request_id)
        .bind(audit.action_type.as_ref())
        .bind(audit.teacher_id)
        .bind(&audit.teacher_name)
        .bind(audit.performed_by)
        .bind(audit.performer_role.as_ref())
        .bind(audit.timestamp)
        .bind(audit.details.previous_status.as_ref())
        .bind(audit.details.new_status.as_ref())
        .bind(&audit.details.reason)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

impl QuotaStore for MySqlLeaveStore {
    async fn approved_absences(
        &self,
        teacher_id: u64,
        month: Month,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        // A span starting before the month can still reach into it.
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests \
             WHERE teacher_id = ? AND request_type = ? AND status = ? \
             AND date <= ? AND DATE_ADD(date, INTERVAL GREATEST(COALESCE(days, 1), 1) - 1 DAY) >= ?"
        );
        let rows = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(teacher_id)
            .bind(RequestType::AuthorizedAbsence.as_ref())
            .bind(RequestStatus::Approved.as_ref())
            .bind(month.last_day())
            .bind(month.first_day())
            .fetch_all(&self.pool)
            .await?;
        into_requests(rows)
    }
}

impl HourBudgetStore for MySqlLeaveStore {
    async fn approved_partial_day(
        &self,
        teacher_id: u64,
        month: Month,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests \
             WHERE teacher_id = ? AND request_type IN (?, ?) AND status = ? \
             AND date BETWEEN ? AND ?"
        );
        let rows = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(teacher_id)
            .bind(RequestType::LateArrival.as_ref())
            .bind(RequestType::EarlyLeave.as_ref())
            .bind(RequestStatus::Approved.as_ref())
            .bind(month.first_day())
            .bind(month.last_day())
            .fetch_all(&self.pool)
            .await?;
        into_requests(rows)
    }
}

impl AuditStore for MySqlLeaveStore {
    async fn audit_entries(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, StoreError> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(action_type) = filter.action_type {
            where_sql.push_str(" AND action_type = ?");
            args.push(FilterValue::Str(action_type.into()));
        }
        if let Some(performed_by) = filter.performed_by {
            where_sql.push_str(" AND performed_by = ?");
            args.push(FilterValue::U64(performed_by));
        }
        let (lower, upper) = filter.utc_bounds();
        if let Some(lower) = lower {
            where_sql.push_str(" AND timestamp >= ?");
            args.push(FilterValue::Date(lower));
        }
        if let Some(upper) = upper {
            where_sql.push_str(" AND timestamp < ?");
            args.push(FilterValue::Date(upper));
        }

        let sql = format!(
            "SELECT id, request_id, action_type, teacher_id, teacher_name, performed_by, \
             performer_role, timestamp, previous_status, new_status, reason \
             FROM audit_entries{where_sql} ORDER BY timestamp DESC"
        );
        let mut query = sqlx::query_as::<_, AuditRow>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::U64(v) => query.bind(v),
                FilterValue::Str(s) => query.bind(s),
                FilterValue::Date(d) => query.bind(d),
            };
        }
        let rows = query.fetch_all(&self.pool).await?;

        // SQL narrows by UTC; the exact window is on the local calendar date.
        rows.into_iter()
            .map(AuditEntry::try_from)
            .filter(|entry| entry.as_ref().map_or(true, |e| filter.matches(e)))
            .collect()
    }
}
