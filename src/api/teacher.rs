use crate::{
    auth::auth::AuthUser,
    leave::store::mysql::{TEACHER_COLUMNS, TeacherRow},
    model::teacher::Teacher,
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};

/// Columns a teacher update may touch.
const UPDATABLE: &[&str] = &[
    "teacher_code",
    "full_name",
    "email",
    "department",
    "work_type",
    "employment_date",
    "is_active",
];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateTeacher {
    #[schema(example = "T-001")]
    pub teacher_code: String,
    #[schema(example = "Amina Rahman")]
    pub full_name: String,
    #[schema(example = "amina.rahman@school.edu", format = "email")]
    pub email: String,
    #[schema(example = "Science")]
    pub department: String,
    #[schema(example = "full_time")]
    pub work_type: String,
    #[schema(example = "2024-01-15", format = "date", value_type = Option<String>)]
    pub employment_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TeacherQuery {
    /// Page number (start with 1)
    pub page: Option<u32>,
    /// Items per page (max 100)
    pub per_page: Option<u32>,
    /// Filter by department
    pub department: Option<String>,
    /// Filter by active flag
    pub is_active: Option<bool>,
    /// Search by name, code or email
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TeacherListResponse {
    pub data: Vec<Teacher>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

/// Partial update; only the fields present are written.
#[derive(Deserialize, ToSchema)]
pub struct UpdateTeacher {
    pub teacher_code: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub work_type: Option<String>,
    #[schema(example = "2024-01-15", format = "date", value_type = Option<String>)]
    pub employment_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

// Helper enum for typed SQLx binding
enum Bind {
    Str(String),
    Bool(bool),
}

/// Create Teacher
#[utoipa::path(
    post,
    path = "/api/v1/teacher",
    request_body = CreateTeacher,
    responses(
        (status = 201, description = "Teacher created", body = Object, example = json!({
            "message": "Teacher created",
            "id": 1000
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Teacher",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_teacher(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateTeacher>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    // Stored as ISO text; unparseable legacy values read back as zero tenure.
    let employment_date = payload.employment_date.map(|d| d.to_string());

    let result = sqlx::query(
        r#"
        INSERT INTO teachers
        (teacher_code, full_name, email, department, work_type, employment_date, is_active)
        VALUES (?, ?, ?, ?, ?, ?, TRUE)
        "#,
    )
    .bind(&payload.teacher_code)
    .bind(&payload.full_name)
    .bind(&payload.email)
    .bind(&payload.department)
    .bind(&payload.work_type)
    .bind(employment_date)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create teacher");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let id = result.last_insert_id();
    info!(teacher_id = id, created_by = auth.user_id, "Teacher created");

    Ok(HttpResponse::Created().json(json!({
        "message": "Teacher created",
        "id": id
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/teacher",
    params(TeacherQuery),
    responses(
        (status = 200, description = "Paginated teacher list", body = TeacherListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Manager/Admin only")
    ),
    tag = "Teacher",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_teachers(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TeacherQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<Bind> = Vec::new();

    if let Some(department) = &query.department {
        conditions.push("department = ?");
        bindings.push(Bind::Str(department.clone()));
    }

    if let Some(is_active) = query.is_active {
        conditions.push("is_active = ?");
        bindings.push(Bind::Bool(is_active));
    }

    if let Some(search) = &query.search {
        conditions.push("(full_name LIKE ? OR teacher_code LIKE ? OR email LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(Bind::Str(like.clone()));
        bindings.push(Bind::Str(like.clone()));
        bindings.push(Bind::Str(like));
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) as total FROM teachers {}", where_clause);
    debug!(sql = %count_sql, "Counting teachers");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = match b {
            Bind::Str(s) => count_query.bind(s.as_str()),
            Bind::Bool(v) => count_query.bind(*v),
        };
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count teachers");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT {TEACHER_COLUMNS} FROM teachers {} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching teachers");

    let mut data_query = sqlx::query_as::<_, TeacherRow>(&data_sql);
    for b in &bindings {
        data_query = match b {
            Bind::Str(s) => data_query.bind(s.as_str()),
            Bind::Bool(v) => data_query.bind(*v),
        };
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let rows = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch teachers");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(TeacherListResponse {
        data: rows.into_iter().map(Teacher::from).collect(),
        page,
        per_page,
        total,
    }))
}

/// Update Teacher
#[utoipa::path(
    put,
    path = "/api/v1/teacher/{teacher_id}",
    params(
        ("teacher_id", Path, description = "Teacher ID")
    ),
    request_body = UpdateTeacher,
    responses(
        (status = 200, description = "Teacher updated", body = Object, example = json!({
            "message": "Teacher updated"
        })),
        (status = 400, description = "Unknown or malformed field"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Teacher not found", body = Object, example = json!({
            "message": "Teacher not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Teacher",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_teacher(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let teacher_id = path.into_inner();

    let update = build_update_sql("teachers", &body, UPDATABLE, "id", teacher_id)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, teacher_id, "Failed to update teacher");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Teacher not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Teacher updated"
    })))
}

/// Deactivate Teacher. Profiles are never hard-deleted so their request
/// and audit history stays intact.
#[utoipa::path(
    delete,
    path = "/api/v1/teacher/{teacher_id}",
    params(
        ("teacher_id", Path, description = "Teacher ID")
    ),
    responses(
        (status = 200, description = "Teacher deactivated", body = Object, example = json!({
            "message": "Teacher deactivated"
        })),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Teacher not found", body = Object, example = json!({
            "message": "Teacher not found"
        })),
        (status = 500, description = "Internal server error", body = Object)
    ),
    tag = "Teacher",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn deactivate_teacher(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let teacher_id = path.into_inner();

    let result = sqlx::query(r#"UPDATE teachers SET is_active = FALSE WHERE id = ?"#)
        .bind(teacher_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, teacher_id, "Failed to deactivate teacher");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Teacher not found"
        })));
    }

    info!(teacher_id, performed_by = auth.user_id, "Teacher deactivated");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Teacher deactivated"
    })))
}

/// Get Teacher by ID
#[utoipa::path(
    get,
    path = "/api/v1/teacher/{teacher_id}",
    params(
        ("teacher_id", Path, description = "Teacher ID")
    ),
    responses(
        (status = 200, description = "Teacher found", body = Teacher),
        (status = 403, description = "Another teacher's profile"),
        (status = 404, description = "Teacher not found", body = Object, example = json!({
            "message": "Teacher not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Teacher",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_teacher(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let teacher_id: u64 = path.into_inner();
    auth.require_self_or_manager(teacher_id)?;

    let sql = format!("SELECT {TEACHER_COLUMNS} FROM teachers WHERE id = ?");
    let teacher = sqlx::query_as::<_, TeacherRow>(&sql)
        .bind(teacher_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, teacher_id, "Failed to fetch teacher");
            ErrorInternalServerError("Internal Server Error")
        })?;

    match teacher {
        Some(row) => Ok(HttpResponse::Ok().json(Teacher::from(row))),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Teacher not found"
        }))),
    }
}
