use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "teacher_code": "T-001",
        "full_name": "Amina Rahman",
        "email": "amina.rahman@school.edu",
        "department": "Science",
        "work_type": "full_time",
        "employment_date": "2024-01-15",
        "is_active": true
    })
)]
pub struct Teacher {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "T-001")]
    pub teacher_code: String,

    #[schema(example = "Amina Rahman")]
    pub full_name: String,

    #[schema(example = "amina.rahman@school.edu")]
    pub email: String,

    #[schema(example = "Science")]
    pub department: String,

    #[schema(example = "full_time")]
    pub work_type: String,

    /// Missing dates are treated as zero tenure.
    #[schema(example = "2024-01-15", value_type = Option<String>, format = "date", nullable = true)]
    pub employment_date: Option<NaiveDate>,

    #[schema(example = true)]
    pub is_active: bool,
}
