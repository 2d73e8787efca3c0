use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use utoipa::ToSchema;

use crate::model::leave_request::RequestStatus;
use crate::model::role::Role;

#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    AsRefStr,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuditDetails {
    pub previous_status: RequestStatus,
    pub new_status: RequestStatus,
    /// Present for rejections.
    pub reason: Option<String>,
}

/// Immutable record of a manager decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "5f0c7d1e-8f43-4c9a-9a55-0b6a1f6f2a11",
    "request_id": 42,
    "action_type": "approve",
    "teacher_id": 1000,
    "teacher_name": "Amina Rahman",
    "performed_by": 7,
    "performer_role": "manager",
    "timestamp": "2026-10-18T09:30:00Z",
    "details": {
        "previous_status": "pending",
        "new_status": "approved",
        "reason": null
    }
}))]
pub struct AuditEntry {
    pub id: String,
    pub request_id: u64,
    pub action_type: AuditAction,
    pub teacher_id: u64,
    pub teacher_name: String,
    pub performed_by: u64,
    pub performer_role: Role,
    #[schema(value_type = String, format = "date-time")]
    pub timestamp: DateTime<Utc>,
    pub details: AuditDetails,
}
