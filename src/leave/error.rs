use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::{Value, json};

use crate::leave::date_rules::DateRuleViolation;
use crate::leave::eligibility::MIN_ELIGIBLE_MONTHS;
use crate::leave::hour_budget::HourBudgetViolation;
use crate::leave::quota::QuotaViolation;
use crate::leave::store::StoreError;
use crate::model::leave_request::{RequestStatus, RequestType};
use crate::model::role::Role;

/// Missing or malformed input.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum ValidationError {
    #[display(fmt = "reason is required")]
    BlankReason,
    #[display(fmt = "hours are required for {} requests", _0)]
    MissingHours(RequestType),
    #[display(fmt = "{}", _0)]
    MalformedHours(crate::leave::hour_budget::MalformedHours),
    #[display(
        fmt = "days must be between 1 and {} (got {})",
        crate::leave::quota::MAX_REQUEST_DAYS,
        _0
    )]
    InvalidDays(u32),
    #[display(fmt = "{} cannot be filed as a request", _0)]
    NotSubmittable(RequestType),
}

impl ValidationError {
    fn details(&self) -> Value {
        match self {
            ValidationError::BlankReason => json!({ "field": "reason" }),
            ValidationError::MissingHours(request_type) => {
                json!({ "field": "hours", "request_type": request_type })
            }
            ValidationError::MalformedHours(hours) => json!({ "field": "hours", "value": hours.0 }),
            ValidationError::InvalidDays(days) => json!({
                "field": "days",
                "value": days,
                "max": crate::leave::quota::MAX_REQUEST_DAYS,
            }),
            ValidationError::NotSubmittable(request_type) => {
                json!({ "field": "request_type", "value": request_type })
            }
        }
    }
}

/// Every failure the leave engine reports to callers.
#[derive(Debug, Display)]
pub enum LeaveError {
    #[display(fmt = "{}", _0)]
    Validation(ValidationError),
    #[display(fmt = "{}", _0)]
    DateRule(DateRuleViolation),
    #[display(
        fmt = "not eligible for authorized absence until {} months of tenure (current: {})",
        required_months,
        tenure_months
    )]
    Eligibility {
        tenure_months: u32,
        required_months: u32,
    },
    #[display(fmt = "{}", _0)]
    QuotaExceeded(QuotaViolation),
    #[display(fmt = "{}", _0)]
    HourBudgetExceeded(HourBudgetViolation),
    #[display(fmt = "request {} already finalized as {}", request_id, status)]
    State {
        request_id: u64,
        status: RequestStatus,
    },
    #[display(fmt = "{} role may not {}", role, action)]
    Authorization { role: Role, action: &'static str },
    #[display(fmt = "{} {} not found", entity, id)]
    NotFound { entity: &'static str, id: u64 },
    #[display(fmt = "store failure: {}", _0)]
    Store(StoreError),
}

impl std::error::Error for LeaveError {}

impl LeaveError {
    pub fn ineligible(tenure_months: u32) -> Self {
        LeaveError::Eligibility {
            tenure_months,
            required_months: MIN_ELIGIBLE_MONTHS,
        }
    }

    /// Stable key clients localize against.
    pub fn code(&self) -> &'static str {
        match self {
            LeaveError::Validation(_) => "validation_error",
            LeaveError::DateRule(_) => "date_rule_error",
            LeaveError::Eligibility { .. } => "eligibility_error",
            LeaveError::QuotaExceeded(_) => "quota_exceeded",
            LeaveError::HourBudgetExceeded(_) => "hour_budget_exceeded",
            LeaveError::State { .. } => "state_error",
            LeaveError::Authorization { .. } => "authorization_error",
            LeaveError::NotFound { .. } => "not_found",
            LeaveError::Store(_) => "internal_error",
        }
    }

    pub fn details(&self) -> Value {
        match self {
            LeaveError::Validation(err) => err.details(),
            LeaveError::DateRule(violation) => json!(violation),
            LeaveError::Eligibility {
                tenure_months,
                required_months,
            } => json!({ "tenure_months": tenure_months, "required_months": required_months }),
            LeaveError::QuotaExceeded(violation) => json!(violation),
            LeaveError::HourBudgetExceeded(violation) => json!(violation),
            LeaveError::State { request_id, status } => {
                json!({ "request_id": request_id, "status": status })
            }
            LeaveError::Authorization { role, action } => json!({ "role": role, "action": action }),
            LeaveError::NotFound { entity, id } => json!({ "entity": entity, "id": id }),
            LeaveError::Store(_) => Value::Null,
        }
    }
}

impl From<ValidationError> for LeaveError {
    fn from(err: ValidationError) -> Self {
        LeaveError::Validation(err)
    }
}

impl From<DateRuleViolation> for LeaveError {
    fn from(violation: DateRuleViolation) -> Self {
        LeaveError::DateRule(violation)
    }
}

impl From<QuotaViolation> for LeaveError {
    fn from(violation: QuotaViolation) -> Self {
        LeaveError::QuotaExceeded(violation)
    }
}

impl From<HourBudgetViolation> for LeaveError {
    fn from(violation: HourBudgetViolation) -> Self {
        LeaveError::HourBudgetExceeded(violation)
    }
}

impl From<StoreError> for LeaveError {
    fn from(err: StoreError) -> Self {
        LeaveError::Store(err)
    }
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::Validation(_)
            | LeaveError::DateRule(_)
            | LeaveError::Eligibility { .. }
            | LeaveError::QuotaExceeded(_)
            | LeaveError::HourBudgetExceeded(_) => StatusCode::BAD_REQUEST,
            LeaveError::State { .. } => StatusCode::CONFLICT,
            LeaveError::Authorization { .. } => StatusCode::FORBIDDEN,
            LeaveError::NotFound { .. } => StatusCode::NOT_FOUND,
            LeaveError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            LeaveError::Store(err) => {
                tracing::error!(error = %err, "leave store failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.code(),
            "message": message,
            "details": self.details(),
        }))
    }
}
