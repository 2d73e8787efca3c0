use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::auth::AuthUser;
use crate::leave::error::{LeaveError, ValidationError};
use crate::model::audit::{AuditAction, AuditDetails, AuditEntry};
use crate::model::leave_request::{LeaveRequest, RequestStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Approve,
    Reject { reason: String },
}

impl Decision {
    fn action(&self) -> AuditAction {
        match self {
            Decision::Approve => AuditAction::Approve,
            Decision::Reject { .. } => AuditAction::Reject,
        }
    }

    fn target_status(&self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Reject { .. } => RequestStatus::Rejected,
        }
    }
}

/// The updated request and the audit entry describing the change.
/// Both must be committed together.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub request: LeaveRequest,
    pub audit: AuditEntry,
}

/// Refuses any transition out of a terminal state.
pub fn ensure_pending(request: &LeaveRequest) -> Result<(), LeaveError> {
    if request.status.is_terminal() {
        return Err(LeaveError::State {
            request_id: request.id,
            status: request.status,
        });
    }
    Ok(())
}

pub fn ensure_can_decide(actor: &AuthUser) -> Result<(), LeaveError> {
    if actor.role.can_decide() {
        Ok(())
    } else {
        Err(LeaveError::Authorization {
            role: actor.role,
            action: "approve or reject requests",
        })
    }
}

/// Applies `decision` to a pending request.
pub fn decide(
    request: &LeaveRequest,
    teacher_name: &str,
    decision: Decision,
    actor: &AuthUser,
    at: DateTime<Utc>,
) -> Result<Transition, LeaveError> {
    ensure_can_decide(actor)?;
    ensure_pending(request)?;

    let previous_status = request.status;
    let new_status = decision.target_status();
    let action_type = decision.action();
    let reason = match decision {
        Decision::Approve => None,
        Decision::Reject { reason } => {
            let reason = reason.trim();
            if reason.is_empty() {
                return Err(ValidationError::BlankReason.into());
            }
            Some(reason.to_string())
        }
    };

    let mut updated = request.clone();
    updated.status = new_status;
    updated.approved_by = Some(actor.user_id);
    updated.approved_date = Some(at);
    updated.rejection_reason = reason.clone();
    updated.updated_at = at;

    let audit = AuditEntry {
        id: Uuid::new_v4().to_string(),
        request_id: request.id,
        action_type,
        teacher_id: request.teacher_id,
        teacher_name: teacher_name.to_string(),
        performed_by: actor.user_id,
        performer_role: actor.role,
        timestamp: at,
        details: AuditDetails {
            previous_status,
            new_status,
            reason,
        },
    };

    Ok(Transition {
        request: updated,
        audit,
    })
}
