use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::leave::error::LeaveError;
use crate::model::audit::{AuditAction, AuditEntry};
use crate::model::role::Role;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, IntoParams, ToSchema)]
pub struct AuditFilter {
    /// Only entries of this action
    pub action_type: Option<AuditAction>,
    /// Only entries performed by this user id
    pub performed_by: Option<u64>,
    /// Inclusive lower bound (local date)
    #[schema(value_type = Option<String>, format = "date")]
    #[param(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound (local date)
    #[schema(value_type = Option<String>, format = "date")]
    #[param(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
}

impl AuditFilter {
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        let day = entry.timestamp.with_timezone(&Local).date_naive();
        self.action_type.is_none_or(|a| a == entry.action_type)
            && self.performed_by.is_none_or(|p| p == entry.performed_by)
            && self.start_date.is_none_or(|start| day >= start)
            && self.end_date.is_none_or(|end| day <= end)
    }

    /// UTC dates bracketing every entry [`matches`](Self::matches) can accept
    /// under any local offset: lower bound inclusive, upper bound exclusive.
    pub fn utc_bounds(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        (
            self.start_date.and_then(|d| d.checked_sub_days(Days::new(1))),
            self.end_date.and_then(|d| d.checked_add_days(Days::new(2))),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "total_actions": 3,
    "by_action_type": { "approve": 2, "reject": 1 },
    "distinct_performers": [7, 9]
}))]
pub struct AuditSummary {
    pub total_actions: usize,
    pub by_action_type: BTreeMap<AuditAction, usize>,
    pub distinct_performers: BTreeSet<u64>,
}

impl AuditSummary {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a AuditEntry>) -> Self {
        entries
            .into_iter()
            .fold(AuditSummary::default(), |mut summary, entry| {
                summary.total_actions += 1;
                *summary.by_action_type.entry(entry.action_type).or_default() += 1;
                summary.distinct_performers.insert(entry.performed_by);
                summary
            })
    }
}

/// The audit trail is readable by administrators only.
pub fn ensure_admin(actor: &AuthUser) -> Result<(), LeaveError> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Manager | Role::Teacher => Err(LeaveError::Authorization {
            role: actor.role,
            action: "read the audit trail",
        }),
    }
}
