//! Leave requests: submission rules, monthly allowances, approval and audit.

pub mod audit_trail;
pub mod date_rules;
pub mod eligibility;
pub mod error;
pub mod hour_budget;
pub mod lifecycle;
pub mod period;
pub mod quota;
pub mod service;
pub mod store;

pub type AppLeaveService = service::LeaveService<store::mysql::MySqlLeaveStore>;
