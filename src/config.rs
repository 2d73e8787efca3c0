use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use dotenvy::dotenv;

use crate::leave::hour_budget::HourPolicy;

/// Lock handles idle for less than this could expire between two approvals.
const MIN_LOCK_IDLE_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_decision_per_min: u32,

    // Leave policy
    pub hour_budget_per_period: f64,
    pub hour_request_cap: f64,
    pub teacher_lock_idle_secs: u64,

    pub log_dir: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),

            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", 1000)?,
            rate_decision_per_min: parsed("RATE_DECISION_PER_MIN", 120)?,

            hour_budget_per_period: parsed("HOUR_BUDGET_PER_PERIOD", 4.0)?,
            hour_request_cap: parsed("HOUR_REQUEST_CAP", 2.0)?,
            teacher_lock_idle_secs: at_least(
                "TEACHER_LOCK_IDLE_SECS",
                parsed("TEACHER_LOCK_IDLE_SECS", 3600)?,
                MIN_LOCK_IDLE_SECS,
            )?,

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "debug".to_string()),
        })
    }

    pub fn hour_policy(&self) -> HourPolicy {
        HourPolicy {
            period_budget: self.hour_budget_per_period,
            per_request_cap: self.hour_request_cap,
        }
    }

    pub fn teacher_lock_idle(&self) -> Duration {
        Duration::from_secs(self.teacher_lock_idle_secs)
    }

    #[cfg(test)]
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: "mysql://localhost/test".into(),
            jwt_secret: jwt_secret.into(),
            server_addr: "127.0.0.1:0".into(),
            api_prefix: "/api/v1".into(),
            rate_protected_per_min: 1000,
            rate_decision_per_min: 120,
            hour_budget_per_period: 4.0,
            hour_request_cap: 2.0,
            teacher_lock_idle_secs: 3600,
            log_dir: "logs".into(),
            log_level: "debug".into(),
        }
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn at_least(key: &str, value: u64, min: u64) -> Result<u64> {
    ensure!(value >= min, "{key} must be at least {min} (got {value})");
    Ok(value)
}
