use chrono::{DateTime, Datelike, NaiveDate};
use serde::Serialize;
use strum::{AsRefStr, Display};
use utoipa::ToSchema;

/// Tenure needed before any authorized absence can be filed.
pub const MIN_ELIGIBLE_MONTHS: u32 = 3;
/// Tenure at which the senior quota applies.
pub const SENIOR_MONTHS: u32 = 24;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, ToSchema, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuotaTier {
    Ineligible,
    Standard,
    Senior,
}

impl QuotaTier {
    pub fn for_tenure(months: u32) -> Self {
        if months < MIN_ELIGIBLE_MONTHS {
            QuotaTier::Ineligible
        } else if months < SENIOR_MONTHS {
            QuotaTier::Standard
        } else {
            QuotaTier::Senior
        }
    }

    /// Authorized absence days allowed per calendar month.
    pub fn day_quota(self) -> u32 {
        match self {
            QuotaTier::Ineligible => 0,
            QuotaTier::Standard => 9,
            QuotaTier::Senior => 12,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Eligibility {
    pub tenure_months: u32,
    pub tier: QuotaTier,
    pub day_quota: u32,
}

impl Eligibility {
    pub fn evaluate(employment_date: Option<NaiveDate>, today: NaiveDate) -> Self {
        let tenure_months = tenure_months(employment_date, today);
        let tier = QuotaTier::for_tenure(tenure_months);
        Self {
            tenure_months,
            tier,
            day_quota: tier.day_quota(),
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.tier != QuotaTier::Ineligible
    }
}

/// Whole months since `employment_date`; a partial month does not count.
///
/// A missing date yields zero so the teacher lands in the ineligible tier.
pub fn tenure_months(employment_date: Option<NaiveDate>, today: NaiveDate) -> u32 {
    let Some(hired) = employment_date else {
        tracing::warn!("employment date missing, treating tenure as 0 months");
        return 0;
    };

    let mut months = (today.year() - hired.year()) * 12 + today.month() as i32
        - hired.month() as i32;
    if today.day() < hired.day() {
        months -= 1;
    }
    months.max(0) as u32
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp; anything else is `None`.
pub fn parse_employment_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn partial_months_round_down() {
        let today = date(2026, 10, 18);
        assert_eq!(tenure_months(Some(date(2026, 7, 18)), today), 3);
        assert_eq!(tenure_months(Some(date(2026, 7, 19)), today), 2);
        assert_eq!(tenure_months(Some(date(2024, 10, 18)), today), 24);
        assert_eq!(tenure_months(Some(date(2024, 10, 19)), today), 23);
        assert_eq!(tenure_months(Some(date(2026, 10, 1)), today), 0);
    }

    #[test]
    fn future_or_missing_dates_give_zero() {
        let today = date(2026, 10, 18);
        assert_eq!(tenure_months(None, today), 0);
        assert_eq!(tenure_months(Some(date(2027, 1, 1)), today), 0);
    }

    #[test]
    fn tiers_follow_tenure_brackets() {
        assert_eq!(QuotaTier::for_tenure(0), QuotaTier::Ineligible);
        assert_eq!(QuotaTier::for_tenure(2), QuotaTier::Ineligible);
        assert_eq!(QuotaTier::for_tenure(3), QuotaTier::Standard);
        assert_eq!(QuotaTier::for_tenure(23), QuotaTier::Standard);
        assert_eq!(QuotaTier::for_tenure(24), QuotaTier::Senior);
        assert_eq!(QuotaTier::for_tenure(400), QuotaTier::Senior);

        for months in 0..60 {
            let quota = QuotaTier::for_tenure(months).day_quota();
            assert!(quota == 0 || quota == 9 || quota == 12);
        }
    }

    #[test]
    fn forty_days_in_is_not_eligible() {
        let today = date(2026, 10, 18);
        let hired = today - chrono::Duration::days(40);
        let eligibility = Eligibility::evaluate(Some(hired), today);
        assert!(!eligibility.is_eligible());
        assert_eq!(eligibility.day_quota, 0);
    }

    #[test]
    fn employment_date_parsing_is_lenient_about_format_only() {
        assert_eq!(parse_employment_date("2024-01-15"), Some(date(2024, 1, 15)));
        assert_eq!(
            parse_employment_date("2024-01-15T08:00:00Z"),
            Some(date(2024, 1, 15))
        );
        assert_eq!(parse_employment_date("15/01/2024"), None);
        assert_eq!(parse_employment_date(""), None);
    }
}
