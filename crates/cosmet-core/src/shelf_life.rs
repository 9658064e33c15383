use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShelfLifeAnchor {
    SameDay,
    EndOfMonth,
}

impl ShelfLifeAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SameDay => "same_day",
            Self::EndOfMonth => "end_of_month",
        }
    }
}

impl fmt::Display for ShelfLifeAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShelfLifeAnchor {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "same_day" => Ok(Self::SameDay),
            "end_of_month" => Ok(Self::EndOfMonth),
            other => Err(format!("unknown shelf-life anchor: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShelfLifeRule {
    pub months: u32,
    pub anchor: ShelfLifeAnchor,
}

impl ShelfLifeRule {
    pub fn new(months: u32, anchor: ShelfLifeAnchor) -> Self {
        Self { months, anchor }
    }

    pub fn same_day(months: u32) -> Self {
        Self::new(months, ShelfLifeAnchor::SameDay)
    }

    pub fn end_of_month(months: u32) -> Self {
        Self::new(months, ShelfLifeAnchor::EndOfMonth)
    }
}

impl Default for ShelfLifeRule {
    fn default() -> Self {
        Self::same_day(12)
    }
}

pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    // 31 downwards; the first day chrono accepts is the month length.
    (28..=31)
        .rev()
        .find(|&day| NaiveDate::from_ymd_opt(year, month, day).is_some())
        .unwrap_or(28)
}

/// Calendar-month addition with the day clamped to the target month's length
/// (Jan 31 + 1 month = Feb 28/29, never Mar 3).
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let zero_based = date.month0() + months;
    let year = date.year() + (zero_based / 12) as i32;
    let month = zero_based % 12 + 1;
    let day = date.day().min(last_day_of_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let day = last_day_of_month(date.year(), date.month());
    NaiveDate::from_ymd_opt(date.year(), date.month(), day).unwrap_or(date)
}

/// Expiry date for an item opened on `opened_on` under `rule`.
pub fn expires_on(opened_on: NaiveDate, rule: ShelfLifeRule) -> NaiveDate {
    let candidate = add_months(opened_on, rule.months);
    match rule.anchor {
        ShelfLifeAnchor::SameDay => candidate,
        ShelfLifeAnchor::EndOfMonth => end_of_month(candidate),
    }
}

pub fn days_remaining(expires_on: NaiveDate, today: NaiveDate) -> i64 {
    (expires_on - today).num_days()
}

/// Qualitative expiry tier. The day-offset ranges partition the timeline:
/// [-inf,-1] expired, [0,7] critical, [8,14] warning, [15,30] caution,
/// [31,inf] safe. An item is in exactly one tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Expired,
    Critical,
    Warning,
    Caution,
    Safe,
}

impl RiskTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Caution => "caution",
            Self::Safe => "safe",
        }
    }

    /// Bucket key used by the expiry-stats summary.
    pub fn bucket_key(self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::Critical => "week",
            Self::Warning => "biweek",
            Self::Caution => "month",
            Self::Safe => "safe",
        }
    }

    /// Coarse low/mid/high flag stored on the item record.
    pub fn risk_flag(self) -> &'static str {
        match self {
            Self::Expired => "high",
            Self::Critical | Self::Warning => "mid",
            Self::Caution | Self::Safe => "low",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn risk_tier(days_remaining: i64) -> RiskTier {
    match days_remaining {
        d if d < 0 => RiskTier::Expired,
        0..=7 => RiskTier::Critical,
        8..=14 => RiskTier::Warning,
        15..=30 => RiskTier::Caution,
        _ => RiskTier::Safe,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn month_addition_clamps_to_month_length() {
        assert_eq!(add_months(day(2026, 1, 31), 1), day(2026, 2, 28));
        assert_eq!(add_months(day(2024, 1, 31), 1), day(2024, 2, 29));
        assert_eq!(add_months(day(2026, 3, 31), 1), day(2026, 4, 30));
        assert_eq!(add_months(day(2026, 5, 15), 3), day(2026, 8, 15));
    }

    #[test]
    fn month_addition_rolls_over_years() {
        assert_eq!(add_months(day(2026, 11, 30), 3), day(2027, 2, 28));
        assert_eq!(add_months(day(2026, 8, 23), 24), day(2028, 8, 23));
        assert_eq!(add_months(day(2026, 12, 31), 12), day(2027, 12, 31));
    }

    #[test]
    fn end_of_month_anchor_snaps_forward() {
        let rule = ShelfLifeRule::end_of_month(6);
        assert_eq!(expires_on(day(2026, 2, 10), rule), day(2026, 8, 31));

        let same_day = ShelfLifeRule::same_day(1);
        assert_eq!(expires_on(day(2026, 1, 31), same_day), day(2026, 2, 28));
    }

    #[test]
    fn risk_tiers_partition_day_offsets() {
        assert_eq!(risk_tier(-1), RiskTier::Expired);
        assert_eq!(risk_tier(0), RiskTier::Critical);
        assert_eq!(risk_tier(7), RiskTier::Critical);
        assert_eq!(risk_tier(8), RiskTier::Warning);
        assert_eq!(risk_tier(14), RiskTier::Warning);
        assert_eq!(risk_tier(15), RiskTier::Caution);
        assert_eq!(risk_tier(30), RiskTier::Caution);
        assert_eq!(risk_tier(31), RiskTier::Safe);
    }

    #[test]
    fn risk_flag_coarsens_tiers() {
        assert_eq!(risk_tier(-3).risk_flag(), "high");
        assert_eq!(risk_tier(5).risk_flag(), "mid");
        assert_eq!(risk_tier(14).risk_flag(), "mid");
        assert_eq!(risk_tier(15).risk_flag(), "low");
        assert_eq!(risk_tier(200).risk_flag(), "low");
    }
}
