use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Canonical candidate shape offered to the classifier. The taxonomy store
/// translates whatever it holds into this at the boundary; nothing downstream
/// depends on the store's own node representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaxonCandidate {
    pub id: i64,
    pub name: String,
    pub path: String,
}

impl TaxonCandidate {
    pub fn new(id: i64, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            path: path.into(),
        }
    }
}

/// One ranked suggestion. Confidence is clamped at construction; raw values
/// from the external service are never stored as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestionCandidate {
    pub taxon_id: i64,
    pub path: String,
    pub confidence: f64,
}

impl SuggestionCandidate {
    pub fn new(taxon_id: i64, path: impl Into<String>, confidence: f64) -> Self {
        Self {
            taxon_id,
            path: path.into(),
            confidence: clamp_confidence(confidence),
        }
    }
}

pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuggestFailureKind {
    Timeout,
    ProviderError,
}

impl SuggestFailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ProviderError => "provider_error",
        }
    }
}

impl fmt::Display for SuggestFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a suggestion targeted. Only `Category` is produced by the pipeline
/// today; the other kinds exist so the audit table can absorb future
/// suggestion flows without a schema change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuggestTarget {
    Category,
    ProductName,
    Brand,
    Advice,
}

impl SuggestTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::ProductName => "product_name",
            Self::Brand => "brand",
            Self::Advice => "advice",
        }
    }
}

impl fmt::Display for SuggestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuggestTarget {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "category" => Ok(Self::Category),
            "product_name" => Ok(Self::ProductName),
            "brand" => Ok(Self::Brand),
            "advice" => Ok(Self::Advice),
            other => Err(format!("unknown suggestion target: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Using,
    Finished,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Using => "using",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "using" => Ok(Self::Using),
            "finished" => Ok(Self::Finished),
            other => Err(format!("unknown item status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationKind {
    D30,
    D14,
    D7,
    Overweek,
}

impl NotificationKind {
    pub const THRESHOLDS: [NotificationKind; 3] = [Self::D30, Self::D14, Self::D7];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::D30 => "D30",
            Self::D14 => "D14",
            Self::D7 => "D7",
            Self::Overweek => "OVERWEEK",
        }
    }

    /// Days-before-expiry window for threshold kinds; `None` for `Overweek`.
    pub fn threshold_days(self) -> Option<i64> {
        match self {
            Self::D30 => Some(30),
            Self::D14 => Some(14),
            Self::D7 => Some(7),
            Self::Overweek => None,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_uppercase().as_str() {
            "D30" => Ok(Self::D30),
            "D14" => Ok(Self::D14),
            "D7" => Ok(Self::D7),
            "OVERWEEK" => Ok(Self::Overweek),
            other => Err(format!("unknown notification kind: {other}")),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusTransitionError {
    #[error("finished items require a finish date")]
    FinishDateRequired,
    #[error("finish date {finished_at} must be the transition day {today}")]
    FinishDateNotToday {
        finished_at: NaiveDate,
        today: NaiveDate,
    },
    #[error("items in use cannot carry a finish date")]
    FinishDateOnUsingItem,
}

/// Status/finish-date pairing rules. `using -> finished` is one-way and the
/// finish date must equal the day the transition happens.
pub fn validate_item_status(
    status: ItemStatus,
    finished_at: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(), StatusTransitionError> {
    match (status, finished_at) {
        (ItemStatus::Finished, None) => Err(StatusTransitionError::FinishDateRequired),
        (ItemStatus::Finished, Some(finished_at)) if finished_at != today => {
            Err(StatusTransitionError::FinishDateNotToday { finished_at, today })
        }
        (ItemStatus::Using, Some(_)) => Err(StatusTransitionError::FinishDateOnUsingItem),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn confidence_is_clamped_into_unit_interval() {
        assert_eq!(SuggestionCandidate::new(1, "p", 1.7).confidence, 1.0);
        assert_eq!(SuggestionCandidate::new(1, "p", -0.3).confidence, 0.0);
        assert_eq!(SuggestionCandidate::new(1, "p", f64::NAN).confidence, 0.0);
        assert_eq!(SuggestionCandidate::new(1, "p", 0.42).confidence, 0.42);
    }

    #[test]
    fn notification_kind_round_trips_through_strings() {
        for kind in [
            NotificationKind::D30,
            NotificationKind::D14,
            NotificationKind::D7,
            NotificationKind::Overweek,
        ] {
            assert_eq!(kind.as_str().parse::<NotificationKind>(), Ok(kind));
        }
        assert!("D99".parse::<NotificationKind>().is_err());
    }

    #[test]
    fn finished_status_requires_todays_date() {
        let today = day(2026, 8, 23);
        assert_eq!(
            validate_item_status(ItemStatus::Finished, None, today),
            Err(StatusTransitionError::FinishDateRequired)
        );
        assert_eq!(
            validate_item_status(ItemStatus::Finished, Some(day(2026, 8, 22)), today),
            Err(StatusTransitionError::FinishDateNotToday {
                finished_at: day(2026, 8, 22),
                today,
            })
        );
        assert_eq!(
            validate_item_status(ItemStatus::Finished, Some(today), today),
            Ok(())
        );
        assert_eq!(
            validate_item_status(ItemStatus::Using, Some(today), today),
            Err(StatusTransitionError::FinishDateOnUsingItem)
        );
        assert_eq!(validate_item_status(ItemStatus::Using, None, today), Ok(()));
    }
}
