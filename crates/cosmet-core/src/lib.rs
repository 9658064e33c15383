pub mod contracts;
pub mod shelf_life;

pub use contracts::{
    ItemStatus, NotificationKind, StatusTransitionError, SuggestFailureKind, SuggestTarget,
    SuggestionCandidate, TaxonCandidate,
};
pub use shelf_life::{
    add_months, days_remaining, end_of_month, expires_on, risk_tier, RiskTier, ShelfLifeAnchor,
    ShelfLifeRule,
};
