use crate::SchedulerError;
use chrono::{DateTime, NaiveDate, Utc};
use cosmet_core::contracts::{validate_item_status, ItemStatus};
use cosmet_core::shelf_life::{days_remaining, expires_on, risk_tier};
use cosmet_storage::{InventoryStore, ItemRecord};
use cosmet_taxonomy::{TaxonomyError, TaxonomyStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryResolution {
    pub expires_on: NaiveDate,
    pub overridden: bool,
}

/// Computes an item's expiry from its leaf category's shelf-life rule, unless
/// the user typed a date by hand. A manual date wins and flags the item as
/// overridden; editing the category or opened date without a new manual date
/// drops the override and recomputation resumes.
pub fn resolve_expiry(
    taxonomy: &TaxonomyStore,
    taxon_id: i64,
    opened_on: NaiveDate,
    manual_expiry: Option<NaiveDate>,
) -> Result<ExpiryResolution, SchedulerError> {
    let node = taxonomy
        .get(taxon_id)
        .ok_or(TaxonomyError::UnknownTaxon(taxon_id))?;
    if !taxonomy.is_leaf(taxon_id)? {
        return Err(SchedulerError::NotALeaf(taxon_id));
    }

    if let Some(expires) = manual_expiry {
        return Ok(ExpiryResolution {
            expires_on: expires,
            overridden: true,
        });
    }

    Ok(ExpiryResolution {
        expires_on: expires_on(opened_on, node.shelf_life),
        overridden: false,
    })
}

/// One-way `using -> finished` transition. The finish date must be the day
/// the transition happens; the caller supplies it so the rule is enforced
/// even when the date came from a form.
pub fn finish_item(
    store: &InventoryStore,
    item_id: i64,
    finished_at: NaiveDate,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<ItemRecord, SchedulerError> {
    let mut item = store.require_item(item_id)?;
    if item.status == ItemStatus::Finished {
        return Err(SchedulerError::AlreadyFinished(item_id));
    }
    validate_item_status(ItemStatus::Finished, Some(finished_at), today)?;

    item.status = ItemStatus::Finished;
    item.finished_at = Some(finished_at);
    item.updated_at = now;
    store.upsert_item(&item)?;
    Ok(item)
}

/// Recomputes the stored risk flag for every item still in use. Returns how
/// many rows changed.
pub fn refresh_risk_flags(
    store: &InventoryStore,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<usize, SchedulerError> {
    let mut changed = 0;
    for mut item in store.using_items()? {
        let flag = risk_tier(days_remaining(item.expires_on, today)).risk_flag();
        if item.risk_flag.as_deref() == Some(flag) {
            continue;
        }
        item.risk_flag = Some(flag.to_string());
        item.updated_at = now;
        store.upsert_item(&item)?;
        changed += 1;
    }
    Ok(changed)
}
